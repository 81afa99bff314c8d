use cityweather_core::{ErrorNotice, IconSlot, ScreenState, WeatherView};
use serde::Serialize;

/// Text for the current screen state.
pub fn render(state: &ScreenState) -> String {
    match state {
        ScreenState::Idle => String::new(),
        ScreenState::Loading { .. } => "Loading…".to_string(),
        ScreenState::Loaded { view, icon, .. } => render_panel(view, icon),
        ScreenState::Failed { notice, .. } => format!("! {}", notice.message),
    }
}

fn render_panel(view: &WeatherView, icon: &IconSlot) -> String {
    let mut out = String::new();

    match (&view.location, view.observed_at) {
        (Some(location), Some(at)) => {
            out.push_str(&format!("{location} (as of {} UTC)\n", at.format("%H:%M")));
        }
        (Some(location), None) => out.push_str(&format!("{location}\n")),
        (None, Some(at)) => out.push_str(&format!("As of {} UTC\n", at.format("%H:%M"))),
        (None, None) => {}
    }

    out.push_str(&format!("  Temperature  {}\n", view.temperature));
    out.push_str(&format!("  Humidity     {}\n", view.humidity));
    out.push_str(&format!("  Wind         {}\n", view.wind_speed));

    let icon_note = match icon {
        IconSlot::Ready(bytes) => format!(" ({} bytes)", bytes.len()),
        IconSlot::Pending | IconSlot::Blank => String::new(),
    };
    out.push_str(&format!("  Icon         {}{icon_note}", view.icon_url));

    out
}

/// Machine-readable form of a finished submission, for `show --json`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Report<'a> {
    Idle,
    Loading,
    Loaded { weather: &'a WeatherView },
    Failed { error: &'a ErrorNotice },
}

impl<'a> From<&'a ScreenState> for Report<'a> {
    fn from(state: &'a ScreenState) -> Self {
        match state {
            ScreenState::Idle => Report::Idle,
            ScreenState::Loading { .. } => Report::Loading,
            ScreenState::Loaded { view, .. } => Report::Loaded { weather: view },
            ScreenState::Failed { notice, .. } => Report::Failed { error: notice },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cityweather_core::{FailureKind, WeatherResult};

    fn loaded(location: Option<&str>) -> ScreenState {
        let result = WeatherResult {
            temperature_c: 21.5,
            humidity_pct: 60,
            wind_speed: 3.2,
            icon: "01d".into(),
            location: location.map(str::to_string),
            observed_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 14, 5, 0).unwrap()),
        };
        ScreenState::Loaded { seq: 1, view: WeatherView::from(&result), icon: IconSlot::Blank }
    }

    #[test]
    fn loaded_panel_lists_every_field() {
        let text = render(&loaded(Some("Riyadh")));

        assert!(text.starts_with("Riyadh (as of 14:05 UTC)\n"));
        assert!(text.contains("Temperature  21.5°"));
        assert!(text.contains("Humidity     60 %"));
        assert!(text.contains("Wind         3.2"));
        assert!(text.contains("Icon         https://openweathermap.org/img/wn/01d@4x.png"));
    }

    #[test]
    fn header_without_location() {
        let text = render(&loaded(None));
        assert!(text.starts_with("As of 14:05 UTC\n"));
    }

    #[test]
    fn ready_icon_reports_size() {
        let ScreenState::Loaded { seq, view, .. } = loaded(None) else {
            unreachable!()
        };
        let state = ScreenState::Loaded { seq, view, icon: IconSlot::Ready(vec![0; 12]) };
        assert!(render(&state).ends_with("(12 bytes)"));
    }

    #[test]
    fn failure_shows_only_the_message() {
        let state = ScreenState::Failed {
            seq: 1,
            notice: ErrorNotice { kind: FailureKind::Http, message: "city not found".into() },
        };
        assert_eq!(render(&state), "! city not found");
    }

    #[test]
    fn loading_and_idle() {
        assert_eq!(render(&ScreenState::Loading { seq: 3 }), "Loading…");
        assert_eq!(render(&ScreenState::Idle), "");
    }

    #[test]
    fn report_is_tagged_by_status() {
        let state = ScreenState::Failed {
            seq: 1,
            notice: ErrorNotice { kind: FailureKind::Transport, message: "offline".into() },
        };
        let json = serde_json::to_value(Report::from(&state)).expect("serialize");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "transport");
        assert_eq!(json["error"]["message"], "offline");

        let json = serde_json::to_value(Report::from(&loaded(None))).expect("serialize");
        assert_eq!(json["status"], "loaded");
        assert_eq!(json["weather"]["temperature"], "21.5°");
    }
}
