//! Display-ready strings for the result panel and the error notification.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{FailureKind, FetchError},
    model::WeatherResult,
};

/// Text shown in the result panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
    pub icon_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl From<&WeatherResult> for WeatherView {
    fn from(result: &WeatherResult) -> Self {
        Self {
            temperature: format!("{}°", decimal(result.temperature_c)),
            humidity: format!("{} %", result.humidity_pct),
            wind_speed: decimal(result.wind_speed),
            icon_url: result.icon_url(),
            location: result.location.clone(),
            observed_at: result.observed_at,
        }
    }
}

/// Always keeps a fractional part: `20.0`, `21.5`.
fn decimal(value: f64) -> String {
    format!("{value:?}")
}

/// Transient notification for a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FetchError> for ErrorNotice {
    fn from(err: &FetchError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherResult {
        WeatherResult {
            temperature_c: 21.5,
            humidity_pct: 60,
            wind_speed: 3.2,
            icon: "01d".into(),
            location: Some("Riyadh".into()),
            observed_at: None,
        }
    }

    #[test]
    fn fields_render_like_the_result_panel() {
        let view = WeatherView::from(&sample());
        assert_eq!(view.temperature, "21.5°");
        assert_eq!(view.humidity, "60 %");
        assert_eq!(view.wind_speed, "3.2");
        assert_eq!(view.icon_url, "https://openweathermap.org/img/wn/01d@4x.png");
    }

    #[test]
    fn whole_numbers_keep_a_decimal() {
        let result = WeatherResult { temperature_c: 20.0, wind_speed: 0.0, ..sample() };
        let view = WeatherView::from(&result);
        assert_eq!(view.temperature, "20.0°");
        assert_eq!(view.wind_speed, "0.0");
    }

    #[test]
    fn negative_temperatures_render() {
        let result = WeatherResult { temperature_c: -3.4, ..sample() };
        assert_eq!(WeatherView::from(&result).temperature, "-3.4°");
    }

    #[test]
    fn view_serializes_without_missing_optionals() {
        let result = WeatherResult { location: None, ..sample() };
        let json = serde_json::to_value(WeatherView::from(&result)).expect("serialize");
        assert!(json.get("location").is_none());
        assert_eq!(json["humidity"], "60 %");
    }

    #[test]
    fn notice_carries_http_message() {
        let err = FetchError::Http { status: 404, message: "city not found".into() };
        let notice = ErrorNotice::from(&err);
        assert_eq!(notice.kind, FailureKind::Http);
        assert_eq!(notice.message, "city not found");
    }
}
