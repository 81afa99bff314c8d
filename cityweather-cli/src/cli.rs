use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use cityweather_core::{
    Config, DriverOptions, IconSlot, OpenWeatherClient, PresentationDriver, ScreenState,
};
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Password, PasswordDisplayMode, Text};
use tracing::{debug, info};

use crate::render::{Report, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for a city")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and request timeout.
    Configure,

    /// Show current weather for one city and exit.
    Show {
        /// City name, e.g. "Riyadh" or "London,GB".
        city: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Download the condition icon (PNG) to this path.
        #[arg(long, value_name = "PATH")]
        save_icon: Option<PathBuf>,

        /// Override the configured request timeout.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Prompt for cities until Esc is pressed.
    Interactive {
        /// Skip downloading condition icons.
        #[arg(long)]
        no_icons: bool,

        /// Override the configured request timeout.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json, save_icon, timeout } => {
                show(&city, json, save_icon, timeout).await
            }
            Command::Interactive { no_icons, timeout } => interactive(!no_icons, timeout).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(inquire::required!("An API key is required"))
        .prompt()
        .context("Failed to read API key")?;

    let timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.timeout_secs)
        .prompt()
        .context("Failed to read timeout")?;

    config.set_api_key(api_key.trim().to_string());
    config.timeout_secs = timeout_secs;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

/// Build a driver from the stored config, failing fast when no key is available.
fn build_driver(timeout: Option<u64>, load_icons: bool) -> Result<PresentationDriver> {
    let mut config = Config::load()?;
    if let Some(secs) = timeout {
        config.timeout_secs = secs;
    }

    let client = OpenWeatherClient::from_config(&config)?;
    let options = DriverOptions { timeout: config.timeout(), load_icons };
    debug!(?options, "driver ready");

    Ok(PresentationDriver::new(Arc::new(client), options))
}

/// Wait for the driver to settle, or cancel on Ctrl-C. `None` means cancelled.
async fn settle_or_cancel(driver: &PresentationDriver) -> Option<ScreenState> {
    tokio::select! {
        state = driver.settled() => Some(state),
        _ = tokio::signal::ctrl_c() => {
            driver.cancel();
            None
        }
    }
}

async fn show(
    city: &str,
    json: bool,
    save_icon: Option<PathBuf>,
    timeout: Option<u64>,
) -> Result<()> {
    let driver = build_driver(timeout, save_icon.is_some())?;
    driver.on_submit(city)?;

    let Some(state) = settle_or_cancel(&driver).await else {
        bail!("Cancelled");
    };

    if json {
        let report = serde_json::to_string_pretty(&Report::from(&state))
            .context("Failed to serialize result")?;
        println!("{report}");
    } else if state.results_visible() {
        println!("{}", render(&state));
    }

    match state {
        ScreenState::Loaded { icon, .. } => {
            if let Some(path) = save_icon {
                save_icon_to(&path, &icon).await?;
            }
            Ok(())
        }
        ScreenState::Failed { notice, .. } => Err(anyhow!(notice.message)),
        ScreenState::Idle | ScreenState::Loading { .. } => bail!("No weather was loaded"),
    }
}

async fn save_icon_to(path: &Path, icon: &IconSlot) -> Result<()> {
    match icon {
        IconSlot::Ready(bytes) => {
            tokio::fs::write(path, bytes)
                .await
                .with_context(|| format!("Failed to write icon to {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "icon saved");
            Ok(())
        }
        IconSlot::Pending | IconSlot::Blank => {
            bail!("The condition icon could not be downloaded")
        }
    }
}

async fn interactive(load_icons: bool, timeout: Option<u64>) -> Result<()> {
    let driver = build_driver(timeout, load_icons)?;

    while let Some(input) = prompt_city().await? {
        if let Err(err) = driver.on_submit(&input) {
            println!("{err}");
            continue;
        }

        println!("{}", render(&driver.state()));
        match settle_or_cancel(&driver).await {
            Some(state) => println!("{}\n", render(&state)),
            None => println!("Cancelled.\n"),
        }
    }

    driver.cancel();
    Ok(())
}

/// `None` when the user leaves with Esc or Ctrl-C.
async fn prompt_city() -> Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new("City:").with_help_message("Esc to quit").prompt()
    })
    .await
    .context("Prompt task failed")?;

    match answer {
        Ok(city) => Ok(Some(city)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Failed to read city"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_parses_flags() {
        let cli = Cli::try_parse_from([
            "cityweather",
            "show",
            "Riyadh",
            "--json",
            "--save-icon",
            "icon.png",
            "--timeout",
            "3",
        ])
        .expect("valid args");

        match cli.command {
            Command::Show { city, json, save_icon, timeout } => {
                assert_eq!(city, "Riyadh");
                assert!(json);
                assert_eq!(save_icon, Some(PathBuf::from("icon.png")));
                assert_eq!(timeout, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["cityweather", "interactive", "-v", "--no-icons"])
            .expect("valid args");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Interactive { no_icons: true, timeout: None }));
    }

    #[test]
    fn show_requires_a_city() {
        assert!(Cli::try_parse_from(["cityweather", "show"]).is_err());
    }

    #[tokio::test]
    async fn missing_icon_is_an_error() {
        let path = std::env::temp_dir().join("cityweather-never-written.png");
        let err = save_icon_to(&path, &IconSlot::Blank).await.unwrap_err();
        assert!(err.to_string().contains("could not be downloaded"));
        assert!(!path.exists());
    }
}
