//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` seam
//! - Shared domain models and display strings
//! - The presentation driver that turns submissions into screen states
//!
//! It is used by `cityweather-cli`, but can also back other front ends.

pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod provider;
pub mod view;

pub use config::Config;
pub use driver::{DriverOptions, IconSlot, PresentationDriver, ScreenState};
pub use error::{FailureKind, FetchError, QueryError};
pub use model::{RequestOutcome, WeatherQuery, WeatherResult};
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use view::{ErrorNotice, WeatherView};
