use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::FetchError,
    model::{RequestOutcome, WeatherQuery},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Source of current weather and of the matching condition icons.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// One outbound request for `query`. No caching, no retry.
    async fn fetch_weather(&self, query: &WeatherQuery) -> RequestOutcome;

    /// Raw image bytes behind an icon URL.
    async fn fetch_icon(&self, icon_url: &str) -> Result<Vec<u8>, FetchError>;
}
