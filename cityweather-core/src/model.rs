use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, QueryError};

/// Base of the OpenWeather icon CDN; the icon code and size suffix are appended.
pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// A city name that is known to be non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    city: String,
}

impl WeatherQuery {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let city = input.trim();
        if city.is_empty() {
            return Err(QueryError::Blank);
        }

        Ok(Self { city: city.to_string() })
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

impl std::fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.city)
    }
}

/// Current conditions for one city, as returned by a single successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    /// Icon code such as `01d`.
    pub icon: String,
    pub location: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherResult {
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@4x.png", self.icon)
    }
}

pub type RequestOutcome = Result<WeatherResult, FetchError>;
