use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, header::ACCEPT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::FetchError,
    model::{RequestOutcome, WeatherQuery, WeatherResult},
};

use super::WeatherProvider;

/// Client for the OpenWeather current-weather endpoint, always in metric units.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl OpenWeatherClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_endpoint(api_key, config.base_url.clone(), config.timeout())
    }

    pub fn with_endpoint(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, base_url, timeout, http })
    }

    fn current_request(&self, query: &WeatherQuery) -> RequestBuilder {
        self.http
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .query(&[
                ("q", query.city()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        // The request URL carries the API key.
        FetchError::from_reqwest(err.without_url(), self.timeout)
    }
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(level = "debug", skip(self, query), fields(city = %query))]
    async fn fetch_weather(&self, query: &WeatherQuery) -> RequestOutcome {
        let res = self
            .current_request(query)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = res.status();
        let body = res.text().await.map_err(|err| self.transport_error(err))?;
        debug!(%status, bytes = body.len(), "received current weather response");

        classify_response(status, &body)
    }

    async fn fetch_icon(&self, icon_url: &str) -> Result<Vec<u8>, FetchError> {
        let res = self
            .http
            .get(icon_url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: fallback_message(status),
            });
        }

        let bytes = res.bytes().await.map_err(|err| self.transport_error(err))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// OpenWeather error bodies look like `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

/// Turn a status and body into an outcome. Pure so it can be tested offline.
fn classify_response(status: StatusCode, body: &str) -> RequestOutcome {
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            message: http_message(status, body),
        });
    }

    let parsed: OwCurrentResponse = serde_json::from_str(body).map_err(FetchError::Parse)?;

    let icon = parsed.weather.into_iter().next().map(|w| w.icon).ok_or_else(|| {
        FetchError::Parse(serde::de::Error::custom("`weather` array is empty"))
    })?;

    Ok(WeatherResult {
        temperature_c: parsed.main.temp,
        humidity_pct: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        icon,
        location: parsed.name.filter(|name| !name.is_empty()),
        observed_at: parsed.dt.and_then(unix_to_utc),
    })
}

fn http_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback_message(status))
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
