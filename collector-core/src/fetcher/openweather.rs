use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::{
    config::ApiConfig,
    error::FetchError,
    fetcher::{CollectionClock, ReadingSource},
    model::{Location, Reading},
};

/// Upper bound on one upstream request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the current conditions for one fixed location from OpenWeather.
#[derive(Debug)]
pub struct OpenWeatherFetcher {
    base_url: String,
    api_key: String,
    location: Location,
    http: Client,
    clock: CollectionClock,
}

impl OpenWeatherFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &ApiConfig, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            location: config.location(),
            http,
            clock: CollectionClock::new(),
        })
    }

    /// One request, normalized. Errors are returned instead of logged.
    pub async fn try_fetch(&self) -> Result<Reading, FetchError> {
        let lat = self.location.latitude.to_string();
        let lon = self.location.longitude.to_string();

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::Body)?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        let payload: Value = serde_json::from_str(&body)?;

        Ok(Reading::from_payload(&payload, self.location, self.clock.now()))
    }
}

#[async_trait]
impl ReadingSource for OpenWeatherFetcher {
    async fn fetch(&self) -> Option<Reading> {
        match self.try_fetch().await {
            Ok(reading) => {
                let observed = reading.observed_time().map(|t| t.to_rfc3339());
                match reading.temperature_c {
                    Some(t) => {
                        tracing::info!(temperature_c = t, ?observed, "Collected reading: {t}°C")
                    }
                    None => tracing::info!(?observed, "Collected reading without temperature"),
                }
                Some(reading)
            }
            Err(e) => {
                tracing::warn!("Weather API fetch failed: {e}");
                None
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
