use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    SearchError,
    error::truncate_body,
    model::{ForecastPayload, ResolvedPlace, Suggestion},
};

use super::{Forecaster, Geocoder};

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1";

pub const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "is_day",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "wind_speed_10m",
];

pub const DAILY_FIELDS: &[&str] = &["weather_code", "temperature_2m_max", "temperature_2m_min"];

/// `results` is absent altogether when nothing matches.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Suggestion>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    base_url: String,
    http: Client,
}

impl OpenMeteoGeocoder {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn search(&self, name: &str, count: usize) -> Result<Vec<Suggestion>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let count = count.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("name", name),
                ("count", count.as_str()),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(SearchError::Provider(format!(
                "geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            SearchError::Provider(format!("failed to parse geocoding JSON: {e}"))
        })?;

        Ok(parsed.results)
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn suggest(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        match self.search(query, limit).await {
            Ok(mut results) => {
                results.truncate(limit);
                results
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "suggestion fetch failed");
                Vec::new()
            }
        }
    }

    async fn resolve(&self, query: &str) -> Result<ResolvedPlace, SearchError> {
        self.search(query, 1)
            .await?
            .into_iter()
            .next()
            .map(ResolvedPlace::from)
            .ok_or_else(|| SearchError::NotFound(query.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoForecaster {
    base_url: String,
    http: Client,
}

impl OpenMeteoForecaster {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl Forecaster for OpenMeteoForecaster {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastPayload, SearchError> {
        let url = format!("{}/forecast", self.base_url);
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let current = CURRENT_FIELDS.join(",");
        let daily = DAILY_FIELDS.join(",");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", current.as_str()),
                ("daily", daily.as_str()),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(SearchError::Provider(format!(
                "forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| SearchError::Provider(format!("failed to parse forecast JSON: {e}")))
    }
}
