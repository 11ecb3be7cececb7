use crate::{
    Config, SearchError,
    model::{ForecastPayload, ResolvedPlace, Suggestion},
    provider::{
        gateway::GatewayClient,
        openmeteo::{OpenMeteoForecaster, OpenMeteoGeocoder},
    },
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod gateway;
pub mod openmeteo;

const USER_AGENT: &str = concat!("skycheck/", env!("CARGO_PKG_VERSION"));

/// Where place-name lookups are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    Gateway,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::Gateway => "gateway",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::Gateway]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "gateway" => Ok(ProviderId::Gateway),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: open-meteo, gateway."
            )),
        }
    }
}

/// Place-name lookups: advisory suggestions and single best-match resolution.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Up to `limit` matches for `query`. Failures are logged and yield an empty list.
    async fn suggest(&self, query: &str, limit: usize) -> Vec<Suggestion>;

    /// The provider's top match, or `SearchError::NotFound` when there is none.
    async fn resolve(&self, query: &str) -> Result<ResolvedPlace, SearchError>;
}

#[async_trait]
pub trait Forecaster: Send + Sync + Debug {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastPayload, SearchError>;
}

/// Shared HTTP client with a bounded per-request timeout.
pub fn http_client(timeout: Duration) -> Result<Client, SearchError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Construct a geocoder from config and explicit ProviderId.
pub fn geocoder_from_config(id: ProviderId, config: &Config) -> anyhow::Result<Arc<dyn Geocoder>> {
    let http = http_client(config.search.request_timeout())?;

    let geocoder: Arc<dyn Geocoder> = match id {
        ProviderId::OpenMeteo => {
            let base_url = config
                .provider_base_url(id)
                .unwrap_or(openmeteo::GEOCODING_URL);
            Arc::new(OpenMeteoGeocoder::new(base_url, http))
        }
        ProviderId::Gateway => Arc::new(gateway_client_from_config(config)?),
    };

    Ok(geocoder)
}

/// Construct the default geocoder from config, using `default_provider` field.
pub fn default_geocoder_from_config(config: &Config) -> anyhow::Result<Arc<dyn Geocoder>> {
    let id = config.default_provider_id()?;
    geocoder_from_config(id, config)
}

pub fn forecaster_from_config(config: &Config) -> anyhow::Result<Arc<dyn Forecaster>> {
    let http = http_client(config.search.request_timeout())?;
    let base_url = config
        .search
        .forecast_url
        .as_deref()
        .unwrap_or(openmeteo::FORECAST_URL);

    Ok(Arc::new(OpenMeteoForecaster::new(base_url, http)))
}

pub fn gateway_client_from_config(config: &Config) -> anyhow::Result<GatewayClient> {
    let base_url = config.provider_base_url(ProviderId::Gateway).ok_or_else(|| {
        anyhow::anyhow!(
            "No base URL configured for provider 'gateway'.\n\
                 Hint: run `skycheck configure gateway` and enter the gateway address."
        )
    })?;
    let http = http_client(config.search.request_timeout())?;

    Ok(GatewayClient::new(base_url, http))
}
