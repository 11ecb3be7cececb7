use anyhow::{Context, Result, anyhow};
use std::{fmt, time::Duration};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BASE_URL: &str = "https://api.example.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const PORT_VAR: &str = "PORT";
pub const CREDENTIAL_VAR: &str = "AREA_API_KEY";
pub const BASE_URL_VAR: &str = "AREA_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "GATEWAY_TIMEOUT_SECS";

/// Provider API key. Only the upstream client ever reads the raw value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Immutable gateway settings, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub base_url: String,
    pub credential: Credential,
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            port: DEFAULT_PORT,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; a missing credential is a startup error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credential = lookup(CREDENTIAL_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(Credential::new)
            .ok_or_else(|| {
                anyhow!(
                    "{CREDENTIAL_VAR} is not set.\n\
                     Hint: export the provider API key before starting the gateway."
                )
            })?;

        let port = match lookup(PORT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid {PORT_VAR} value '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {TIMEOUT_VAR} value '{raw}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            ..Self::new(base_url, credential)
        })
    }
}
