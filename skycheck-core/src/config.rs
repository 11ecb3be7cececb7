use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{controller::SearchSettings, provider::ProviderId};

/// Endpoint override for a single geocoding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
}

/// Tuning for the search controller and its HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub suggestion_limit: usize,
    pub request_timeout_secs: u64,
    /// Overrides the public forecast endpoint.
    pub forecast_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            suggestion_limit: 5,
            request_timeout_secs: 10,
            forecast_url: None,
        }
    }
}

impl SearchConfig {
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            suggestion_limit: self.suggestion_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Geocoding source, "open-meteo" or "gateway". Open-Meteo when unset.
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.gateway]
    /// base_url = "http://localhost:3001"
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Config from the platform config dir; defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)
                .with_context(|| format!("Invalid skycheck config at {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("Cannot read skycheck config at {}", path.display()))
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Writes pretty TOML, creating missing parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create config directory {}", dir.display()))?;
        }

        let rendered = toml::to_string_pretty(self).context("Cannot render config as TOML")?;
        fs::write(path, rendered)
            .with_context(|| format!("Cannot write skycheck config at {}", path.display()))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycheck", "skycheck")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider endpoint; the first configured provider becomes the default.
    pub fn upsert_provider_base_url(&mut self, provider_id: ProviderId, base_url: String) {
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { base_url });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.base_url.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_base_url(provider_id).is_some()
    }
}
