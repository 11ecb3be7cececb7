//! Core library for `skycheck`.
//!
//! This crate defines:
//! - Configuration handling
//! - Geocoding and forecast clients (Open-Meteo directly, or through the gateway)
//! - The search controller: debounced suggestions, submit/select flows, display state
//! - Shared domain models
//!
//! It is used by `skycheck-cli`, but can also drive other front ends.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, ProviderConfig, SearchConfig};
pub use controller::{Failure, Phase, SearchController, SearchHandle, SearchSettings, SearchState};
pub use error::SearchError;
pub use model::{ForecastPayload, ResolvedPlace, Suggestion, WeatherSnapshot};
pub use provider::{Forecaster, Geocoder, ProviderId};
