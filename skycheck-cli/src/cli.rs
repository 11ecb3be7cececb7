use std::{fmt, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Select, Text};
use skycheck_core::{
    Config, Geocoder, ProviderId, SearchController, SearchHandle, Suggestion,
    controller::MIN_QUERY_CHARS,
    provider::{self, openmeteo},
};

use crate::render;

const DEFAULT_GATEWAY_URL: &str = "http://localhost:3001";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "skycheck",
    version,
    about = "City weather lookup with live place suggestions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the endpoint of a geocoding provider.
    Configure {
        /// Provider short name, "open-meteo" or "gateway".
        provider: String,
    },

    /// Show current weather and the daily outlook for a city.
    Show {
        /// City name, resolved to the provider's best match.
        place: String,
    },

    /// List place suggestions for a partial name.
    Suggest { query: String },

    /// Type a city, then pick a suggestion or search the text as typed.
    Search,

    /// Ask the gateway whether an area is covered.
    Check {
        /// Area identifier as known to the area provider.
        area_id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { place } => show(place).await,
            Command::Suggest { query } => suggest(&query).await,
            Command::Search => interactive_search().await,
            Command::Check { area_id } => check(&area_id).await,
        }
    }
}

fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let current = config
        .provider_base_url(id)
        .unwrap_or(match id {
            ProviderId::OpenMeteo => openmeteo::GEOCODING_URL,
            ProviderId::Gateway => DEFAULT_GATEWAY_URL,
        })
        .to_string();

    let message = format!("Base URL for {id}:");
    let base_url = Text::new(&message)
        .with_default(&current)
        .with_help_message("Press Enter to keep the current value")
        .prompt()?;
    let base_url = base_url.trim().trim_end_matches('/');
    if base_url.is_empty() {
        bail!("Base URL must not be empty.");
    }
    config.upsert_provider_base_url(id, base_url.to_string());

    let is_default = config.default_provider_id().ok() == Some(id);
    let message = format!("Use {id} for place lookups by default?");
    if Confirm::new(&message).with_default(is_default).prompt()? {
        config.set_default_provider(id);
    }

    config.save()?;
    println!(
        "Saved {id} settings to {}",
        Config::config_file_path()?.display()
    );

    Ok(())
}

fn start_search(config: &Config) -> Result<SearchHandle> {
    let geocoder = provider::default_geocoder_from_config(config)?;
    let forecaster = provider::forecaster_from_config(config)?;
    Ok(SearchController::spawn(
        geocoder,
        forecaster,
        config.search.settings(),
    ))
}

async fn show(place: String) -> Result<()> {
    let config = Config::load()?;
    let search = start_search(&config)?;

    search.query_changed(place).await?;
    search.submit().await?;
    let state = search.settled().await?;

    if let Some(message) = state.error_message() {
        bail!(message);
    }
    print!("{}", render::outcome(&state));

    Ok(())
}

async fn suggest(query: &str) -> Result<()> {
    let config = Config::load()?;
    let geocoder = provider::default_geocoder_from_config(&config)?;

    let results = geocoder
        .suggest(query.trim(), config.search.suggestion_limit)
        .await;
    if results.is_empty() {
        println!("No suggestions for '{query}'.");
    } else {
        print!("{}", render::suggestions(&results));
    }

    Ok(())
}

async fn check(area_id: &str) -> Result<()> {
    if area_id.trim().is_empty() {
        bail!("Area ID required");
    }

    let config = Config::load()?;
    let gateway = provider::gateway_client_from_config(&config)?;
    let body = gateway
        .check_area(area_id)
        .await
        .context("Failed to check area")?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// A row in the suggestion picker.
enum Choice {
    Place(Suggestion),
    Query(String),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Place(suggestion) => f.write_str(&suggestion.label()),
            Choice::Query(query) => write!(f, "Search for \"{query}\""),
        }
    }
}

async fn interactive_search() -> Result<()> {
    let config = Config::load()?;
    let search = start_search(&config)?;
    let wait_limit = config.search.settings().debounce + config.search.request_timeout();

    loop {
        let initial = search.state().query;
        let Some(text) = Text::new("City:")
            .with_initial_value(&initial)
            .with_help_message("Esc to quit")
            .prompt_skippable()?
        else {
            break;
        };
        if text.trim().is_empty() {
            break;
        }

        search.query_changed(text.clone()).await?;
        let suggestions = wait_for_suggestions(&search, &text, wait_limit).await?;

        let choice = if suggestions.is_empty() {
            Choice::Query(text)
        } else {
            let mut options: Vec<Choice> = suggestions.into_iter().map(Choice::Place).collect();
            options.push(Choice::Query(text));
            match Select::new("Pick a place:", options).prompt_skippable()? {
                Some(choice) => choice,
                None => continue,
            }
        };

        match choice {
            Choice::Place(suggestion) => search.select(suggestion).await?,
            Choice::Query(_) => search.submit().await?,
        }

        let state = search.settled().await?;
        println!();
        print!("{}", render::outcome(&state));
        println!();
    }

    Ok(())
}

/// Suggestions fetched for `query`, or none if no lookup will run for it or
/// the lookup does not report back within `limit`.
async fn wait_for_suggestions(
    search: &SearchHandle,
    query: &str,
    limit: Duration,
) -> Result<Vec<Suggestion>> {
    let displayed = search
        .state()
        .snapshot
        .is_some_and(|weather| weather.city_name == query);
    if query.chars().count() < MIN_QUERY_CHARS || displayed {
        return Ok(Vec::new());
    }

    let answered = search.wait_for(|s| s.suggestions_for.as_deref() == Some(query));
    match tokio::time::timeout(limit, answered).await {
        Ok(state) => Ok(state?.suggestions),
        Err(_) => {
            tracing::debug!(%query, "no suggestions before timeout");
            Ok(Vec::new())
        }
    }
}
