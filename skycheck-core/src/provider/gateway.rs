//! Client side of the proxy gateway: suggestions and area checks go through the
//! gateway so the provider credential stays on the server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    SearchError,
    error::truncate_body,
    model::{ResolvedPlace, Suggestion},
};

use super::Geocoder;

#[derive(Debug, Deserialize)]
struct SuggestionsResponse {
    #[serde(default)]
    results: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    area_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    http: Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, SearchError> {
        let url = format!("{}/api/suggestions", self.base_url);

        let res = self.http.get(&url).query(&[("q", query)]).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(SearchError::Provider(format!(
                "gateway suggestions failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: SuggestionsResponse = serde_json::from_str(&body).map_err(|e| {
            SearchError::Provider(format!("failed to parse gateway suggestions: {e}"))
        })?;

        Ok(parsed.results)
    }

    /// Ask the gateway to check an area; the upstream JSON is returned untouched.
    pub async fn check_area(&self, area_id: &str) -> Result<serde_json::Value, SearchError> {
        if area_id.trim().is_empty() {
            return Err(SearchError::Validation("area id must not be empty".into()));
        }

        let url = format!("{}/api/check", self.base_url);

        let res = self
            .http
            .post(&url)
            .json(&CheckRequest { area_id })
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(SearchError::Provider(format!(
                "gateway area check failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| SearchError::Provider(format!("failed to parse area check JSON: {e}")))
    }
}

#[async_trait]
impl Geocoder for GatewayClient {
    async fn suggest(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        match self.suggestions(query).await {
            Ok(mut results) => {
                results.truncate(limit);
                results
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "gateway suggestion fetch failed");
                Vec::new()
            }
        }
    }

    async fn resolve(&self, query: &str) -> Result<ResolvedPlace, SearchError> {
        self.suggestions(query)
            .await?
            .into_iter()
            .next()
            .map(ResolvedPlace::from)
            .ok_or_else(|| SearchError::NotFound(query.to_string()))
    }
}
