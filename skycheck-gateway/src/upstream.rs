//! Forwarding to the area provider with the server-held credential attached.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use skycheck_core::error::truncate_body;
use thiserror::Error;
use warp::hyper::body::Bytes;

use crate::config::{Credential, GatewayConfig};

/// How a forwarded request failed. Detail is for server logs only.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream answered {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("upstream returned a body that is not JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("could not reach upstream: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    area_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct Upstream {
    http: Client,
    base_url: String,
    credential: Credential,
}

impl Upstream {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.upstream_timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            credential: config.credential.clone(),
        })
    }

    pub async fn suggest(&self, query: &str) -> Result<Bytes, GatewayError> {
        let url = format!("{}/areas/suggest", self.base_url);
        self.forward(self.http.get(url).query(&[("q", query)])).await
    }

    pub async fn check(&self, area_id: &str) -> Result<Bytes, GatewayError> {
        let url = format!("{}/areas/check", self.base_url);
        let request = self.http.post(url).json(&CheckRequest { area_id });
        self.forward(request).await
    }

    /// Attach the credential, send, and hand back the body only if it is a
    /// successful JSON response.
    async fn forward(&self, request: RequestBuilder) -> Result<Bytes, GatewayError> {
        let res = request.bearer_auth(self.credential.expose()).send().await?;

        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                body: truncate_body(&String::from_utf8_lossy(&body)),
            });
        }

        serde_json::from_slice::<serde::de::IgnoredAny>(&body)?;
        Ok(body)
    }
}
