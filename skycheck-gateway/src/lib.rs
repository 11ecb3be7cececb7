//! Proxy gateway for the area provider.
//!
//! Clients call the gateway; the gateway attaches the provider credential it
//! holds and relays the upstream response. Upstream failures are logged here
//! and reach clients only as a fixed, generic error body.

pub mod config;
pub mod routes;
pub mod upstream;

use std::{net::SocketAddr, sync::Arc};

pub use config::{Credential, GatewayConfig};
pub use routes::routes;
pub use upstream::{GatewayError, Upstream};

/// Serve the gateway until the process is stopped.
pub async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    let upstream = Arc::new(Upstream::new(&config)?);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(%addr, upstream = %config.base_url, "gateway listening");
    warp::serve(routes(upstream)).run(addr).await;
    Ok(())
}
