use thiserror::Error;

/// Errors produced by the geocoding/forecast clients and the search controller.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Required input was missing or empty.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The geocoder returned zero matches for the query.
    #[error("No place matches '{0}'")]
    NotFound(String),

    /// Upstream answered with a non-success status or a payload we could not parse.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The upstream could not be reached (connect failure, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The task driving a request ended without reporting a result.
    #[error("Request ended before producing a result")]
    Interrupted,

    #[error("Search controller is no longer running")]
    Closed,
}

/// Cuts an upstream error body to at most 200 bytes, on a char boundary, for log detail.
pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
