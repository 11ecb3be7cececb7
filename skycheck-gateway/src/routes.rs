use std::{collections::HashMap, convert::Infallible, sync::Arc};

use serde::{Deserialize, Serialize};
use warp::{
    Filter, Rejection, Reply,
    http::StatusCode,
    hyper::body::Bytes,
    reply::Response,
};

use crate::upstream::Upstream;

/// Largest accepted `POST /api/check` body.
pub const MAX_CHECK_BODY_BYTES: u64 = 16 * 1024;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckBody {
    #[serde(default)]
    area_id: Option<String>,
}

/// All gateway routes: `GET /`, `GET /api/suggestions`, `POST /api/check`.
pub fn routes(
    upstream: Arc<Upstream>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let root = warp::path::end()
        .and(warp::get())
        .map(|| "Area Checker API is running");

    let suggestions = warp::path!("api" / "suggestions")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_upstream(upstream.clone()))
        .and_then(handle_suggestions);

    let check = warp::path!("api" / "check")
        .and(warp::post())
        .and(check_body())
        .and(with_upstream(upstream))
        .and_then(handle_check);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_header("content-type");

    root.or(suggestions)
        .or(check)
        .with(cors)
        .with(warp::trace::request())
}

/// The request body, capped at [`MAX_CHECK_BODY_BYTES`] (413 above it). A request
/// without a declared length is read as empty rather than streamed unbounded.
fn check_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    let sized = warp::body::content_length_limit(MAX_CHECK_BODY_BYTES).and(warp::body::bytes());
    let undeclared = warp::header::optional::<u64>("content-length").and_then(
        |length: Option<u64>| async move {
            match length {
                None => Ok(Bytes::new()),
                Some(_) => Err(warp::reject()),
            }
        },
    );

    sized.or(undeclared).unify()
}

fn with_upstream(
    upstream: Arc<Upstream>,
) -> impl Filter<Extract = (Arc<Upstream>,), Error = Infallible> + Clone {
    warp::any().map(move || upstream.clone())
}

async fn handle_suggestions(
    params: HashMap<String, String>,
    upstream: Arc<Upstream>,
) -> Result<Response, Infallible> {
    let Some(query) = params.get("q").filter(|q| !q.is_empty()) else {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Query required"));
    };

    match upstream.suggest(query).await {
        Ok(body) => Ok(json_reply(body)),
        Err(e) => {
            tracing::error!(error = %e, "suggestion relay failed");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch suggestions",
            ))
        }
    }
}

async fn handle_check(body: Bytes, upstream: Arc<Upstream>) -> Result<Response, Infallible> {
    // A body that is absent or not JSON is treated like one without an area id.
    let parsed: CheckBody = serde_json::from_slice(&body).unwrap_or_default();
    let Some(area_id) = parsed.area_id.filter(|id| !id.is_empty()) else {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Area ID required"));
    };

    match upstream.check(&area_id).await {
        Ok(body) => Ok(json_reply(body)),
        Err(e) => {
            tracing::error!(error = %e, "area check relay failed");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to check area",
            ))
        }
    }
}

/// Upstream body relayed byte for byte.
fn json_reply(body: Bytes) -> Response {
    warp::reply::with_header(body.to_vec(), "content-type", "application/json").into_response()
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorBody { error: message }), status)
        .into_response()
}
