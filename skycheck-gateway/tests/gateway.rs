//! Gateway routes against a mocked upstream provider.

use std::sync::Arc;

use skycheck_gateway::{Credential, GatewayConfig, Upstream, routes};
use warp::http::StatusCode;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "sk-live-test-credential";

fn upstream_for(server: &MockServer) -> Arc<Upstream> {
    let config = GatewayConfig::new(server.uri(), Credential::new(SECRET));
    Arc::new(Upstream::new(&config).expect("client should build"))
}

fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

#[tokio::test]
async fn suggestions_without_query_is_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/areas/suggest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("GET")
        .path("/api/suggestions")
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body, serde_json::json!({"error": "Query required"}));
}

#[tokio::test]
async fn suggestions_relay_upstream_body_verbatim() {
    let mock_server = MockServer::start().await;
    let upstream_body = r#"{"results":[{"id":"a-1","name":"Paris 1er"},{"id":"a-2","name":"Paris 2e"}],"source":"upstream"}"#;

    Mock::given(method("GET"))
        .and(path("/areas/suggest"))
        .and(query_param("q", "paris"))
        .and(header("Authorization", format!("Bearer {SECRET}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(upstream_body, "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("GET")
        .path("/api/suggestions?q=paris")
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(body_text(res.body()), upstream_body);
}

#[tokio::test]
async fn suggestions_query_is_encoded_when_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/areas/suggest"))
        .and(query_param("q", "São Paulo & co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("GET")
        .path("/api/suggestions?q=S%C3%A3o%20Paulo%20%26%20co")
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn suggestions_upstream_failure_is_sanitized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/areas/suggest"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "db connection pool exhausted",
            "trace": "at AreaIndex.lookup (index.js:42)"
        })))
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("GET")
        .path("/api/suggestions?q=paris")
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = body_text(res.body());
    assert!(!text.contains(SECRET));
    assert!(!text.contains("pool exhausted"));
    assert!(!text.contains("index.js"));
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body, serde_json::json!({"error": "Failed to fetch suggestions"}));
}

#[tokio::test]
async fn suggestions_non_json_success_is_treated_as_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/areas/suggest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captive portal</html>"))
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("GET")
        .path("/api/suggestions?q=paris")
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(res.body()).contains("captive"));
}

#[tokio::test]
async fn check_without_area_id_is_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/areas/check"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("POST")
        .path("/api/check")
        .json(&serde_json::json!({}))
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body, serde_json::json!({"error": "Area ID required"}));
}

#[tokio::test]
async fn check_forwards_with_credential_and_relays_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/areas/check"))
        .and(header("Authorization", format!("Bearer {SECRET}").as_str()))
        .and(body_json(serde_json::json!({"areaId": "a-17"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "areaId": "a-17",
            "status": "available"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("POST")
        .path("/api/check")
        .json(&serde_json::json!({"areaId": "a-17"}))
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body, serde_json::json!({"areaId": "a-17", "status": "available"}));
}

#[tokio::test]
async fn check_upstream_failure_is_sanitized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/areas/check"))
        .respond_with(ResponseTemplate::new(401).set_body_string(format!("invalid key {SECRET}")))
        .mount(&mock_server)
        .await;

    let res = warp::test::request()
        .method("POST")
        .path("/api/check")
        .json(&serde_json::json!({"areaId": "a-17"}))
        .reply(&routes(upstream_for(&mock_server)))
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = body_text(res.body());
    assert!(!text.contains(SECRET));
    assert!(!text.contains("invalid key"));
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body, serde_json::json!({"error": "Failed to check area"}));
}

#[tokio::test]
async fn upstream_error_detail_is_truncated_for_logs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/areas/suggest"))
        .respond_with(ResponseTemplate::new(502).set_body_string("e".repeat(5_000)))
        .mount(&mock_server)
        .await;

    let err = upstream_for(&mock_server).suggest("paris").await.unwrap_err();

    match err {
        skycheck_gateway::GatewayError::Provider { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body.len(), 203);
            assert!(body.ends_with("..."));
        }
        other => panic!("expected a provider error, got {other:?}"),
    }
}
