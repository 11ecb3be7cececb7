//! HTTP client tests against a mock provider.

use std::time::Duration;

use skycheck_core::{
    Forecaster, Geocoder, SearchError,
    provider::{
        gateway::GatewayClient,
        http_client,
        openmeteo::{OpenMeteoForecaster, OpenMeteoGeocoder},
    },
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    http_client(Duration::from_secs(5)).expect("client should build")
}

fn london_results() -> serde_json::Value {
    serde_json::json!({
        "results": [
            {"id": 2643743, "name": "London", "admin1": "England", "country": "United Kingdom",
             "latitude": 51.50853, "longitude": -0.12574, "population": 7556900},
            {"id": 6058560, "name": "London", "admin1": "Ontario", "country": "Canada",
             "latitude": 42.98339, "longitude": -81.23304},
            {"id": 2643734, "name": "Londonderry", "country": "United Kingdom",
             "latitude": 54.9981, "longitude": -7.30934}
        ],
        "generationtime_ms": 0.5
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "latitude": 51.5,
        "longitude": -0.12,
        "timezone": "Europe/London",
        "current_units": {"temperature_2m": "°C", "relative_humidity_2m": "%", "wind_speed_10m": "km/h"},
        "current": {
            "time": "2025-03-01T12:00", "interval": 900,
            "temperature_2m": 9.6, "relative_humidity_2m": 80, "apparent_temperature": 7.1,
            "is_day": 1, "precipitation": 0.2, "rain": 0.2, "showers": 0.0, "snowfall": 0.0,
            "weather_code": 61, "cloud_cover": 100, "wind_speed_10m": 18.4
        },
        "daily_units": {"temperature_2m_max": "°C"},
        "daily": {
            "time": ["2025-03-01", "2025-03-02", "2025-03-03"],
            "weather_code": [61, 3, 0],
            "temperature_2m_max": [10.2, 11.0, 12.5],
            "temperature_2m_min": [5.1, 4.0, 3.3]
        }
    })
}

#[tokio::test]
async fn open_meteo_suggest_sends_expected_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Lon"))
        .and(query_param("count", "5"))
        .and(query_param("language", "en"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_results()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(mock_server.uri(), client());
    let results = geocoder.suggest("Lon", 5).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].admin1.as_deref(), Some("England"));
    assert_eq!(results[2].admin1, None);
    assert_eq!(results[1].label(), "London, Ontario, Canada");
}

#[tokio::test]
async fn open_meteo_suggest_without_results_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "generationtime_ms": 0.2
        })))
        .mount(&mock_server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(mock_server.uri(), client());
    assert!(geocoder.suggest("Qx", 5).await.is_empty());
}

#[tokio::test]
async fn open_meteo_suggest_degrades_to_empty_on_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(mock_server.uri(), client());
    assert!(geocoder.suggest("London", 5).await.is_empty());

    let garbled_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&garbled_server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(garbled_server.uri(), client());
    assert!(geocoder.suggest("London", 5).await.is_empty());
}

#[tokio::test]
async fn open_meteo_resolve_takes_top_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "london"))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_results()))
        .mount(&mock_server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(mock_server.uri(), client());
    let place = geocoder.resolve("london").await.unwrap();

    assert_eq!(place.name, "London");
    assert_eq!(place.country, "United Kingdom");
    assert_eq!(place.latitude, 51.50853);
}

#[tokio::test]
async fn open_meteo_resolve_distinguishes_not_found_from_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Atlantis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Berlin"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(mock_server.uri(), client());

    let err = geocoder.resolve("Atlantis").await.unwrap_err();
    assert!(matches!(err, SearchError::NotFound(ref q) if q == "Atlantis"));

    let err = geocoder.resolve("Berlin").await.unwrap_err();
    assert!(matches!(err, SearchError::Provider(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn open_meteo_forecast_requests_fixed_field_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "51.5"))
        .and(query_param("longitude", "-0.12"))
        .and(query_param(
            "current",
            "temperature_2m,relative_humidity_2m,apparent_temperature,is_day,precipitation,rain,showers,snowfall,weather_code,cloud_cover,wind_speed_10m",
        ))
        .and(query_param("daily", "weather_code,temperature_2m_max,temperature_2m_min"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let forecaster = OpenMeteoForecaster::new(mock_server.uri(), client());
    let payload = forecaster.fetch(51.5, -0.12).await.unwrap();

    assert_eq!(payload.current.weather_code, 61);
    assert_eq!(payload.current.wind_speed, 18.4);
    assert_eq!(payload.current_units["temperature_2m"], "°C");
    assert_eq!(payload.daily.days().count(), 3);
}

#[tokio::test]
async fn open_meteo_forecast_rejects_bad_status_and_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true, "reason": "Latitude must be in range"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current": {"temperature_2m": "warm"}
        })))
        .mount(&mock_server)
        .await;

    let forecaster = OpenMeteoForecaster::new(mock_server.uri(), client());

    let err = forecaster.fetch(1.0, 0.0).await.unwrap_err();
    assert!(matches!(err, SearchError::Provider(_)));

    let err = forecaster.fetch(2.0, 0.0).await.unwrap_err();
    assert!(matches!(err, SearchError::Provider(ref m) if m.contains("parse")));
}

#[tokio::test]
async fn slow_provider_times_out_as_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let http = http_client(Duration::from_millis(200)).expect("client should build");
    let forecaster = OpenMeteoForecaster::new(mock_server.uri(), http);

    let err = forecaster.fetch(51.5, -0.12).await.unwrap_err();
    assert!(matches!(err, SearchError::Transport(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn gateway_client_reads_suggestions_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/suggestions"))
        .and(query_param("q", "Lon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_results()))
        .mount(&mock_server)
        .await;

    let gateway = GatewayClient::new(format!("{}/", mock_server.uri()), client());

    let results = gateway.suggest("Lon", 2).await;
    assert_eq!(results.len(), 2);

    let place = gateway.resolve("Lon").await.unwrap();
    assert_eq!(place.name, "London");
}

#[tokio::test]
async fn gateway_client_accepts_text_area_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/suggestions"))
        .and(query_param("q", "Par"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"id": "a-1", "name": "Paris", "country": "France",
                 "latitude": 48.85, "longitude": 2.35},
                {"id": 2988507, "name": "Paris", "admin1": "Texas", "country": "United States",
                 "latitude": 33.66, "longitude": -95.56}
            ]
        })))
        .mount(&mock_server)
        .await;

    let gateway = GatewayClient::new(mock_server.uri(), client());

    let results = gateway.suggest("Par", 5).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "a-1");
    assert_eq!(results[1].id, "2988507");

    let place = gateway.resolve("Par").await.unwrap();
    assert_eq!(place.country, "France");
    assert_eq!(place.latitude, 48.85);
}

#[tokio::test]
async fn gateway_client_error_payload_becomes_empty_suggestions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/suggestions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "Failed to fetch suggestions"
        })))
        .mount(&mock_server)
        .await;

    let gateway = GatewayClient::new(mock_server.uri(), client());
    assert!(gateway.suggest("Lon", 5).await.is_empty());
    assert!(matches!(
        gateway.resolve("Lon").await.unwrap_err(),
        SearchError::Provider(_)
    ));
}

#[tokio::test]
async fn gateway_client_posts_area_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/check"))
        .and(body_json(serde_json::json!({"areaId": "area-42"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "areaId": "area-42", "covered": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = GatewayClient::new(mock_server.uri(), client());
    let body = gateway.check_area("area-42").await.unwrap();
    assert_eq!(body["covered"], serde_json::json!(true));

    let err = gateway.check_area("  ").await.unwrap_err();
    assert!(matches!(err, SearchError::Validation(_)));
}
