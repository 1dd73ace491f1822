use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mintchat::config::RelayConfig;
use mintchat::constants;
use mintchat::web_server::build_router;

fn test_config(weather_url: String, key: Option<&str>) -> RelayConfig {
    RelayConfig {
        completion_api_url: "http://127.0.0.1:1".to_string(),
        completion_api_key: None,
        weather_api_url: weather_url,
        weather_api_key: key.map(String::from),
        email_api_url: "http://127.0.0.1:1".to_string(),
        email_api_key: None,
    }
}

async fn server_against(upstream: &MockServer, key: Option<&str>) -> TestServer {
    let config = Arc::new(test_config(upstream.uri(), key));
    TestServer::new(build_router(config).unwrap()).unwrap()
}

#[test_log::test(tokio::test)]
async fn maps_the_provider_payload_into_a_snapshot() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", constants::WEATHER_LOCATION.as_str()))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "weather-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "main": { "temp": 31.4, "pressure": 1006, "humidity": 58 },
            "visibility": 10000,
            "weather": [{ "main": "Clouds", "description": "scattered clouds" }]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let server = server_against(&upstream, Some("weather-key")).await;
    let response = server.get("/weather").await;
    response.assert_status_ok();

    let snapshot = response.json::<Value>();
    assert_eq!(snapshot["temperature"], 31.4);
    assert_eq!(snapshot["pressure"], 1006);
    assert_eq!(snapshot["humidity"], 58);
    assert_eq!(snapshot["visibility"], 10000);
    assert_eq!(snapshot["condition"], "clouds");
    assert_eq!(snapshot["description"], "scattered clouds");
}

#[tokio::test]
async fn provider_failure_collapses_to_null() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_string("city not found"))
        .expect(1)
        .mount(&upstream)
        .await;

    let server = server_against(&upstream, Some("weather-key")).await;
    let response = server.get("/weather").await;
    response.assert_status_ok();
    assert!(response.json::<Value>().is_null());
}

#[tokio::test]
async fn missing_key_collapses_to_null_without_an_upstream_call() {
    let upstream = MockServer::start().await;
    let server = server_against(&upstream, None).await;

    let response = server.get("/weather").await;
    response.assert_status_ok();
    assert!(response.json::<Value>().is_null());
    assert!(upstream.received_requests().await.unwrap().is_empty());
}
