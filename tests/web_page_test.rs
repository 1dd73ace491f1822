use std::sync::Arc;

use axum_test::TestServer;

use mintchat::config::RelayConfig;
use mintchat::web_server::build_router;

fn offline_config() -> RelayConfig {
    RelayConfig {
        completion_api_url: "http://127.0.0.1:1".to_string(),
        completion_api_key: None,
        weather_api_url: "http://127.0.0.1:1".to_string(),
        weather_api_key: None,
        email_api_url: "http://127.0.0.1:1".to_string(),
        email_api_key: None,
    }
}

#[tokio::test]
async fn index_page_renders_the_chat_screen() {
    let server = TestServer::new(build_router(Arc::new(offline_config())).unwrap()).unwrap();

    let response = server.get("/").await;
    response.assert_status_ok();
    let page = response.text();
    assert!(page.contains("MintCode AI"));
    assert!(page.contains("/static/app.js"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let server = TestServer::new(build_router(Arc::new(offline_config())).unwrap()).unwrap();

    let response = server.get("/static/app.js").await;
    response.assert_status_ok();
    assert!(response.text().contains("\"/completion\""));
}
