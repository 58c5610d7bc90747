mod common;

use common::TestApp;
use service_core::providers::mock::MockChatProvider;
use wiremock::MockServer;

#[tokio::test]
async fn health_check_works() {
    let backend = MockServer::start().await;
    let app = TestApp::spawn(MockChatProvider::new(), &backend).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body,
        serde_json::json!({"status": "healthy", "service": "wardrobe_chatbot"})
    );
}

#[tokio::test]
async fn request_id_is_echoed() {
    let backend = MockServer::start().await;
    let app = TestApp::spawn(MockChatProvider::new(), &backend).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("x-request-id", "req-123")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers()["x-request-id"], "req-123");
}
