//! End-to-end checks against mock shop, Telegram and email endpoints.

use std::time::Duration;

use serde_json::{Value, json};
use stockwatch_cli::commands::cmd_check;
use stockwatch_cli::{CheckOutcome, Watcher};
use stockwatch_core::config::FetchBackend;
use stockwatch_core::{Error, WatcherState};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config_for, product_page};

async fn serve_page(server: &MockServer, status: &str) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/widget"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(status)))
        .mount(server)
        .await;
}

async fn accept_notifications(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/sendMessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 1 }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_restock_over_http() {
    let shop = MockServer::start().await;
    let apis = MockServer::start().await;
    accept_notifications(&apis).await;

    let config = config_for(&apis.uri(), &format!("{}/widget", shop.uri()));
    let mut watcher = Watcher::from_config(&config).unwrap();

    serve_page(&shop, "Out of stock").await;
    assert!(matches!(
        watcher.check_once().await.unwrap(),
        CheckOutcome::Baseline(_)
    ));
    assert!(apis.received_requests().await.unwrap().is_empty());

    serve_page(&shop, "In stock").await;
    let CheckOutcome::Changed { report, .. } = watcher.check_once().await.unwrap() else {
        unreachable!("expected a change");
    };
    assert!(report.all_delivered());

    let requests = apis.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let telegram: Value = requests[0].body_json().unwrap();
    assert_eq!(telegram["chat_id"], "42");
    assert!(
        telegram["text"]
            .as_str()
            .unwrap()
            .starts_with("[IN STOCK] Test Widget: In stock")
    );

    let email: Value = requests[1].body_json().unwrap();
    assert_eq!(email["subject"], "[IN STOCK] Test Widget: In stock");
    assert_eq!(email["personalizations"][0]["to"][0]["email"], "me@example.com");
}

#[tokio::test]
async fn test_server_error_is_a_failed_check() {
    let shop = MockServer::start().await;
    let apis = MockServer::start().await;
    accept_notifications(&apis).await;

    let config = config_for(&apis.uri(), &format!("{}/widget", shop.uri()));
    let mut watcher = Watcher::from_config(&config).unwrap();

    serve_page(&shop, "In stock").await;
    watcher.check_once().await.unwrap();

    shop.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&shop)
        .await;
    let err = watcher.check_once().await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 503, .. }));
    assert!(err.is_transient());
    assert_eq!(watcher.last_status().unwrap().as_str(), "In stock");
    assert!(apis.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_command_needs_no_channels() {
    let shop = MockServer::start().await;
    serve_page(&shop, "Available for preorder").await;

    let mut config = config_for("http://127.0.0.1:9", &format!("{}/widget", shop.uri()));
    config.telegram.bot_token.clear();
    config.email.api_key.clear();

    let observation = cmd_check(&config).await.unwrap();
    assert_eq!(observation.status.as_str(), "Available for preorder");
}

#[tokio::test]
async fn test_shutdown_mid_render_deletes_browser_session() {
    let driver = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": "s-1", "capabilities": {} }
        })))
        .expect(1)
        .mount(&driver)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&driver)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&driver)
        .await;

    let mut config = config_for("http://127.0.0.1:9", "https://shop.example/widget");
    config.fetch.backend = FetchBackend::Webdriver;
    config.fetch.webdriver_url = Some(driver.uri());
    config.fetch.render_wait_ms = 30_000;
    let watcher = Watcher::from_config(&config).unwrap();
    let handle = watcher.handle();

    watcher.run(tokio::time::sleep(Duration::from_millis(500))).await;

    assert_eq!(handle.state(), WatcherState::Stopped);
    assert_eq!(handle.checks(), 0);
    let methods: Vec<String> = driver
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.method.as_str().to_string())
        .collect();
    assert_eq!(methods, vec!["POST", "POST", "DELETE"]);
}

#[test]
fn test_invalid_selector_fails_at_startup() {
    let mut config = config_for("http://127.0.0.1:9", "https://shop.example/widget");
    config.product.selector = "div > span".to_string();
    let err = Watcher::from_config(&config).unwrap_err();
    assert!(matches!(err, Error::Selector { .. }));
}
