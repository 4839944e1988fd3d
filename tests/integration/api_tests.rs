use super::*;
use axum::http::{Method, StatusCode};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_health_check() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let router = app.router();

    let response = make_request(&router, Method::GET, "/health", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"][0]["name"], "price_watch");
    Ok(())
}

#[tokio::test]
async fn test_tracking_lifecycle() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/kettle", "Electric Kettle", "1,249").await;
    let router = app.router();

    let response = make_request(
        &router,
        Method::POST,
        "/api/v1/trackings",
        Some(json!({ "watcher_id": "alice", "url": app.url("/item/kettle") })),
        None,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await?;
    assert_eq!(body["success"], true);
    let product_id = body["data"]["product"]["id"].as_str().unwrap().to_string();
    let subscription_id = body["data"]["subscription"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["product"]["name"], "Electric Kettle");

    let response = make_request(&router, Method::GET, "/api/v1/watchers/alice/trackings", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["meta"]["total"], 1);

    let response = make_request(&router, Method::GET, &format!("/api/v1/products/{}", product_id), None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["name"], "Electric Kettle");

    // Someone else's subscription cannot be removed.
    let uri = format!("/api/v1/watchers/bob/trackings/{}", subscription_id);
    let response = make_request(&router, Method::DELETE, &uri, None, None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/watchers/alice/trackings/{}", subscription_id);
    let response = make_request(&router, Method::DELETE, &uri, None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = make_request(&router, Method::GET, "/api/v1/watchers/alice/trackings", None, None).await?;
    let body = body_json(response).await?;
    assert_eq!(body["meta"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn test_track_rejects_invalid_url() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let router = app.router();

    for url in ["not a url", "ftp://files.example/item"] {
        let response = make_request(
            &router,
            Method::POST,
            "/api/v1/trackings",
            Some(json!({ "watcher_id": "alice", "url": url })),
            None,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "url {}", url);
    }
    Ok(())
}

#[tokio::test]
async fn test_track_unreadable_page_is_unprocessable() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": false, "code": ""})),
        )
        .mount(&app.server)
        .await;
    let router = app.router();

    let response = make_request(
        &router,
        Method::POST,
        "/api/v1/trackings",
        Some(json!({ "watcher_id": "alice", "url": app.url("/item/missing") })),
        None,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await?;
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    Ok(())
}

#[tokio::test]
async fn test_unknown_product_is_not_found() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let router = app.router();

    let response = make_request(&router, Method::GET, "/api/v1/products/does-not-exist", None, None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_action_runs_price_check() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/lamp", "Desk Lamp", "500").await;
    let router = app.router();
    make_request(
        &router,
        Method::POST,
        "/api/v1/trackings",
        Some(json!({ "watcher_id": "alice", "url": app.url("/item/lamp") })),
        None,
    )
    .await?;

    app.reset_pages().await;
    app.stub_page("/item/lamp", "Desk Lamp", "450").await;

    let response = make_request(
        &router,
        Method::POST,
        "/api/v1/actions",
        Some(json!({ "event": { "id": "scheduled_price_check", "trigger": { "type": "schedule" } } })),
        Some(TRIGGER_TOKEN),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["data"]["checked"], 1);
    assert_eq!(body["data"]["changed"][0], "Desk Lamp");
    assert_eq!(app.notifier.sent().len(), 1);

    let response = make_request(&router, Method::GET, "/api/v1/check/status", None, None).await?;
    let body = body_json(response).await?;
    assert_eq!(body["data"]["completed_runs"], 1);
    assert_eq!(body["data"]["running"], false);
    Ok(())
}

#[tokio::test]
async fn test_unknown_action_is_not_found() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let router = app.router();

    let response = make_request(
        &router,
        Method::POST,
        "/api/v1/actions",
        Some(json!({ "event": { "id": "reindex_everything" } })),
        Some(TRIGGER_TOKEN),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.watch.stats().await.completed_runs, 0);
    Ok(())
}

#[tokio::test]
async fn test_triggers_require_token() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let router = app.router();

    let response = make_request(&router, Method::POST, "/api/v1/check", None, None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = make_request(&router, Method::POST, "/api/v1/check", None, Some("wrong")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = make_request(&router, Method::POST, "/api/v1/check", None, Some(TRIGGER_TOKEN)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_triggers_open_without_configured_token() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let router = create_router(app.state(None));

    let response = make_request(&router, Method::POST, "/api/v1/check", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_overlapping_check_is_rejected() -> anyhow::Result<()> {
    let app = TestApp::with_notifier(RecordingNotifier::default(), Duration::from_secs(5)).await?;
    app.stub_page("/item/fan", "Table Fan", "1000").await;
    app.product_manager
        .track_product(price_sentinel::product_manager::TrackRequest {
            watcher_id: "alice".to_string(),
            url: app.url("/item/fan"),
        })
        .await?
        .expect("fan should be tracked");

    app.reset_pages().await;
    Mock::given(method("GET"))
        .and(path("/item/fan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page("Table Fan", "950"))
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&app.server)
        .await;

    let watch = app.watch.clone();
    let in_flight = tokio::spawn(async move { watch.run_check().await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let router = app.router();
    let response = make_request(&router, Method::POST, "/api/v1/check", None, Some(TRIGGER_TOKEN)).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let summary = in_flight.await?.expect("first check should complete");
    assert_eq!(summary.changed, vec!["Table Fan".to_string()]);
    assert_eq!(app.watch.stats().await.rejected_runs, 1);
    Ok(())
}
