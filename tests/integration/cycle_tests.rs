use super::*;
use price_sentinel::models::Product;
use price_sentinel::product_manager::TrackRequest;
use rust_decimal::Decimal;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn track(watcher_id: &str, url: &str) -> TrackRequest {
    TrackRequest {
        watcher_id: watcher_id.to_string(),
        url: url.to_string(),
    }
}

async fn stored(app: &TestApp, product_id: &str) -> anyhow::Result<Product> {
    app.repository
        .find_product(product_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {} missing", product_id))
}

async fn reprice(app: &TestApp, page: &str, title: &str, price: &str) {
    app.reset_pages().await;
    app.stub_page(page, title, price).await;
}

#[tokio::test]
async fn test_price_drop_is_recorded_and_announced() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/kettle", "Electric Kettle", "1,000").await;

    let tracking = app
        .product_manager
        .track_product(track("alice", &app.url("/item/kettle")))
        .await?
        .expect("kettle should be tracked");
    assert_eq!(tracking.product.price, Decimal::from(1000));

    reprice(&app, "/item/kettle", "Electric Kettle", "900").await;
    let summary = app.watch.run_check().await.expect("no check in flight");

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.changed, vec!["Electric Kettle".to_string()]);
    assert_eq!(summary.notifications.sent, 1);

    let product = stored(&app, &tracking.product.id).await?;
    assert_eq!(product.previous_price, Decimal::from(1000));
    assert_eq!(product.price, Decimal::from(900));
    assert_eq!(product.lower, Decimal::from(900));
    assert_eq!(product.upper, Decimal::from(1000));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice");
    assert!(sent[0].1.contains("Previous Price: ₹1000.00"));
    assert!(sent[0].1.contains("Current Price: ₹900.00"));
    assert!(sent[0].1.contains("Percentage Change: -10.00%"));
    Ok(())
}

#[tokio::test]
async fn test_unchanged_price_is_a_no_op() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/kettle", "Electric Kettle", "1000").await;
    let tracking = app
        .product_manager
        .track_product(track("alice", &app.url("/item/kettle")))
        .await?
        .expect("kettle should be tracked");

    reprice(&app, "/item/kettle", "Electric Kettle", "900").await;
    let first = app.watch.run_check().await.expect("no check in flight");
    assert_eq!(first.changed.len(), 1);
    let after_first = stored(&app, &tracking.product.id).await?;

    let second = app.watch.run_check().await.expect("no check in flight");
    assert!(second.changed.is_empty());
    assert_eq!(second.notifications.sent, 0);
    assert_eq!(stored(&app, &tracking.product.id).await?, after_first);
    assert_eq!(app.notifier.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_every_subscriber_gets_one_message() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/lamp", "Desk Lamp", "500").await;

    for watcher in ["alice", "bob"] {
        app.product_manager
            .track_product(track(watcher, &app.url("/item/lamp")))
            .await?
            .expect("lamp should be tracked");
    }

    reprice(&app, "/item/lamp", "Desk Lamp", "450").await;
    let summary = app.watch.run_check().await.expect("no check in flight");
    assert_eq!(summary.notifications.sent, 2);

    let mut recipients: Vec<String> = app.notifier.sent().into_iter().map(|(w, _)| w).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["alice".to_string(), "bob".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_failed_delivery_does_not_block_others() -> anyhow::Result<()> {
    let app =
        TestApp::with_notifier(RecordingNotifier::failing_for("alice"), Duration::from_secs(2))
            .await?;
    app.stub_page("/item/lamp", "Desk Lamp", "500").await;
    for watcher in ["alice", "bob"] {
        app.product_manager
            .track_product(track(watcher, &app.url("/item/lamp")))
            .await?;
    }

    reprice(&app, "/item/lamp", "Desk Lamp", "520").await;
    let summary = app.watch.run_check().await.expect("no check in flight");

    assert_eq!(summary.notifications.sent, 1);
    assert_eq!(summary.notifications.failed, 1);
    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "bob");
    assert!(sent[0].1.contains("Percentage Change: 4.00%"));
    Ok(())
}

#[tokio::test]
async fn test_same_name_resolves_to_existing_product() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/a", "Noise Cancelling Headphones", "2999").await;
    app.stub_page("/item/b", "Noise Cancelling Headphones", "2899").await;

    let first = app
        .product_manager
        .track_product(track("alice", &app.url("/item/a")))
        .await?
        .expect("first listing tracked");
    let second = app
        .product_manager
        .track_product(track("bob", &app.url("/item/b")))
        .await?
        .expect("second listing tracked");

    assert_eq!(first.product.id, second.product.id);
    assert_eq!(second.product.price, Decimal::from(2999));
    Ok(())
}

#[tokio::test]
async fn test_bounds_hold_across_cycles() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/fan", "Table Fan", "1000").await;
    let tracking = app
        .product_manager
        .track_product(track("alice", &app.url("/item/fan")))
        .await?
        .expect("fan should be tracked");

    for price in ["900", "1100", "950"] {
        reprice(&app, "/item/fan", "Table Fan", price).await;
        app.watch.run_check().await.expect("no check in flight");
        assert!(stored(&app, &tracking.product.id).await?.within_bounds());
    }

    let product = stored(&app, &tracking.product.id).await?;
    assert_eq!(product.price, Decimal::from(950));
    assert_eq!(product.previous_price, Decimal::from(1100));
    assert_eq!(product.lower, Decimal::from(900));
    assert_eq!(product.upper, Decimal::from(1100));
    Ok(())
}

#[tokio::test]
async fn test_slow_storefront_falls_back_to_lookup() -> anyhow::Result<()> {
    let app = TestApp::with_notifier(RecordingNotifier::default(), Duration::from_millis(200)).await?;
    Mock::given(method("GET"))
        .and(path("/item/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page("Slow Listing", "10"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": true, "code": "slow-listing"})),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/slow-listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(lookup_page("Air Purifier", "8,499")))
        .mount(&app.server)
        .await;

    let tracking = app
        .product_manager
        .track_product(track("alice", &app.url("/item/slow")))
        .await?
        .expect("fallback should supply the product");

    assert_eq!(tracking.product.name, "Air Purifier");
    assert_eq!(tracking.product.price, Decimal::from(8499));
    Ok(())
}

#[tokio::test]
async fn test_unreadable_page_is_not_tracked() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    Mock::given(method("GET"))
        .and(path("/item/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": false, "code": ""})),
        )
        .mount(&app.server)
        .await;

    let tracking = app
        .product_manager
        .track_product(track("alice", &app.url("/item/blank")))
        .await?;

    assert!(tracking.is_none());
    assert!(app.repository.find_tracked_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_vanished_page_is_skipped() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    app.stub_page("/item/kettle", "Electric Kettle", "1000").await;
    let tracking = app
        .product_manager
        .track_product(track("alice", &app.url("/item/kettle")))
        .await?
        .expect("kettle should be tracked");

    // Nothing mounted: the page 404s and the lookup is unreachable.
    app.reset_pages().await;
    let summary = app.watch.run_check().await.expect("no check in flight");

    assert_eq!(summary.skipped, 1);
    assert!(summary.changed.is_empty());
    let product = stored(&app, &tracking.product.id).await?;
    assert_eq!(product.price, Decimal::from(1000));
    assert_eq!(product.previous_price, Decimal::from(1000));
    Ok(())
}
