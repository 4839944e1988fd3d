// Shared harness: an in-memory database, storefront pages and the lookup service
// served by wiremock, and a notifier that records what it was asked to send.

pub mod api_tests;
pub mod cycle_tests;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use price_sentinel::{
    config::DatabaseConfig,
    coordinator::ExtractionCoordinator,
    notifications::NotificationFanout,
    plugins::extractors::{FlipkartExtractor, GenericExtractor},
    plugins::traits::{NotificationResult, NotifierPlugin},
    plugins::PluginManager,
    price_check::PriceCheckCycle,
    product_manager::ProductManager,
    repository::{PriceRepository, SqliteRepository},
    scheduler::PriceWatch,
    web::{create_router, AppState},
};

pub const TRIGGER_TOKEN: &str = "test-trigger-token";

/// Captures every delivery instead of sending it anywhere.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing_watcher: Option<String>,
}

impl RecordingNotifier {
    pub fn failing_for(watcher_id: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_watcher: Some(watcher_id.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording Notifier"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    async fn notify(&self, watcher_id: &str, message: &str) -> price_sentinel::Result<NotificationResult> {
        if self.failing_watcher.as_deref() == Some(watcher_id) {
            return Ok(NotificationResult::failed("chat not found"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((watcher_id.to_string(), message.to_string()));
        Ok(NotificationResult::delivered(None))
    }

    async fn test_connection(&self) -> price_sentinel::Result<bool> {
        Ok(true)
    }
}

pub struct TestApp {
    pub server: MockServer,
    pub repository: Arc<dyn PriceRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub product_manager: Arc<ProductManager>,
    pub watch: Arc<PriceWatch>,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        Self::with_notifier(RecordingNotifier::default(), Duration::from_secs(2)).await
    }

    /// `primary_timeout` bounds the storefront fetch; the fallback always gets two seconds.
    pub async fn with_notifier(
        notifier: RecordingNotifier,
        primary_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let server = MockServer::start().await;
        let repository: Arc<dyn PriceRepository> = Arc::new(test_repository().await?);

        // Loopback URLs classify into the Flipkart bucket, so the Flipkart strategy
        // reads the stub pages directly.
        let plugins = PluginManager::new();
        plugins
            .register_extractor(Arc::new(FlipkartExtractor::new(primary_timeout)?))
            .await;
        plugins
            .register_extractor(Arc::new(GenericExtractor::with_price_history(
                &server.uri(),
                Duration::from_secs(2),
            )?))
            .await;

        let notifier = Arc::new(notifier);
        let extractor = Arc::new(ExtractionCoordinator::new(plugins));
        let product_manager = Arc::new(ProductManager::new(repository.clone(), extractor.clone()));
        let cycle = PriceCheckCycle::new(repository.clone(), extractor, Duration::ZERO);
        let fanout = NotificationFanout::new(repository.clone(), notifier.clone(), "₹");
        let watch = Arc::new(PriceWatch::new(cycle, fanout));

        Ok(Self {
            server,
            repository,
            notifier,
            product_manager,
            watch,
        })
    }

    pub fn url(&self, page: &str) -> String {
        format!("{}{}", self.server.uri(), page)
    }

    /// Serves a storefront page at `page` listing `title` at `price`.
    pub async fn stub_page(&self, page: &str, title: &str, price: &str) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string(product_page(title, price)))
            .mount(&self.server)
            .await;
    }

    /// Drops every stub so prices can be changed between cycles.
    pub async fn reset_pages(&self) {
        self.server.reset().await;
    }

    pub fn state(&self, trigger_token: Option<&str>) -> AppState {
        AppState::new(
            self.product_manager.clone(),
            self.watch.clone(),
            trigger_token.map(str::to_string),
        )
    }

    pub fn router(&self) -> Router {
        create_router(self.state(Some(TRIGGER_TOKEN)))
    }
}

pub fn product_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body><h1><span>{}</span></h1><div id="container"><div class="Nx9bqj CxhGGd">₹{}</div></div></body></html>"#,
        title, price
    )
}

pub fn lookup_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
          <div id="product-info"><table><tr><th>Product Name</th><td>{}</td></tr></table></div>
          <div id="price-table"><table><tr><th>Price</th><td>₹{}</td></tr></table></div>
        </body></html>"#,
        title, price
    )
}

pub async fn test_repository() -> anyhow::Result<SqliteRepository> {
    // One connection: every in-memory connection would otherwise see its own database.
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        acquire_timeout: 5,
    };
    Ok(SqliteRepository::connect(&config).await?)
}

pub async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> anyhow::Result<Response> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("x-trigger-token", token);
    }

    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    Ok(app.clone().oneshot(request).await?)
}

pub async fn body_json(response: Response) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
