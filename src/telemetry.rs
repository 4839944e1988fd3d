use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

use crate::config::MetricsConfig;
use crate::utils::{AppError, Result};

/// Installs the Prometheus recorder with its own scrape listener on `config.port`.
pub fn install(config: &MetricsConfig) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::Internal(format!("failed to install metrics exporter: {}", e)))?;

    describe();
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

fn describe() {
    describe_counter!("price_checks_total", "Products checked by the price cycle");
    describe_counter!("price_changes_total", "Observed price changes");
    describe_counter!(
        "extraction_fallbacks_total",
        "Extractions that fell back to the generic strategy"
    );
    describe_counter!("notifications_sent_total", "Alerts delivered to watchers");
    describe_counter!("notifications_failed_total", "Alerts that could not be delivered");
}

pub fn price_checked() {
    counter!("price_checks_total").increment(1);
}

pub fn price_changed() {
    counter!("price_changes_total").increment(1);
}

pub fn extraction_fell_back() {
    counter!("extraction_fallbacks_total").increment(1);
}

pub fn notifications(sent: u64, failed: u64) {
    counter!("notifications_sent_total").increment(sent);
    counter!("notifications_failed_total").increment(failed);
}
