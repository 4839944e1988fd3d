use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use price_sentinel::config::LoggingConfig;
use price_sentinel::coordinator::ExtractionCoordinator;
use price_sentinel::notifications::NotificationFanout;
use price_sentinel::plugins::PluginManager;
use price_sentinel::price_check::PriceCheckCycle;
use price_sentinel::product_manager::ProductManager;
use price_sentinel::repository::{PriceRepository, SqliteRepository};
use price_sentinel::scheduler::{PriceScheduler, PriceWatch};
use price_sentinel::web::{self, AppState};
use price_sentinel::{telemetry, AppConfig};

#[derive(Parser)]
#[command(name = "price-sentinel", version, about = "Tracks storefront prices and alerts watchers")]
struct Cli {
    /// Directory holding default.toml and the optional per-mode overrides
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve the HTTP API and run the cron trigger if enabled
    Serve,
    /// Run a single price check and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_dir(&cli.config_dir)
        .with_context(|| format!("failed to load configuration from {}", cli.config_dir.display()))?;
    let _log_guard = init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting price sentinel");

    if config.metrics.enabled {
        telemetry::install(&config.metrics)?;
    }

    let repository: Arc<dyn PriceRepository> = Arc::new(
        SqliteRepository::connect(&config.database)
            .await
            .context("failed to open database")?,
    );

    let plugins = PluginManager::new();
    let notifier_type = plugins
        .initialize_default_plugins(&config.scraper, &config.notifications)
        .await?;
    let notifier = plugins.notifier(&notifier_type).await?;
    match notifier.test_connection().await {
        Ok(true) => info!(notifier = %notifier_type, "Plugins initialized"),
        Ok(false) => warn!(notifier = %notifier_type, "Notifier rejected its credentials, alerts will fail"),
        Err(e) => warn!(notifier = %notifier_type, error = %e, "Notifier connection check failed"),
    }

    let extractor = Arc::new(ExtractionCoordinator::new(plugins));
    let product_manager = Arc::new(ProductManager::new(repository.clone(), extractor.clone()));
    let cycle = PriceCheckCycle::new(
        repository.clone(),
        extractor,
        config.scraper.inter_request_delay(),
    );
    let fanout = NotificationFanout::new(
        repository,
        notifier,
        config.notifications.currency_symbol.clone(),
    );
    let watch = Arc::new(PriceWatch::new(cycle, fanout));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Check => {
            let summary = watch
                .run_check()
                .await
                .context("a price check is already running")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Serve => serve(config, product_manager, watch).await?,
    }

    info!("Shutting down...");
    Ok(())
}

async fn serve(
    config: AppConfig,
    product_manager: Arc<ProductManager>,
    watch: Arc<PriceWatch>,
) -> Result<()> {
    let mut scheduler = if config.scheduler.enabled {
        let mut scheduler = PriceScheduler::new(watch.clone(), config.scheduler.clone()).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        info!("Cron trigger disabled, checks run only on HTTP triggers");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    let state = AppState::new(product_manager, watch, config.server.trigger_token.clone());

    web::serve(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("price_sentinel=info"))
    };

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter()?)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter()?).init();
            Ok(None)
        }
    }
}
