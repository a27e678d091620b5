pub mod api; // HTTP intake surface
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod notify; // Telegram delivery + order fan-out
pub mod pipeline; // intake normalizer + order confirmation
pub mod registry; // reference data + resolver
pub mod reminders; // daily due-tomorrow sweep

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::CoreState;
use crate::db::Database;
use crate::notify::TelegramTransport;
use crate::pipeline::intake::ChatCompletionClient;
use crate::registry::Registry;
use crate::reminders::{start_reminder_scheduler, ReminderScheduler, SystemClock};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("Registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let db = Database::initialize(&config.db_path)?;
    tracing::info!(path = %db.path().display(), "Order database ready");

    let registry = Arc::new(Registry::load(&config.registry_path)?);
    let transport = Arc::new(TelegramTransport::new(&config.bot_token)?);
    let extractor = Arc::new(ChatCompletionClient::new(
        &config.extraction_base_url,
        &config.extraction_api_key,
        &config.extraction_model,
        config.extraction_timeout_secs,
    )?);
    tracing::info!(model = extractor.model(), "Extraction client configured");
    let clock = Arc::new(SystemClock);

    let scheduler = start_reminder_scheduler(ReminderScheduler {
        db: db.clone(),
        registry: registry.clone(),
        transport: transport.clone(),
        clock: clock.clone(),
        window: config.reminder_window,
        interval: config.reminder_interval,
    });

    let core = Arc::new(CoreState::new(db, registry, extractor, transport, clock));

    // The blocking reqwest clients inside `core` must be dropped outside
    // the runtime, so the runtime gets a clone and `core` outlives it.
    let runtime = tokio::runtime::Runtime::new()?;
    let served = runtime.block_on(api::serve(core.clone(), config.http_bind, shutdown_signal()));
    drop(runtime);

    drop(scheduler);
    drop(core);
    tracing::info!("{} stopped", config::APP_NAME);
    served.map_err(StartupError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown requested");
}
