use tidyquote_core::config::{AppConfig, ConfigError, LoadOptions};
use tidyquote_db::SeedCatalog;
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

/// Builds the stores and services for an already loaded config.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let stores = SeedCatalog::load(config.pricing.seed_catalog);
    let state = AppState::new(&stores, &config.pricing);
    info!(
        event_name = "system.bootstrap.stores_ready",
        correlation_id = "bootstrap",
        seeded = config.pricing.seed_catalog,
        currency = %config.pricing.currency,
        "in-memory stores initialized"
    );

    Ok(Application { config, state })
}
