pub mod config;
pub mod doctor;
pub mod price;
pub mod rates;

use serde::Serialize;
use tidyquote_core::config::{AppConfig, LoadOptions};
use tidyquote_core::cpq::{RateCatalog, RateSnapshot};
use tidyquote_db::SeedCatalog;

/// Exit codes shared by the catalog-reading commands.
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_ARGUMENT: u8 = 3;
pub const EXIT_CATALOG: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Raw output for commands that render their own report.
    pub fn report(output: String) -> Self {
        Self { exit_code: 0, output }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Config plus the active rates the process would start with.
pub(crate) struct CatalogContext {
    pub config: AppConfig,
    pub catalog: RateCatalog,
}

impl CatalogContext {
    pub fn load(command: &str) -> Result<Self, CommandResult> {
        let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
            CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
        })?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        let stores = SeedCatalog::load(config.pricing.seed_catalog);
        Self { catalog: RateCatalog::new(stores.rates.clone()), config }
    }

    pub fn snapshot(&self, command: &str) -> Result<RateSnapshot, CommandResult> {
        self.catalog.snapshot().map_err(|error| {
            CommandResult::failure(command, "catalog_unavailable", error.to_string(), EXIT_CATALOG)
        })
    }
}

fn to_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult::report(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}
