//! Settings of the application, read from an optional `settings.toml` and
//! overridden by `TALLY__*` environment variables
//! (e.g. `TALLY__SERVER__PORT=8080`).

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use engine::{CurrencyPolicy, EngineConfig, ErrorPolicy, ScheduledBalanceCheck, SchedulerConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Engine policies; every field falls back to the engine default.
#[derive(Debug, Default, Deserialize)]
pub struct Engine {
    pub storage_timeout_ms: Option<u64>,
    pub conflict_retries: Option<u32>,
    pub read_retries: Option<u32>,
    #[serde(default)]
    pub currency_policy: CurrencyPolicy,
    #[serde(default)]
    pub scheduled_balance_check: ScheduledBalanceCheck,
}

impl Engine {
    pub fn to_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            storage_timeout: self
                .storage_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.storage_timeout),
            conflict_retries: self.conflict_retries.unwrap_or(defaults.conflict_retries),
            read_retries: self.read_retries.unwrap_or(defaults.read_retries),
            currency_policy: self.currency_policy,
            scheduled_balance_check: self.scheduled_balance_check,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Scheduler {
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl Scheduler {
    pub fn to_config(&self) -> SchedulerConfig {
        let defaults = SchedulerConfig::default();
        SchedulerConfig {
            interval: self
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            error_policy: self.error_policy,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub engine: Engine,
    /// The scheduler only runs when this section is present.
    pub scheduler: Option<Scheduler>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
