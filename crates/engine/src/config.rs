//! Runtime policies of the engine.

use std::time::Duration;

use serde::Deserialize;

/// How accounts with different currencies interact.
///
/// No exchange rates are ever applied inside the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyPolicy {
    /// Reject transfers between, and entries/payments against, accounts of
    /// another currency.
    #[default]
    SameCurrencyOnly,
    /// Move the raw amount regardless of currency.
    IgnoreCurrency,
}

/// Whether executing a scheduled payment may drive a balance negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledBalanceCheck {
    #[default]
    AllowNegative,
    Enforce,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Upper bound for a single unit of work, retries included.
    pub storage_timeout: Duration,
    /// How many times a unit of work is re-run after a version conflict.
    pub conflict_retries: u32,
    /// How many times a standalone read is repeated after a storage error.
    pub read_retries: u32,
    pub currency_policy: CurrencyPolicy,
    pub scheduled_balance_check: ScheduledBalanceCheck,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_secs(5),
            conflict_retries: 3,
            read_retries: 2,
            currency_policy: CurrencyPolicy::default(),
            scheduled_balance_check: ScheduledBalanceCheck::default(),
        }
    }
}
