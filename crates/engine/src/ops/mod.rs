use std::{future::Future, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{Clock, EngineConfig, EngineError, ResultEngine, SystemClock, store::LedgerStore};

mod accounts;
mod balances;
mod entries;
mod future_payments;
mod reversal;
mod transfer;

pub use accounts::{ADJUSTMENT_CATEGORY, AccountRemoval};
pub use balances::BalanceChange;
pub use entries::EntryReceipt;
pub use transfer::{TRANSFER_CATEGORY, TransferReceipt};

/// Run a block as one unit of work.
///
/// The block gets a fresh `DatabaseTransaction` on every attempt. It is
/// committed when the block returns `Ok`, and dropped (rolled back)
/// otherwise. A [`EngineError::Conflict`] re-runs the block up to
/// `conflict_retries` times. The whole loop is bounded by `storage_timeout`.
macro_rules! with_tx {
    ($self:expr, $op:literal, |$tx:ident| $body:expr) => {{
        let engine: &$crate::Engine = $self;
        let unit_of_work = async {
            let mut attempt: u32 = 0;
            loop {
                let $tx = match sea_orm::TransactionTrait::begin(&engine.database).await {
                    Ok(tx) => tx,
                    Err(err) => break Err($crate::EngineError::from(err)),
                };
                let result: $crate::ResultEngine<_> = $body;
                match result {
                    Ok(value) => match $tx.commit().await {
                        Ok(()) => break Ok(value),
                        Err(err) => break Err($crate::EngineError::from(err)),
                    },
                    Err($crate::EngineError::Conflict(reason))
                        if attempt < engine.config.conflict_retries =>
                    {
                        attempt += 1;
                        tracing::debug!(op = $op, attempt, %reason, "retrying unit of work");
                        if let Err(err) = $tx.rollback().await {
                            break Err($crate::EngineError::from(err));
                        }
                    }
                    Err(err) => break Err(err),
                }
            }
        };
        let result = match tokio::time::timeout(engine.config.storage_timeout, unit_of_work).await {
            Ok(result) => result,
            Err(_) => Err($crate::EngineError::Timeout(engine.config.storage_timeout)),
        };
        if let Err(err) = &result {
            if err.is_storage() {
                tracing::error!(op = $op, error = %err, "unit of work failed");
            }
        }
        result
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Holds the database handle and the runtime policies. Cheap to share behind
/// an `Arc`; every operation is `&self`.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn store(&self) -> LedgerStore<'_, DatabaseConnection> {
        LedgerStore::new(&self.database)
    }

    /// Runs a read outside any unit of work, repeating it on storage errors.
    async fn retry_read<T, F, Fut>(&self, op: &'static str, mut read: F) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let outcome = match tokio::time::timeout(self.config.storage_timeout, read()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(EngineError::Timeout(self.config.storage_timeout)),
            };
            match outcome {
                Err(err) if err.is_storage() && attempt < self.config.read_retries => {
                    attempt += 1;
                    tracing::warn!(op, attempt, error = %err, "retrying read");
                }
                Err(err) => {
                    if err.is_storage() {
                        tracing::error!(op, error = %err, "read failed");
                    }
                    return Err(err);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Time source for validations and due checks. Defaults to the wall clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.config.storage_timeout.is_zero() {
            return Err(EngineError::Validation(
                "storage_timeout must be positive".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            config: self.config,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}
