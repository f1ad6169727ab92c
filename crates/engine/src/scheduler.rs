//! Future-Payment Scheduler.
//!
//! A single background loop that wakes on a fixed interval and applies every
//! due payment through [`Engine::execute_future_payment`]. Only one scheduler
//! should run against a database; a second one cannot double-apply a payment
//! (each application is a compare-and-swap on `scheduled_at`), but the two
//! would race for the same work.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use tokio::{sync::watch, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{Clock, Engine, EngineError, PaymentOutcome, ResultEngine};

/// What a pass does after a payment fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Record the failure and keep going with the next due payment.
    #[default]
    ContinueOnError,
    /// Stop the pass at the first failure; the rest waits for the next tick.
    FailFast,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub error_policy: ErrorPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            error_policy: ErrorPolicy::default(),
        }
    }
}

/// Summary of one pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Payments applied, in the order they were applied.
    pub applied: Vec<Uuid>,
    /// Payments that were due but no longer were once looked at.
    pub skipped: Vec<Uuid>,
    pub failed: Vec<(Uuid, EngineError)>,
    /// Set when a fail-fast pass stopped before reaching every due payment.
    pub aborted: bool,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct Scheduler {
    engine: Arc<Engine>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Fails with `Validation` when `config.interval` is zero.
    pub fn new(
        engine: Arc<Engine>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> ResultEngine<Self> {
        if config.interval.is_zero() {
            return Err(EngineError::Validation(
                "scheduler interval must be positive".to_string(),
            ));
        }
        Ok(Self {
            engine,
            clock,
            config,
        })
    }

    /// Applies every payment due now, oldest first.
    ///
    /// Only the due-payment query can fail the whole pass; per-payment
    /// failures land in the report.
    pub async fn run_once(&self) -> ResultEngine<PassReport> {
        let now = self.clock.now();
        let due = self.engine.due_future_payments(now).await?;
        tracing::debug!(count = due.len(), %now, "scheduler pass started");

        let mut report = PassReport::default();
        for payment in &due {
            match self.engine.execute_future_payment(payment.id, now).await {
                Ok(PaymentOutcome::Skipped) => report.skipped.push(payment.id),
                Ok(_) => report.applied.push(payment.id),
                Err(err) => {
                    tracing::warn!(payment_id = %payment.id, error = %err, "future payment failed");
                    report.failed.push((payment.id, err));
                    if self.config.error_policy == ErrorPolicy::FailFast {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }
        tracing::info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "scheduler pass finished"
        );
        Ok(report)
    }

    /// Runs a pass right away, then one per interval, until `shutdown`
    /// turns `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval = ?self.config.interval, policy = ?self.config.error_policy, "scheduler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.run_once().await {
                        tracing::error!(error = %err, "scheduler pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("scheduler stopped");
    }
}
