//! Balance Mutator: the only path by which an account balance changes.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, CurrencyPolicy, EngineError, LedgerEntry, Money, ResultEngine, money::STORED_SCALE,
    store::{BalanceSnapshot, LedgerStore},
};

use super::Engine;

/// One balance transition, as persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceChange {
    pub account_id: Uuid,
    pub old_balance: Money,
    pub new_balance: Money,
}

/// Whether an outgoing mutation must be covered by the current balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BalanceGate {
    Enforce,
    AllowNegative,
}

/// Fails when `amount` exceeds `balance`. Both values are compared as they
/// are, before any truncation.
pub(crate) fn ensure_sufficient(balance: Money, amount: Money) -> ResultEngine<()> {
    if amount > balance {
        return Err(EngineError::InsufficientBalance(format!(
            "balance {balance} cannot cover {amount}"
        )));
    }
    Ok(())
}

/// `current ± amount`, truncated to the stored scale.
pub(crate) fn next_balance(current: Money, amount: Money, is_income: bool) -> ResultEngine<Money> {
    let next = if is_income {
        current.checked_add(amount)
    } else {
        current.checked_sub(amount)
    };
    next.map(|value| value.truncate(STORED_SCALE))
        .ok_or_else(|| EngineError::Validation("amount too large".to_string()))
}

impl Engine {
    pub(crate) fn ensure_currency(&self, account: &Account, currency_id: &str) -> ResultEngine<()> {
        match self.config.currency_policy {
            CurrencyPolicy::IgnoreCurrency => Ok(()),
            CurrencyPolicy::SameCurrencyOnly if account.currency_id == currency_id => Ok(()),
            CurrencyPolicy::SameCurrencyOnly => Err(EngineError::CurrencyMismatch(format!(
                "account {} holds {}, got {currency_id}",
                account.id, account.currency_id
            ))),
        }
    }

    /// Moves the balance of `account_id` by `amount` in the given direction.
    ///
    /// No account means no balance effect. The write is a compare-and-swap
    /// on the version read here.
    pub(crate) async fn apply_entry(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Option<Uuid>,
        amount: Money,
        is_income: bool,
        gate: BalanceGate,
    ) -> ResultEngine<Option<BalanceChange>> {
        let Some(account_id) = account_id else {
            return Ok(None);
        };
        let snapshot = LedgerStore::new(db_tx).get_balance(account_id).await?;
        self.apply_to_snapshot(db_tx, account_id, snapshot, amount, is_income, gate)
            .await
            .map(Some)
    }

    /// Same as [`Engine::apply_entry`] for a balance the caller already read
    /// in this unit of work.
    pub(crate) async fn apply_to_snapshot(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        snapshot: BalanceSnapshot,
        amount: Money,
        is_income: bool,
        gate: BalanceGate,
    ) -> ResultEngine<BalanceChange> {
        if !is_income && gate == BalanceGate::Enforce {
            ensure_sufficient(snapshot.balance, amount)?;
        }
        let new_balance = next_balance(snapshot.balance, amount, is_income)?;
        LedgerStore::new(db_tx)
            .set_balance(account_id, snapshot.version, new_balance)
            .await?;
        tracing::debug!(
            "balance for {account_id} goes from {} to {new_balance}",
            snapshot.balance
        );
        Ok(BalanceChange {
            account_id,
            old_balance: snapshot.balance,
            new_balance,
        })
    }

    /// Applies the balance effect of `entry` and inserts it, in that order,
    /// inside the caller's unit of work.
    pub(crate) async fn post_entry(
        &self,
        db_tx: &DatabaseTransaction,
        entry: &LedgerEntry,
        gate: BalanceGate,
    ) -> ResultEngine<Option<BalanceChange>> {
        let change = self
            .apply_entry(db_tx, entry.account_id, entry.amount, entry.is_income, gate)
            .await?;
        LedgerStore::new(db_tx).insert_ledger_entry(entry).await?;
        Ok(change)
    }
}
