//! Reversal Engine: deleting a posted entry, optionally undoing its balance
//! effect.

use sea_orm::DatabaseTransaction;

use crate::{
    DeleteEntryCmd, ResultEngine,
    store::{BalanceSnapshot, LedgerStore},
};

use super::{
    Engine,
    balances::{BalanceChange, BalanceGate},
    with_tx,
};

impl Engine {
    /// Deletes an entry owned by `cmd.client_id`.
    ///
    /// With `revert_balance`, the inverse of the entry's signed amount is
    /// applied to its account in the same unit of work. Reversals are never
    /// gated on the balance. Returns the balance transition, if any.
    pub async fn delete_entry(&self, cmd: DeleteEntryCmd) -> ResultEngine<Option<BalanceChange>> {
        let change = with_tx!(self, "delete_entry", |db_tx| self
            .reverse_and_delete(&db_tx, &cmd)
            .await)?;
        tracing::info!(
            entry_id = %cmd.entry_id,
            reverted = change.is_some(),
            "entry deleted"
        );
        Ok(change)
    }

    async fn reverse_and_delete(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &DeleteEntryCmd,
    ) -> ResultEngine<Option<BalanceChange>> {
        let store = LedgerStore::new(db_tx);
        let (entry, account) = store
            .entry_with_account_balance(cmd.entry_id, &cmd.client_id, cmd.kind)
            .await?;
        let change = match account {
            Some(account) if cmd.revert_balance => {
                let snapshot = BalanceSnapshot {
                    balance: account.balance,
                    version: account.version,
                };
                let change = self
                    .apply_to_snapshot(
                        db_tx,
                        account.id,
                        snapshot,
                        entry.amount,
                        !entry.is_income,
                        BalanceGate::AllowNegative,
                    )
                    .await?;
                Some(change)
            }
            _ => None,
        };
        store.delete_ledger_entry(entry.id, &cmd.client_id).await?;
        Ok(change)
    }
}
