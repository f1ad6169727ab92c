//! Transfer Orchestrator: two balance moves and two ledger entries as one
//! unit of work.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, EngineError, EntryKind, LedgerEntry, ResultEngine, TransferCmd, store::LedgerStore,
    util::ensure_amount,
};

use super::{
    Engine,
    balances::{BalanceChange, BalanceGate},
    with_tx,
};

/// Category of both entries written by a transfer.
pub const TRANSFER_CATEGORY: &str = "bank-transfer";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub source: BalanceChange,
    pub target: BalanceChange,
    /// The outgoing entry on the source, then the incoming one on the target.
    pub entry_ids: [Uuid; 2],
}

impl Engine {
    /// Moves `cmd.amount` from the source account to the target account.
    ///
    /// The source must cover the amount. Both entries are dated at the
    /// start of the current day.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        if cmd.source_account_id == cmd.target_account_id {
            return Err(EngineError::Validation(
                "source and target accounts must differ".to_string(),
            ));
        }
        ensure_amount(cmd.amount)?;
        let receipt = with_tx!(self, "transfer", |db_tx| self
            .transfer_in(&db_tx, &cmd)
            .await)?;
        tracing::info!(
            source = %cmd.source_account_id,
            target = %cmd.target_account_id,
            amount = %cmd.amount,
            "transfer completed"
        );
        Ok(receipt)
    }

    async fn transfer_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &TransferCmd,
    ) -> ResultEngine<TransferReceipt> {
        let store = LedgerStore::new(db_tx);
        let source = store
            .owned_account(cmd.source_account_id, &cmd.client_id)
            .await?;
        let target = store
            .owned_account(cmd.target_account_id, &cmd.client_id)
            .await?;
        self.ensure_currency(&target, &source.currency_id)?;

        let executed_at = self.clock.today();
        let outgoing = transfer_entry(
            cmd,
            &source,
            format!("Transfer to {}", target.name),
            false,
            executed_at,
        );
        let incoming = transfer_entry(
            cmd,
            &target,
            format!("Received from {}", source.name),
            true,
            executed_at,
        );

        let source_change = self
            .post_entry(db_tx, &outgoing, BalanceGate::Enforce)
            .await?;
        let target_change = self
            .post_entry(db_tx, &incoming, BalanceGate::Enforce)
            .await?;
        match (source_change, target_change) {
            (Some(source), Some(target)) => Ok(TransferReceipt {
                source,
                target,
                entry_ids: [outgoing.id, incoming.id],
            }),
            _ => Err(EngineError::Validation(
                "transfer legs must reference accounts".to_string(),
            )),
        }
    }
}

fn transfer_entry(
    cmd: &TransferCmd,
    account: &Account,
    name: String,
    is_income: bool,
    executed_at: DateTime<Utc>,
) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        client_id: cmd.client_id.clone(),
        account_id: Some(account.id),
        kind: EntryKind::Transaction,
        name: Some(name),
        is_income,
        amount: cmd.amount,
        currency_id: account.currency_id.clone(),
        category: TRANSFER_CATEGORY.to_string(),
        remarks: None,
        executed_at,
    }
}
