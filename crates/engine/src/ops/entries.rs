use sea_orm::DatabaseTransaction;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    CreateEntryCmd, EngineError, EntryKind, LedgerEntry, Money, ResultEngine,
    store::LedgerStore,
    util::{ensure_amount, normalize_optional_text, normalize_required_text},
};

use super::{Engine, balances::BalanceGate, with_tx};

/// Result of posting an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EntryReceipt {
    pub entry_id: Uuid,
    /// `None` when the entry references no account.
    pub new_balance: Option<Money>,
}

impl Engine {
    /// Posts a transaction. Outgoing transactions must be covered by the
    /// account balance.
    pub async fn create_transaction(&self, cmd: CreateEntryCmd) -> ResultEngine<EntryReceipt> {
        let entry = build_entry(EntryKind::Transaction, cmd)?;
        self.create_entry(entry).await
    }

    /// Posts an expense. Expenses are always outgoing.
    pub async fn create_expense(&self, cmd: CreateEntryCmd) -> ResultEngine<EntryReceipt> {
        let entry = build_entry(EntryKind::Expense, cmd)?;
        self.create_entry(entry).await
    }

    async fn create_entry(&self, entry: LedgerEntry) -> ResultEngine<EntryReceipt> {
        let new_balance = with_tx!(self, "create_entry", |db_tx| self
            .create_entry_in(&db_tx, &entry)
            .await)?;
        tracing::info!(
            entry_id = %entry.id,
            kind = entry.kind.as_str(),
            account_id = ?entry.account_id,
            "entry posted"
        );
        Ok(EntryReceipt {
            entry_id: entry.id,
            new_balance,
        })
    }

    async fn create_entry_in(
        &self,
        db_tx: &DatabaseTransaction,
        entry: &LedgerEntry,
    ) -> ResultEngine<Option<Money>> {
        if let Some(account_id) = entry.account_id {
            let account = LedgerStore::new(db_tx)
                .owned_account(account_id, &entry.client_id)
                .await?;
            self.ensure_currency(&account, &entry.currency_id)?;
        }
        let change = self.post_entry(db_tx, entry, BalanceGate::Enforce).await?;
        Ok(change.map(|change| change.new_balance))
    }

    /// The client's entries of one kind, newest first.
    pub async fn entries(&self, client_id: &str, kind: EntryKind) -> ResultEngine<Vec<LedgerEntry>> {
        self.retry_read("entries", || {
            self.store().entries_for_client(client_id, kind)
        })
        .await
    }
}

fn build_entry(kind: EntryKind, cmd: CreateEntryCmd) -> ResultEngine<LedgerEntry> {
    ensure_amount(cmd.amount)?;
    let name = normalize_optional_text(cmd.name.as_deref());
    if kind == EntryKind::Transaction && name.is_none() {
        return Err(EngineError::Validation(
            "transaction name must not be empty".to_string(),
        ));
    }
    Ok(LedgerEntry {
        id: Uuid::new_v4(),
        client_id: normalize_required_text(&cmd.client_id, "client")?,
        account_id: cmd.account_id,
        kind,
        name,
        is_income: kind == EntryKind::Transaction && cmd.is_income,
        amount: cmd.amount,
        currency_id: normalize_required_text(&cmd.currency_id, "currency")?,
        category: normalize_required_text(&cmd.category, "category")?,
        remarks: normalize_optional_text(cmd.remarks.as_deref()),
        executed_at: cmd.executed_at,
    })
}
