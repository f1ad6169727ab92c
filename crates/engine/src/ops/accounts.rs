use sea_orm::DatabaseTransaction;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, AccountKind, CreateAccountCmd, EngineError, EntryKind, LedgerEntry, ResultEngine,
    UpdateAccountCmd,
    money::STORED_SCALE,
    store::LedgerStore,
    util::normalize_required_text,
};

use super::{Engine, balances::BalanceGate, with_tx};

/// Category of the entry written when a balance is set by hand.
pub const ADJUSTMENT_CATEGORY: &str = "balance-adjustment";

/// What went with a deleted account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountRemoval {
    pub account_id: Uuid,
    /// Entries kept as history with no account.
    pub detached_entries: u64,
    pub removed_payments: u64,
}

impl Engine {
    /// Opens an account. Names are unique per client.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_text(&cmd.name, "account name")?;
        let currency_id = normalize_required_text(&cmd.currency_id, "currency")?;
        let client_id = normalize_required_text(&cmd.client_id, "client")?;
        let account = Account::new(
            client_id,
            name,
            currency_id,
            cmd.kind,
            cmd.opening_balance.truncate(STORED_SCALE),
            self.clock.now(),
        );
        with_tx!(self, "create_account", |db_tx| self
            .insert_account_in(&db_tx, &account)
            .await)?;
        tracing::info!(account_id = %account.id, client_id = %account.client_id, "account created");
        Ok(account)
    }

    async fn insert_account_in(
        &self,
        db_tx: &DatabaseTransaction,
        account: &Account,
    ) -> ResultEngine<()> {
        let store = LedgerStore::new(db_tx);
        if store
            .account_name_taken(&account.client_id, &account.name)
            .await?
        {
            return Err(EngineError::Validation(format!(
                "account {} already exists",
                account.name
            )));
        }
        store.insert_account(account).await
    }

    /// Changes currency, kind or balance of one of the client's accounts.
    ///
    /// A new balance is reached by posting an adjustment transaction for the
    /// difference, so the ledger explains it. The adjustment may take the
    /// balance below zero.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<Account> {
        let currency_id = cmd
            .currency_id
            .as_deref()
            .map(|currency| normalize_required_text(currency, "currency"))
            .transpose()?;
        let account = with_tx!(self, "update_account", |db_tx| self
            .update_account_in(&db_tx, &cmd, currency_id.as_deref())
            .await)?;
        tracing::info!(account_id = %account.id, balance = %account.balance, "account updated");
        Ok(account)
    }

    async fn update_account_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &UpdateAccountCmd,
        currency_id: Option<&str>,
    ) -> ResultEngine<Account> {
        let store = LedgerStore::new(db_tx);
        let account = store.owned_account(cmd.account_id, &cmd.client_id).await?;

        let currency_id = currency_id.unwrap_or(account.currency_id.as_str());
        let kind = cmd.kind.unwrap_or(account.kind);
        if currency_id != account.currency_id || kind != account.kind {
            store
                .set_account_details(account.id, account.version, currency_id, kind)
                .await?;
        }

        if let Some(target) = cmd.balance {
            let delta = target
                .truncate(STORED_SCALE)
                .checked_sub(account.balance)
                .ok_or_else(|| EngineError::Validation("balance too large".to_string()))?;
            if !delta.is_zero() {
                let adjustment = LedgerEntry {
                    id: Uuid::new_v4(),
                    client_id: account.client_id.clone(),
                    account_id: Some(account.id),
                    kind: EntryKind::Transaction,
                    name: Some("Balance adjustment".to_string()),
                    is_income: delta.is_positive(),
                    amount: if delta.is_negative() { -delta } else { delta },
                    currency_id: currency_id.to_string(),
                    category: ADJUSTMENT_CATEGORY.to_string(),
                    remarks: None,
                    executed_at: self.clock.now(),
                };
                self.post_entry(db_tx, &adjustment, BalanceGate::AllowNegative)
                    .await?;
            }
        }

        store.owned_account(account.id, &account.client_id).await
    }

    /// Deletes one of the client's accounts with its future payments.
    ///
    /// Entries of the account stay in the ledger without an account.
    pub async fn delete_account(
        &self,
        account_id: Uuid,
        client_id: &str,
    ) -> ResultEngine<AccountRemoval> {
        let removal = with_tx!(self, "delete_account", |db_tx| self
            .delete_account_in(&db_tx, account_id, client_id)
            .await)?;
        tracing::info!(
            %account_id,
            detached_entries = removal.detached_entries,
            removed_payments = removal.removed_payments,
            "account deleted"
        );
        Ok(removal)
    }

    async fn delete_account_in(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        client_id: &str,
    ) -> ResultEngine<AccountRemoval> {
        let store = LedgerStore::new(db_tx);
        let account = store.owned_account(account_id, client_id).await?;
        let detached_entries = store.detach_entries(account.id).await?;
        let removed_payments = store.delete_payments_of_account(account.id).await?;
        store.delete_account(&account).await?;
        Ok(AccountRemoval {
            account_id: account.id,
            detached_entries,
            removed_payments,
        })
    }

    /// Fetches one of the client's accounts.
    pub async fn account(&self, account_id: Uuid, client_id: &str) -> ResultEngine<Account> {
        self.retry_read("account", || {
            self.store().owned_account(account_id, client_id)
        })
        .await
    }

    pub async fn accounts(&self, client_id: &str) -> ResultEngine<Vec<Account>> {
        self.retry_read("accounts", || self.store().accounts_for_client(client_id))
            .await
    }

    pub async fn accounts_by_kind(
        &self,
        client_id: &str,
        kind: AccountKind,
    ) -> ResultEngine<Vec<Account>> {
        self.retry_read("accounts_by_kind", || {
            self.store().accounts_of_kind(client_id, kind)
        })
        .await
    }
}
