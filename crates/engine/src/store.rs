//! Ledger Store: the only code that talks to the database.
//!
//! `LedgerStore` wraps any sea-orm connection, so the same queries run
//! standalone against the pool or inside a unit of work against a
//! `DatabaseTransaction`. It persists and retrieves; business rules live in
//! `ops`.
//!
//! Writes that depend on a prior read are compare-and-swap statements. When
//! the row moved in between, they fail with [`EngineError::Conflict`] and the
//! surrounding unit of work is re-run.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountKind, EngineError, EntryKind, FuturePayment, LedgerEntry, Money, ResultEngine,
    accounts, entries, future_payments,
};

/// A balance together with the version it was read at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BalanceSnapshot {
    pub balance: Money,
    pub version: i64,
}

pub(crate) struct LedgerStore<'c, C> {
    conn: &'c C,
}

// Only the reference is copied; `C` itself need not be `Copy`.
impl<C> Clone for LedgerStore<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for LedgerStore<'_, C> {}

impl<'c, C: ConnectionTrait> LedgerStore<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub(crate) async fn account(self, account_id: Uuid) -> ResultEngine<Option<Account>> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(self.conn)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Loads an account owned by `client_id`. Someone else's account is
    /// indistinguishable from a missing one.
    pub(crate) async fn owned_account(
        self,
        account_id: Uuid,
        client_id: &str,
    ) -> ResultEngine<Account> {
        match self.account(account_id).await? {
            Some(account) if account.client_id == client_id => Ok(account),
            _ => Err(EngineError::NotFound(format!("account {account_id}"))),
        }
    }

    pub(crate) async fn accounts_for_client(self, client_id: &str) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::ClientId.eq(client_id))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Name)
            .all(self.conn)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub(crate) async fn accounts_of_kind(
        self,
        client_id: &str,
        kind: AccountKind,
    ) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::ClientId.eq(client_id))
            .filter(accounts::Column::Kind.eq(kind.as_str()))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Name)
            .all(self.conn)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Rewrites currency and kind if the account is still at
    /// `expected_version`. Returns the version the account now has.
    pub(crate) async fn set_account_details(
        self,
        account_id: Uuid,
        expected_version: i64,
        currency_id: &str,
        kind: AccountKind,
    ) -> ResultEngine<i64> {
        let next_version = expected_version + 1;
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::CurrencyId, Expr::value(currency_id))
            .col_expr(accounts::Column::Kind, Expr::value(kind.as_str()))
            .col_expr(accounts::Column::Version, Expr::value(next_version))
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .filter(accounts::Column::Version.eq(expected_version))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "account {account_id} moved past version {expected_version}"
            )));
        }
        Ok(next_version)
    }

    /// Removes an account, provided it is still at the version it was read
    /// with.
    pub(crate) async fn delete_account(self, account: &Account) -> ResultEngine<()> {
        let result = accounts::Entity::delete_many()
            .filter(accounts::Column::Id.eq(account.id.to_string()))
            .filter(accounts::Column::ClientId.eq(account.client_id.as_str()))
            .filter(accounts::Column::Version.eq(account.version))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "account {} changed concurrently",
                account.id
            )));
        }
        Ok(())
    }

    pub(crate) async fn account_name_taken(self, client_id: &str, name: &str) -> ResultEngine<bool> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::ClientId.eq(client_id))
            .filter(accounts::Column::Name.eq(name))
            .one(self.conn)
            .await?;
        Ok(existing.is_some())
    }

    pub(crate) async fn insert_account(self, account: &Account) -> ResultEngine<()> {
        accounts::ActiveModel::from(account).insert(self.conn).await?;
        Ok(())
    }

    pub(crate) async fn get_balance(self, account_id: Uuid) -> ResultEngine<BalanceSnapshot> {
        let account = self
            .account(account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {account_id}")))?;
        Ok(BalanceSnapshot {
            balance: account.balance,
            version: account.version,
        })
    }

    /// Writes `new_balance` if the account is still at `expected_version`.
    ///
    /// The value is truncated to two decimals before it is stored. Returns
    /// the version the account now has.
    pub(crate) async fn set_balance(
        self,
        account_id: Uuid,
        expected_version: i64,
        new_balance: Money,
    ) -> ResultEngine<i64> {
        let next_version = expected_version + 1;
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::value(new_balance.to_stored_string()),
            )
            .col_expr(accounts::Column::Version, Expr::value(next_version))
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .filter(accounts::Column::Version.eq(expected_version))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "account {account_id} moved past version {expected_version}"
            )));
        }
        Ok(next_version)
    }

    pub(crate) async fn insert_ledger_entry(self, entry: &LedgerEntry) -> ResultEngine<Uuid> {
        entries::ActiveModel::from(entry).insert(self.conn).await?;
        Ok(entry.id)
    }

    /// Removes an entry owned by `client_id`.
    pub(crate) async fn delete_ledger_entry(self, entry_id: Uuid, client_id: &str) -> ResultEngine<()> {
        let result = entries::Entity::delete_many()
            .filter(entries::Column::Id.eq(entry_id.to_string()))
            .filter(entries::Column::ClientId.eq(client_id))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(format!("entry {entry_id}")));
        }
        Ok(())
    }

    /// Fetches an entry of the given kind owned by `client_id`, joined with
    /// the account it references (if any) in one query.
    pub(crate) async fn entry_with_account_balance(
        self,
        entry_id: Uuid,
        client_id: &str,
        kind: EntryKind,
    ) -> ResultEngine<(LedgerEntry, Option<Account>)> {
        let not_found = || EngineError::NotFound(format!("{} {entry_id}", kind.as_str()));
        let (entry, account) = entries::Entity::find_by_id(entry_id.to_string())
            .find_also_related(accounts::Entity)
            .one(self.conn)
            .await?
            .ok_or_else(not_found)?;
        if entry.client_id != client_id || entry.entry_kind != kind.as_str() {
            return Err(not_found());
        }
        let entry = LedgerEntry::try_from(entry)?;
        let account = account.map(Account::try_from).transpose()?;
        if entry.account_id.is_some() && account.is_none() {
            return Err(EngineError::NotFound(format!(
                "account of {} {entry_id}",
                kind.as_str()
            )));
        }
        Ok((entry, account))
    }

    /// Unlinks every entry of an account; the entries stay as history.
    pub(crate) async fn detach_entries(self, account_id: Uuid) -> ResultEngine<u64> {
        let result = entries::Entity::update_many()
            .col_expr(entries::Column::AccountId, Expr::value(Option::<String>::None))
            .filter(entries::Column::AccountId.eq(account_id.to_string()))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Entries of one kind, newest first.
    pub(crate) async fn entries_for_client(
        self,
        client_id: &str,
        kind: EntryKind,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        entries::Entity::find()
            .filter(entries::Column::ClientId.eq(client_id))
            .filter(entries::Column::EntryKind.eq(kind.as_str()))
            .order_by_desc(entries::Column::ExecutedAt)
            .order_by_asc(entries::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    pub(crate) async fn insert_future_payment(self, payment: &FuturePayment) -> ResultEngine<()> {
        future_payments::ActiveModel::from(payment)
            .insert(self.conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn replace_future_payment(self, payment: &FuturePayment) -> ResultEngine<()> {
        future_payments::ActiveModel::from(payment)
            .update(self.conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn future_payment(self, payment_id: Uuid) -> ResultEngine<Option<FuturePayment>> {
        future_payments::Entity::find_by_id(payment_id.to_string())
            .one(self.conn)
            .await?
            .map(FuturePayment::try_from)
            .transpose()
    }

    pub(crate) async fn owned_future_payment(
        self,
        payment_id: Uuid,
        client_id: &str,
    ) -> ResultEngine<FuturePayment> {
        match self.future_payment(payment_id).await? {
            Some(payment) if payment.client_id == client_id => Ok(payment),
            _ => Err(EngineError::NotFound(format!("future payment {payment_id}"))),
        }
    }

    pub(crate) async fn future_payments_for_client(
        self,
        client_id: &str,
    ) -> ResultEngine<Vec<FuturePayment>> {
        future_payments::Entity::find()
            .filter(future_payments::Column::ClientId.eq(client_id))
            .order_by_asc(future_payments::Column::ScheduledAt)
            .order_by_asc(future_payments::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(FuturePayment::try_from)
            .collect()
    }

    /// Every payment of every client with `scheduled_at <= as_of`, oldest
    /// first.
    pub(crate) async fn list_due_payments(
        self,
        as_of: DateTime<Utc>,
    ) -> ResultEngine<Vec<FuturePayment>> {
        future_payments::Entity::find()
            .filter(future_payments::Column::ScheduledAt.lte(as_of))
            .order_by_asc(future_payments::Column::ScheduledAt)
            .order_by_asc(future_payments::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(FuturePayment::try_from)
            .collect()
    }

    /// Moves a payment from the `scheduled_at` it was read with to `next`.
    pub(crate) async fn advance_schedule(
        self,
        payment: &FuturePayment,
        next: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let result = future_payments::Entity::update_many()
            .col_expr(future_payments::Column::ScheduledAt, Expr::value(next))
            .filter(future_payments::Column::Id.eq(payment.id.to_string()))
            .filter(future_payments::Column::ScheduledAt.eq(payment.scheduled_at))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "future payment {} was rescheduled concurrently",
                payment.id
            )));
        }
        Ok(())
    }

    /// Drops a one-off payment that was just applied, provided nobody moved
    /// it since it was read.
    pub(crate) async fn remove_applied_payment(self, payment: &FuturePayment) -> ResultEngine<()> {
        let result = future_payments::Entity::delete_many()
            .filter(future_payments::Column::Id.eq(payment.id.to_string()))
            .filter(future_payments::Column::ScheduledAt.eq(payment.scheduled_at))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "future payment {} changed concurrently",
                payment.id
            )));
        }
        Ok(())
    }

    pub(crate) async fn delete_payments_of_account(self, account_id: Uuid) -> ResultEngine<u64> {
        let result = future_payments::Entity::delete_many()
            .filter(future_payments::Column::AccountId.eq(account_id.to_string()))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub(crate) async fn delete_future_payment(
        self,
        payment_id: Uuid,
        client_id: &str,
    ) -> ResultEngine<()> {
        let result = future_payments::Entity::delete_many()
            .filter(future_payments::Column::Id.eq(payment_id.to_string()))
            .filter(future_payments::Column::ClientId.eq(client_id))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(format!("future payment {payment_id}")));
        }
        Ok(())
    }
}
