//! Command structs for engine operations.
//!
//! These types group parameters for write operations (accounts, entries,
//! transfers, future payments), keeping call sites readable and avoiding
//! long argument lists. They arrive already decoded; the engine still
//! validates amounts, names and ownership.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, EntryKind, Frequency, Money};

/// Open a new account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub client_id: String,
    pub name: String,
    pub currency_id: String,
    pub kind: AccountKind,
    pub opening_balance: Money,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        name: impl Into<String>,
        currency_id: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            currency_id: currency_id.into(),
            kind,
            opening_balance: Money::ZERO,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, balance: Money) -> Self {
        self.opening_balance = balance;
        self
    }
}

/// Change an account's balance, currency or kind.
///
/// A new balance is reached through an adjustment entry for the difference,
/// never written directly.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub client_id: String,
    pub account_id: Uuid,
    pub balance: Option<Money>,
    pub currency_id: Option<String>,
    pub kind: Option<AccountKind>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(client_id: impl Into<String>, account_id: Uuid) -> Self {
        Self {
            client_id: client_id.into(),
            account_id,
            balance: None,
            currency_id: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn balance(mut self, balance: Money) -> Self {
        self.balance = Some(balance);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency_id: impl Into<String>) -> Self {
        self.currency_id = Some(currency_id.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Post a transaction or an expense.
///
/// Expenses ignore `is_income` and are always outgoing.
#[derive(Clone, Debug)]
pub struct CreateEntryCmd {
    pub client_id: String,
    pub account_id: Option<Uuid>,
    pub name: Option<String>,
    pub amount: Money,
    pub is_income: bool,
    pub currency_id: String,
    pub category: String,
    pub remarks: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl CreateEntryCmd {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        amount: Money,
        currency_id: impl Into<String>,
        category: impl Into<String>,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            account_id: None,
            name: None,
            amount,
            is_income: false,
            currency_id: currency_id.into(),
            category: category.into(),
            remarks: None,
            executed_at,
        }
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn income(mut self, is_income: bool) -> Self {
        self.is_income = is_income;
        self
    }

    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// Delete a posted entry, optionally undoing its balance effect.
#[derive(Clone, Debug)]
pub struct DeleteEntryCmd {
    pub client_id: String,
    pub entry_id: Uuid,
    pub kind: EntryKind,
    pub revert_balance: bool,
}

impl DeleteEntryCmd {
    #[must_use]
    pub fn new(client_id: impl Into<String>, entry_id: Uuid, kind: EntryKind) -> Self {
        Self {
            client_id: client_id.into(),
            entry_id,
            kind,
            revert_balance: false,
        }
    }

    #[must_use]
    pub fn revert_balance(mut self, revert: bool) -> Self {
        self.revert_balance = revert;
        self
    }
}

/// Move money between two accounts of the same client.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub client_id: String,
    pub source_account_id: Uuid,
    pub target_account_id: Uuid,
    pub amount: Money,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        source_account_id: Uuid,
        target_account_id: Uuid,
        amount: Money,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            source_account_id,
            target_account_id,
            amount,
        }
    }
}

/// Schedule a payment.
#[derive(Clone, Debug)]
pub struct CreateFuturePaymentCmd {
    pub client_id: String,
    pub account_id: Uuid,
    pub name: String,
    pub amount: Money,
    pub is_income: bool,
    pub is_rolling: bool,
    pub frequency: Option<Frequency>,
    pub currency_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub remarks: Option<String>,
}

impl CreateFuturePaymentCmd {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        account_id: Uuid,
        name: impl Into<String>,
        amount: Money,
        currency_id: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            account_id,
            name: name.into(),
            amount,
            is_income: false,
            is_rolling: false,
            frequency: None,
            currency_id: currency_id.into(),
            scheduled_at,
            remarks: None,
        }
    }

    #[must_use]
    pub fn income(mut self, is_income: bool) -> Self {
        self.is_income = is_income;
        self
    }

    /// Makes the payment recur every `frequency`.
    #[must_use]
    pub fn rolling(mut self, frequency: Frequency) -> Self {
        self.is_rolling = true;
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// Replace every mutable field of a scheduled payment.
#[derive(Clone, Debug)]
pub struct UpdateFuturePaymentCmd {
    pub payment_id: Uuid,
    pub fields: CreateFuturePaymentCmd,
}

impl UpdateFuturePaymentCmd {
    #[must_use]
    pub fn new(payment_id: Uuid, fields: CreateFuturePaymentCmd) -> Self {
        Self { payment_id, fields }
    }
}
