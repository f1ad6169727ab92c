//! JSON bodies exchanged with the HTTP layer.
//!
//! Money travels as decimal strings (`"25.50"`), never as JSON numbers.
//! Field names are camelCase.

use serde::{Deserialize, Serialize};

/// Envelope of every response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub mod account {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        Bank,
        Broker,
        Credit,
        Cash,
        Stock,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountNew {
        pub name: String,
        pub currency_id: String,
        pub kind: AccountKind,
        /// Opening balance, `"0"` when absent.
        pub balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub currency_id: String,
        pub kind: AccountKind,
        pub balance: String,
        pub created_at: DateTime<Utc>,
    }

    /// Absent fields are left as they are.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountUpdate {
        pub id: Uuid,
        pub balance: Option<String>,
        pub currency_id: Option<String>,
        pub kind: Option<AccountKind>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountsQuery {
        pub kind: Option<AccountKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountDeleted {
        pub id: Uuid,
        pub detached_entries: u64,
        pub removed_payments: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferNew {
        pub source_account_id: Uuid,
        pub target_account_id: Uuid,
        pub amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferView {
        pub source_balance: String,
        pub target_balance: String,
        pub entry_ids: Vec<Uuid>,
    }
}

pub mod entry {
    use chrono::{DateTime, FixedOffset, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Body of `POST /transactions` and `POST /expenses`.
    ///
    /// `isIncome` and `name` are ignored for expenses.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryNew {
        pub account_id: Option<Uuid>,
        pub name: Option<String>,
        pub amount: String,
        #[serde(default)]
        pub is_income: bool,
        pub currency_id: String,
        pub category: String,
        pub remarks: Option<String>,
        pub executed_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryCreated {
        pub id: Uuid,
        pub new_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryView {
        pub id: Uuid,
        pub account_id: Option<Uuid>,
        pub name: Option<String>,
        pub amount: String,
        pub is_income: bool,
        pub currency_id: String,
        pub category: String,
        pub remarks: Option<String>,
        pub executed_at: DateTime<Utc>,
    }

    /// Query string of `DELETE /transactions/{id}` and `DELETE /expenses/{id}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeleteQuery {
        #[serde(default)]
        pub revert_balance: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryDeleted {
        pub id: Uuid,
        /// Balance after the reversal, when one happened.
        pub new_balance: Option<String>,
    }
}

pub mod future_payment {
    use chrono::{DateTime, FixedOffset, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FuturePaymentNew {
        pub account_id: Uuid,
        pub name: String,
        pub amount: String,
        #[serde(default)]
        pub is_income: bool,
        #[serde(default)]
        pub is_rolling: bool,
        /// Seconds between two executions; required when rolling.
        pub frequency: Option<i64>,
        pub currency_id: String,
        pub scheduled_at: DateTime<FixedOffset>,
        pub remarks: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FuturePaymentUpdate {
        pub id: Uuid,
        #[serde(flatten)]
        pub payment: FuturePaymentNew,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FrequencyView {
        pub seconds: i64,
        pub days: i64,
        pub months: i64,
        pub years: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FuturePaymentView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub name: String,
        pub amount: String,
        pub is_income: bool,
        pub is_rolling: bool,
        pub frequency: Option<FrequencyView>,
        pub currency_id: String,
        pub scheduled_at: DateTime<Utc>,
        pub remarks: Option<String>,
    }
}
