//! Ledger entries.
//!
//! An entry is a posted transaction or expense. When it references an
//! account, the account balance moved by exactly the signed amount at the
//! moment the entry was inserted; entries without an account never touch a
//! balance. Entries are never edited, only created or deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_stored_money, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Transaction,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transaction" => Ok(Self::Transaction),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub client_id: String,
    pub account_id: Option<Uuid>,
    pub kind: EntryKind,
    pub name: Option<String>,
    pub is_income: bool,
    /// Always a positive magnitude; the direction is `is_income`.
    pub amount: Money,
    pub currency_id: String,
    pub category: String,
    pub remarks: Option<String>,
    pub executed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub client_id: String,
    pub account_id: Option<String>,
    pub entry_kind: String,
    pub name: Option<String>,
    pub is_income: bool,
    pub amount: String,
    pub currency_id: String,
    pub category: String,
    pub remarks: Option<String>,
    pub executed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            client_id: ActiveValue::Set(entry.client_id.clone()),
            account_id: ActiveValue::Set(entry.account_id.map(|id| id.to_string())),
            entry_kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            name: ActiveValue::Set(entry.name.clone()),
            is_income: ActiveValue::Set(entry.is_income),
            amount: ActiveValue::Set(entry.amount.to_stored_string()),
            currency_id: ActiveValue::Set(entry.currency_id.clone()),
            category: ActiveValue::Set(entry.category.clone()),
            remarks: ActiveValue::Set(entry.remarks.clone()),
            executed_at: ActiveValue::Set(entry.executed_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "entry")?,
            account_id: model
                .account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            kind: EntryKind::try_from(model.entry_kind.as_str())?,
            amount: parse_stored_money(&model.amount, "entry amount")?,
            client_id: model.client_id,
            name: model.name,
            is_income: model.is_income,
            currency_id: model.currency_id,
            category: model.category,
            remarks: model.remarks,
            executed_at: model.executed_at,
        })
    }
}
