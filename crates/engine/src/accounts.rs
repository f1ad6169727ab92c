//! The module contains `Account` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_stored_money, parse_uuid},
};

/// What kind of institution holds the account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Bank,
    Broker,
    Credit,
    Cash,
    Stock,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Broker => "broker",
            Self::Credit => "credit",
            Self::Cash => "cash",
            Self::Stock => "stock",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "broker" => Ok(Self::Broker),
            "credit" => Ok(Self::Credit),
            "cash" => Ok(Self::Cash),
            "stock" => Ok(Self::Stock),
            other => Err(EngineError::Validation(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

/// An account.
///
/// The balance is a denormalized running total of every posted entry that
/// references the account. It is only ever written by the balance mutator,
/// guarded by `version`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub client_id: String,
    pub name: String,
    pub currency_id: String,
    pub kind: AccountKind,
    pub balance: Money,
    /// Bumped on every balance write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        client_id: String,
        name: String,
        currency_id: String,
        kind: AccountKind,
        balance: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            name,
            currency_id,
            kind,
            balance,
            version: 0,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub client_id: String,
    pub name: String,
    pub currency_id: String,
    pub kind: String,
    pub balance: String,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(has_many = "super::future_payments::Entity")]
    FuturePayments,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::future_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuturePayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            client_id: ActiveValue::Set(account.client_id.clone()),
            name: ActiveValue::Set(account.name.clone()),
            currency_id: ActiveValue::Set(account.currency_id.clone()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            balance: ActiveValue::Set(account.balance.to_stored_string()),
            version: ActiveValue::Set(account.version),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            balance: parse_stored_money(&model.balance, "account balance")?,
            kind: AccountKind::try_from(model.kind.as_str())?,
            client_id: model.client_id,
            name: model.name,
            currency_id: model.currency_id,
            version: model.version,
            created_at: model.created_at,
        })
    }
}
