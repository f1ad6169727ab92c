//! Scheduled, optionally recurring, payments.
//!
//! Lifecycle of a payment:
//!
//! ```text
//! Scheduled --(scheduled_at <= now)--> Due --(applied)--> Rescheduled (rolling)
//!                                                     \-> Deleted     (one-off)
//! ```
//!
//! A rescheduled payment keeps every field except `scheduled_at`, which moves
//! forward by exactly one `frequency` from the previous `scheduled_at`.

use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntryKind, LedgerEntry, Money, ResultEngine,
    util::{parse_stored_money, parse_uuid},
};

/// Category of the ledger entry posted when a payment executes.
pub const FUTURE_PAYMENT_CATEGORY: &str = "future-payment";

const SECONDS_PER_DAY: i64 = 86_400;

/// Interval between two executions of a rolling payment, in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Frequency(i64);

/// Human-friendly reading of a [`Frequency`].
///
/// Only one of the fields is non-zero: short intervals are expressed in days,
/// longer ones in (30-day) months.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrequencyBreakdown {
    pub days: i64,
    pub months: i64,
    pub years: i64,
}

impl Frequency {
    pub fn from_secs(secs: i64) -> ResultEngine<Self> {
        if secs <= 0 {
            return Err(EngineError::Validation(
                "frequency must be a positive duration".to_string(),
            ));
        }
        Ok(Self(secs))
    }

    pub fn days(days: i64) -> ResultEngine<Self> {
        days.checked_mul(SECONDS_PER_DAY)
            .ok_or_else(|| EngineError::Validation("frequency too large".to_string()))
            .and_then(Self::from_secs)
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }

    pub fn as_delta(self) -> ResultEngine<TimeDelta> {
        TimeDelta::try_seconds(self.0)
            .ok_or_else(|| EngineError::Validation("frequency too large".to_string()))
    }

    pub fn describe(self) -> FrequencyBreakdown {
        let days = self.0 / SECONDS_PER_DAY;
        if days < 29 {
            return FrequencyBreakdown {
                days,
                ..Default::default()
            };
        }
        FrequencyBreakdown {
            months: (days / 30).max(1),
            ..Default::default()
        }
    }
}

impl TryFrom<i64> for Frequency {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_secs(value)
    }
}

impl From<Frequency> for i64 {
    fn from(value: Frequency) -> Self {
        value.0
    }
}

/// Where a payment stands relative to a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Scheduled,
    Due,
}

/// What happened to a payment on a scheduler pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Applied; the payment stays with a new `scheduled_at`.
    Rescheduled { next_scheduled_at: DateTime<Utc> },
    /// Applied; the one-off payment was removed.
    Deleted,
    /// Not applied: gone or no longer due when the unit of work looked at it.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FuturePayment {
    pub id: Uuid,
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

impl FuturePayment {
    /// A new payment must not already be due.
    pub(crate) fn ensure_upcoming(&self, now: DateTime<Utc>) -> ResultEngine<()> {
        if self.scheduled_at <= now {
            return Err(EngineError::Validation(
                "scheduled_at must be in the future".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks the invariants every stored payment keeps.
    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if self.is_rolling && self.frequency.is_none() {
            return Err(EngineError::Validation(
                "rolling payments require a frequency".to_string(),
            ));
        }
        Ok(())
    }

    pub fn status(&self, as_of: DateTime<Utc>) -> PaymentStatus {
        if self.scheduled_at <= as_of {
            PaymentStatus::Due
        } else {
            PaymentStatus::Scheduled
        }
    }

    /// The transition taken once the payment has been applied.
    pub fn after_application(&self) -> ResultEngine<PaymentOutcome> {
        if !self.is_rolling {
            return Ok(PaymentOutcome::Deleted);
        }
        let frequency = self.frequency.ok_or_else(|| {
            EngineError::Validation(format!("rolling payment {} has no frequency", self.id))
        })?;
        let next_scheduled_at = self
            .scheduled_at
            .checked_add_signed(frequency.as_delta()?)
            .ok_or_else(|| EngineError::Validation("next schedule overflows".to_string()))?;
        Ok(PaymentOutcome::Rescheduled { next_scheduled_at })
    }

    /// The ledger entry recording one execution of this payment.
    pub(crate) fn to_entry(&self) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            client_id: self.client_id.clone(),
            account_id: Some(self.account_id),
            kind: EntryKind::Transaction,
            name: Some(self.name.clone()),
            is_income: self.is_income,
            amount: self.amount,
            currency_id: self.currency_id.clone(),
            category: FUTURE_PAYMENT_CATEGORY.to_string(),
            remarks: self.remarks.clone(),
            executed_at: self.scheduled_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "future_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub client_id: String,
    pub account_id: String,
    pub name: String,
    pub amount: String,
    pub is_income: bool,
    pub is_rolling: bool,
    pub frequency_secs: Option<i64>,
    pub currency_id: String,
    pub scheduled_at: DateTimeUtc,
    pub remarks: Option<String>,
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

impl From<&FuturePayment> for ActiveModel {
    fn from(payment: &FuturePayment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            client_id: ActiveValue::Set(payment.client_id.clone()),
            account_id: ActiveValue::Set(payment.account_id.to_string()),
            name: ActiveValue::Set(payment.name.clone()),
            amount: ActiveValue::Set(payment.amount.to_stored_string()),
            is_income: ActiveValue::Set(payment.is_income),
            is_rolling: ActiveValue::Set(payment.is_rolling),
            frequency_secs: ActiveValue::Set(payment.frequency.map(Frequency::as_secs)),
            currency_id: ActiveValue::Set(payment.currency_id.clone()),
            scheduled_at: ActiveValue::Set(payment.scheduled_at),
            remarks: ActiveValue::Set(payment.remarks.clone()),
        }
    }
}

impl TryFrom<Model> for FuturePayment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "future payment")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            amount: parse_stored_money(&model.amount, "future payment amount")?,
            frequency: model.frequency_secs.map(Frequency::from_secs).transpose()?,
            client_id: model.client_id,
            name: model.name,
            is_income: model.is_income,
            is_rolling: model.is_rolling,
            currency_id: model.currency_id,
            scheduled_at: model.scheduled_at,
            remarks: model.remarks,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn payment(is_rolling: bool, frequency: Option<Frequency>) -> FuturePayment {
        FuturePayment {
            id: Uuid::new_v4(),
            client_id: "alice".to_string(),
            account_id: Uuid::new_v4(),
            name: "Salary".to_string(),
            amount: "50.00".parse().unwrap(),
            is_income: true,
            is_rolling,
            frequency,
            currency_id: "HKD".to_string(),
            scheduled_at: Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap(),
            remarks: None,
        }
    }

    #[test]
    fn frequency_must_be_positive() {
        assert!(Frequency::from_secs(0).is_err());
        assert!(Frequency::from_secs(-86_400).is_err());
        assert_eq!(Frequency::days(1).unwrap().as_secs(), 86_400);
    }

    #[test]
    fn frequency_breakdown() {
        assert_eq!(
            Frequency::days(7).unwrap().describe(),
            FrequencyBreakdown {
                days: 7,
                ..Default::default()
            }
        );
        assert_eq!(Frequency::days(29).unwrap().describe().months, 1);
        assert_eq!(Frequency::days(30).unwrap().describe().months, 1);
        assert_eq!(Frequency::days(90).unwrap().describe().months, 3);
        assert_eq!(Frequency::from_secs(3_600).unwrap().describe().days, 0);
    }

    #[test]
    fn rolling_payment_advances_from_its_own_schedule() {
        let p = payment(true, Some(Frequency::days(30).unwrap()));
        assert_eq!(
            p.after_application().unwrap(),
            PaymentOutcome::Rescheduled {
                next_scheduled_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn one_off_payment_is_deleted() {
        assert_eq!(
            payment(false, None).after_application().unwrap(),
            PaymentOutcome::Deleted
        );
    }

    #[test]
    fn validation_rules() {
        assert!(payment(true, None).validate().is_err());
        assert!(payment(true, Some(Frequency::days(1).unwrap())).validate().is_ok());

        let p = payment(false, None);
        assert!(p.validate().is_ok());
        assert!(p.ensure_upcoming(p.scheduled_at - TimeDelta::days(1)).is_ok());
        assert!(p.ensure_upcoming(p.scheduled_at).is_err());
    }

    #[test]
    fn status_flips_at_scheduled_instant() {
        let p = payment(false, None);
        assert_eq!(
            p.status(p.scheduled_at - TimeDelta::seconds(1)),
            PaymentStatus::Scheduled
        );
        assert_eq!(p.status(p.scheduled_at), PaymentStatus::Due);
    }

    #[test]
    fn posted_entry_copies_payment() {
        let p = payment(false, None);
        let entry = p.to_entry();
        assert_eq!(entry.account_id, Some(p.account_id));
        assert_eq!(entry.amount, p.amount);
        assert_eq!(entry.category, FUTURE_PAYMENT_CATEGORY);
        assert_eq!(entry.executed_at, p.scheduled_at);
    }
}
