//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, money::STORED_SCALE};

/// Parse a UUID column. Like money columns, a corrupt stored id is a
/// storage failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        EngineError::Storage(sea_orm::DbErr::Type(format!(
            "{label} id is not a uuid: {value:?}"
        )))
    })
}

/// Parse a money column. A corrupt stored value is a storage failure, not
/// user input.
pub(crate) fn parse_stored_money(value: &str, label: &str) -> ResultEngine<Money> {
    value.parse().map_err(|_| {
        EngineError::Storage(sea_orm::DbErr::Type(format!(
            "{label} is not a decimal: {value:?}"
        )))
    })
}

/// Amounts of entries and payments: strictly positive, at most two
/// significant decimals.
pub(crate) fn ensure_amount(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::Validation("amount must be > 0".to_string()));
    }
    if amount.fractional_digits() > STORED_SCALE {
        return Err(EngineError::Validation(format!(
            "amount {amount} has more than {STORED_SCALE} decimals"
        )));
    }
    Ok(())
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
