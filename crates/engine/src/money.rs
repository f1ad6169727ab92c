use std::{
    fmt,
    ops::Neg,
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::EngineError;

/// Number of decimal places kept on persisted balances.
pub const STORED_SCALE: u32 = 2;

/// Signed money amount backed by a base-10 decimal.
///
/// Use this type for **all** monetary values in the engine (balances, entry
/// and payment amounts). Binary floating point never touches money.
///
/// Arithmetic keeps full precision; [`Money::truncate`] drops digits toward
/// zero and is applied before a balance is written.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let balance: Money = "100.00".parse().unwrap();
/// let amount: Money = "30".parse().unwrap();
/// let left = balance.checked_sub(amount).unwrap();
/// assert_eq!(left.to_stored_string(), "70.00");
/// ```
///
/// Truncation never rounds:
///
/// ```rust
/// use engine::Money;
///
/// let value: Money = "-1.239".parse().unwrap();
/// assert_eq!(value.truncate(2).to_string(), "-1.23");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Drops every digit past `places` decimals, toward zero.
    #[must_use]
    pub fn truncate(self, places: u32) -> Money {
        Money(self.0.trunc_with_scale(places))
    }

    /// Significant fractional digits (`"1.50"` has one).
    #[must_use]
    pub fn fractional_digits(self) -> u32 {
        self.0.normalize().scale()
    }

    /// Canonical persisted form: truncated and padded to two decimals.
    #[must_use]
    pub fn to_stored_string(self) -> String {
        let mut value = self.0.trunc_with_scale(STORED_SCALE);
        value.rescale(STORED_SCALE);
        value.to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a plain decimal string.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// Exponents, thousands separators and empty strings are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid amount: {s:?}"));

        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('+'))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(invalid());
        }

        let normalized = digits.replace(',', ".");
        let mut parts = normalized.split('.');
        let whole = parts.next().ok_or_else(invalid)?;
        let fraction = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if let Some(frac) = fraction
            && !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let canonical = match fraction {
            Some(frac) if !frac.is_empty() => format!("{whole}.{frac}"),
            _ => whole.to_string(),
        };
        let value = Decimal::from_str_exact(&canonical)
            .map_err(|_| EngineError::Validation("amount too large".to_string()))?;

        if trimmed.starts_with('-') {
            Ok(Money(-value))
        } else {
            Ok(Money(value))
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
