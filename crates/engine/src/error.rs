//! The module contains the errors the engine can return.
//!
//! Every variant collapses into one of four [`ErrorKind`]s, which is what the
//! outer layers map to user-visible responses:
//!
//! - [`Validation`] / [`CurrencyMismatch`]: malformed or inconsistent input.
//! - [`NotFound`]: missing, or owned by another client.
//! - [`InsufficientBalance`]: an outgoing mutation the balance cannot cover.
//! - [`Conflict`] / [`Timeout`] / [`Storage`]: the persistence layer failed.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`CurrencyMismatch`]: EngineError::CurrencyMismatch
//!  [`NotFound`]: EngineError::NotFound
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`Conflict`]: EngineError::Conflict
//!  [`Timeout`]: EngineError::Timeout
//!  [`Storage`]: EngineError::Storage
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    /// A balance or schedule changed between read and write.
    ///
    /// Units of work retry on this before giving up.
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error("Storage deadline of {0:?} exceeded")]
    Timeout(Duration),
    #[error(transparent)]
    Storage(#[from] DbErr),
}

/// The four error kinds exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientBalance,
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::CurrencyMismatch(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InsufficientBalance(_) => ErrorKind::InsufficientBalance,
            Self::Conflict(_) | Self::Timeout(_) | Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
