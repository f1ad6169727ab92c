//! Ledger and scheduled-payment engine.
//!
//! The engine keeps every account balance equal to its opening balance plus
//! the signed amounts of the entries posted against it. Every mutation
//! (posting, deleting with reversal, transferring, executing a scheduled
//! payment) is one database transaction guarded by an optimistic version
//! check on each balance it touches.

pub use accounts::{Account, AccountKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{
    CreateAccountCmd, CreateEntryCmd, CreateFuturePaymentCmd, DeleteEntryCmd, TransferCmd,
    UpdateAccountCmd, UpdateFuturePaymentCmd,
};
pub use config::{CurrencyPolicy, EngineConfig, ScheduledBalanceCheck};
pub use entries::{EntryKind, LedgerEntry};
pub use error::{EngineError, ErrorKind};
pub use future_payments::{
    FUTURE_PAYMENT_CATEGORY, Frequency, FrequencyBreakdown, FuturePayment, PaymentOutcome,
    PaymentStatus,
};
pub use money::Money;
pub use ops::{
    ADJUSTMENT_CATEGORY, AccountRemoval, BalanceChange, Engine, EngineBuilder, EntryReceipt,
    TRANSFER_CATEGORY, TransferReceipt,
};
pub use scheduler::{ErrorPolicy, PassReport, Scheduler, SchedulerConfig};

mod accounts;
mod clock;
mod commands;
mod config;
mod entries;
mod error;
mod future_payments;
mod money;
mod ops;
mod scheduler;
mod store;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
