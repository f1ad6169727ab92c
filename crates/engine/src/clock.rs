//! Time source for everything in the engine that looks at "now".

use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Clock abstracts access to the current timestamp so the scheduler and
/// validations stay deterministic in tests.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the start of the current UTC day.
    fn today(&self) -> DateTime<Utc> {
        self.now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
    }
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
