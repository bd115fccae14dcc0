use chrono::{Local, NaiveDate};
use std::sync::{Arc, Mutex};

/// Source of the current calendar day.
///
/// The cache layer keys and expires entries by day, so the day is injected
/// rather than read from the system directly.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock whose day is set by hand. Clones share the same day.
#[derive(Debug, Clone)]
pub struct ManualClock {
    day: Arc<Mutex<NaiveDate>>,
}

impl ManualClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Arc::new(Mutex::new(day)),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = day;
    }

    /// Moves the clock forward by `days` calendar days.
    pub fn advance_days(&self, days: u64) {
        let mut guard = self.day.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(next) = guard.checked_add_days(chrono::Days::new(days)) {
            *guard = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
