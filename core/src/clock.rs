//! Time and identity sources for scenario creation.
//!
//! The reducer never reads the wall clock or generates random ids itself;
//! the engine passes these in so tests can pin both.

use chrono::{DateTime, TimeZone, Utc};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_epoch_secs(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub trait IdGenerator {
    fn next_id(&self) -> String;
}

pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `scenario-1`, `scenario-2`, ... in call order.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: Cell<u64>,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.get() + 1;
        self.next.set(n);
        format!("scenario-{n}")
    }
}
