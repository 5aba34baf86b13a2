//! Time source abstraction.
//!
//! The engine samples the clock exactly once per command and derives every
//! timestamp of that command (deadlines, token expiry, `updated_at`) from
//! the single sampled instant.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
