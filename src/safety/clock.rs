//! Time source for token issue and verification

/// Seconds since the Unix epoch
pub type Timestamp = i64;

/// Injected clock so expiry can be tested without sleeping
pub trait Clock: Send + Sync {
  fn now(&self) -> Timestamp;
}

/// Wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Timestamp {
    chrono::Utc::now().timestamp()
  }
}

#[cfg(test)]
pub(crate) use fixed::FixedClock;
