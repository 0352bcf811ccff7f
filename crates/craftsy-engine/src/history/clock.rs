//! Time source for snapshot timestamps and titles.

use std::cell::Cell;
use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, TimeZone};

pub trait Clock: Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic clock that advances by one millisecond per reading, so
/// consecutive snapshots still get distinct, increasing timestamps.
#[derive(Debug, Clone)]
pub struct FixedClock {
    millis: Cell<u64>,
}

impl FixedClock {
    pub fn new(millis: u64) -> Self {
        Self {
            millis: Cell::new(millis),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.millis.set(self.millis.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.millis.set(ms);
    }

    /// Current reading without advancing.
    pub fn get(&self) -> u64 {
        self.millis.get()
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let now = self.millis.get();
        self.millis.set(now + 1);
        now
    }
}

/// Human-readable local time used in default snapshot titles.
pub fn local_label(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(|millis| Local.timestamp_millis_opt(millis).single())
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_monotonic() {
        let clock = FixedClock::new(1000);
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert_eq!(first, 1000);
        assert!(second > first);

        clock.advance(500);
        assert_eq!(clock.get(), 1502);
        clock.set(7);
        assert_eq!(clock.now_millis(), 7);
    }

    #[test]
    fn test_local_label_shape() {
        let label = local_label(FixedClock::default().get());
        assert_eq!(label.len(), "2024-01-01 00:00:00".len());
        assert!(label.starts_with("202"));
    }
}
