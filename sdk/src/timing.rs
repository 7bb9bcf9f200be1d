//! The `timing` module provides std::time utility functions.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

pub fn duration_as_ns(d: &Duration) -> u64 {
    d.as_secs()
        .saturating_mul(1_000_000_000)
        .saturating_add(u64::from(d.subsec_nanos()))
}

pub fn duration_as_us(d: &Duration) -> u64 {
    d.as_secs()
        .saturating_mul(1_000_000)
        .saturating_add(u64::from(d.subsec_micros()))
}

pub fn duration_as_ms(d: &Duration) -> u64 {
    d.as_secs()
        .saturating_mul(1000)
        .saturating_add(u64::from(d.subsec_millis()))
}

pub fn duration_as_s(d: &Duration) -> f32 {
    d.as_secs() as f32 + (d.subsec_nanos() as f32 / 1_000_000_000.0)
}

/// A helper that converts the time since the UNIX epoch to milliseconds.
pub fn timestamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("create timestamp in timing");
    duration_as_ms(&now)
}

/// Last timestamp an event happened, and whether an interval has elapsed
/// since; shared between threads without a lock.
#[derive(Debug, Default)]
pub struct AtomicInterval {
    last_update: AtomicU64,
}

impl AtomicInterval {
    /// true if 'interval_time_ms' has elapsed since last time we returned
    /// true as long as it has been 'interval_time_ms' since this struct was
    /// created
    pub fn should_update(&self, interval_time_ms: u64) -> bool {
        self.should_update_ext(interval_time_ms, true)
    }

    /// a primary call covers the interval; non-primary callers observe only
    pub fn should_update_ext(&self, interval_time_ms: u64, include_initial_update: bool) -> bool {
        let now = timestamp();
        let last = self.last_update.load(Ordering::Relaxed);
        now.saturating_sub(last) > interval_time_ms
            && self
                .last_update
                .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
                == Ok(last)
            && !(!include_initial_update && last == 0)
    }

    /// elapsed ms since the last update
    pub fn elapsed_ms(&self) -> u64 {
        let now = timestamp();
        let last = self.last_update.load(Ordering::Relaxed);
        now.saturating_sub(last)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interval_update() {
        let i = AtomicInterval::default();
        assert!(i.should_update(0));
        assert!(!i.should_update(u64::MAX));

        let i = AtomicInterval::default();
        assert!(!i.should_update_ext(0, false));
    }

    #[test]
    fn test_duration_conversions() {
        let d = Duration::from_millis(1500);
        assert_eq!(duration_as_ms(&d), 1500);
        assert_eq!(duration_as_us(&d), 1_500_000);
        assert_eq!(duration_as_ns(&d), 1_500_000_000);
    }
}
