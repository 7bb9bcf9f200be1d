//! A fixed-layout histogram for stage latencies.
//!
//! Eleven buckets with upper bounds at successive powers of five,
//! `b[i] = 5^(i - 1)` in integer arithmetic, so the first bucket only counts
//! zero-valued observations and the last is open-ended.

use std::sync::atomic::{AtomicU64, Ordering};

pub const NUM_BUCKETS: usize = 11;

/// Upper bounds (inclusive) of each bucket.
pub const BUCKET_BOUNDS: [u64; NUM_BUCKETS] = [
    0, 1, 5, 25, 125, 625, 3_125, 15_625, 78_125, 390_625, 1_953_125,
];

#[derive(Debug, Default)]
pub struct Histogram {
    buckets: [AtomicU64; NUM_BUCKETS],
    count: AtomicU64,
    sum: AtomicU64,
}

impl Histogram {
    pub fn observe(&self, value: u64) {
        let bucket = BUCKET_BOUNDS
            .iter()
            .position(|&bound| value <= bound)
            .unwrap_or(NUM_BUCKETS - 1);
        self.buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Snapshot of per-bucket counts, lowest bound first.
    pub fn buckets(&self) -> [u64; NUM_BUCKETS] {
        let mut out = [0; NUM_BUCKETS];
        for (out, bucket) in out.iter_mut().zip(self.buckets.iter()) {
            *out = bucket.load(Ordering::Relaxed);
        }
        out
    }

    /// Drain the histogram, returning the per-bucket counts it held.
    pub fn clear(&self) -> [u64; NUM_BUCKETS] {
        let mut out = [0; NUM_BUCKETS];
        for (out, bucket) in out.iter_mut().zip(self.buckets.iter()) {
            *out = bucket.swap(0, Ordering::Relaxed);
        }
        self.count.store(0, Ordering::Relaxed);
        self.sum.store(0, Ordering::Relaxed);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_layout() {
        for (i, bound) in BUCKET_BOUNDS.iter().enumerate().skip(1) {
            assert_eq!(*bound, 5u64.pow(i as u32 - 1));
        }
        assert_eq!(BUCKET_BOUNDS[0], 0);
    }

    #[test]
    fn test_observe() {
        let histogram = Histogram::default();
        histogram.observe(0);
        histogram.observe(1);
        histogram.observe(2);
        histogram.observe(5);
        histogram.observe(1_000_000);
        histogram.observe(u64::MAX);

        let buckets = histogram.buckets();
        assert_eq!(buckets[0], 1); // 0
        assert_eq!(buckets[1], 1); // 1
        assert_eq!(buckets[2], 2); // 2, 5
        assert_eq!(buckets[9], 0);
        assert_eq!(buckets[10], 2); // 1_000_000 and the overflow observation
        assert_eq!(histogram.count(), 6);

        assert_eq!(histogram.clear()[0], 1);
        assert_eq!(histogram.count(), 0);
        assert_eq!(histogram.buckets(), [0; NUM_BUCKETS]);
    }
}
