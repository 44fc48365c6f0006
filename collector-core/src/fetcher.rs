use async_trait::async_trait;
use chrono::Utc;
use std::{
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::model::Reading;

pub mod openweather;

/// Something that yields at most one reading per call.
#[async_trait]
pub trait ReadingSource: Send + Sync + Debug {
    /// `None` means this cycle has nothing to publish; the cause is already logged.
    async fn fetch(&self) -> Option<Reading>;
}

/// Wall-clock source for `collected_at` that never steps backwards.
#[derive(Debug, Default)]
pub struct CollectionClock {
    last_bits: AtomicU64,
}

impl CollectionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch seconds with microsecond precision, clamped to the previous value.
    pub fn now(&self) -> f64 {
        let micros = Utc::now().timestamp_micros();
        self.observe(micros as f64 / 1_000_000.0)
    }

    fn observe(&self, now: f64) -> f64 {
        // Non-negative IEEE-754 doubles order the same as their bit patterns.
        let bits = now.max(0.0).to_bits();
        let prev = self.last_bits.fetch_max(bits, Ordering::Relaxed);
        f64::from_bits(prev.max(bits))
    }
}
