//! Synthetic event streams for benchmarks and randomized tests

use super::normalizer::Event;
use chrono::{Duration, NaiveDateTime};
use rand::Rng;

/// Shape of a generated stream.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticStream {
    pub count: usize,
    pub start: NaiveDateTime,
    /// Upper bound for the gap between consecutive events, in milliseconds.
    pub max_gap_ms: i64,
    /// Durations are drawn from `1..=max_duration`.
    pub max_duration: u64,
}

impl SyntheticStream {
    pub fn new(count: usize, start: NaiveDateTime) -> Self {
        Self {
            count,
            start,
            max_gap_ms: 120_000,
            max_duration: 120,
        }
    }

    /// Generate `count` events in ascending timestamp order. Gaps of zero are
    /// possible, so equal timestamps occur.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.count);
        let mut timestamp = self.start;

        for _ in 0..self.count {
            timestamp += Duration::milliseconds(rng.gen_range(0..=self.max_gap_ms.max(0)));
            let duration = rng.gen_range(1..=self.max_duration.max(1));
            events.push(Event::new(timestamp, duration));
        }

        events
    }
}
