//! Per-minute simple moving average over a trailing time window
//!
//! The windowed strategies walk a minute cursor from the first event's
//! minute to one minute past the last event's minute. Each step admits the
//! events stamped strictly before the cursor, evicts events at least one
//! window old, and records the queue average. Every event is pushed and
//! popped at most once, giving O(events + minutes) for the circular buffer.

use super::event_store::EventStore;
use super::results::MinuteAverages;
use super::window::{CircularWindow, GrowingWindow, WindowError, WindowQueue};
use chrono::{Duration, NaiveDateTime, Timelike};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Circular,
    Growing,
    BruteForce,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Circular => "circular",
            Strategy::Growing => "growing",
            Strategy::BruteForce => "brute-force",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "circular" => Some(Strategy::Circular),
            "growing" => Some(Strategy::Growing),
            "brute-force" | "brute_force" => Some(Strategy::BruteForce),
            _ => None,
        }
    }

    pub fn all() -> [Strategy; 3] {
        [Strategy::Circular, Strategy::Growing, Strategy::BruteForce]
    }
}

/// Trailing window length, always a positive number of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLength {
    minutes: i64,
    span: Duration,
}

impl WindowLength {
    /// `None` for zero, negative, or unrepresentable lengths.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        if minutes <= 0 {
            return None;
        }
        Duration::try_minutes(minutes).map(|span| Self { minutes, span })
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    pub fn as_duration(&self) -> Duration {
        self.span
    }
}

#[derive(Debug)]
pub enum AggregationError {
    ResourceExhausted(WindowError),
    Cancelled { minute: NaiveDateTime },
}

impl From<WindowError> for AggregationError {
    fn from(err: WindowError) -> Self {
        AggregationError::ResourceExhausted(err)
    }
}

impl std::fmt::Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::ResourceExhausted(e) => write!(f, "Resource exhausted: {}", e),
            AggregationError::Cancelled { minute } => {
                write!(f, "Aggregation cancelled at minute {}", minute)
            }
        }
    }
}

impl std::error::Error for AggregationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregationError::ResourceExhausted(e) => Some(e),
            AggregationError::Cancelled { .. } => None,
        }
    }
}

/// Truncate a timestamp to the start of its minute.
pub fn floor_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts - Duration::seconds(i64::from(ts.second()))
        - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// First and last (inclusive) output minutes for a store.
pub fn minute_range(store: &EventStore) -> (NaiveDateTime, NaiveDateTime) {
    let start = floor_to_minute(store.first().timestamp);
    let end = floor_to_minute(store.last().timestamp) + Duration::minutes(1);
    (start, end)
}

fn check_stop(stop: &AtomicBool, minute: NaiveDateTime) -> Result<(), AggregationError> {
    if stop.load(Ordering::Relaxed) {
        return Err(AggregationError::Cancelled { minute });
    }
    Ok(())
}

/// Moving-average calculator bound to a window length and strategy.
#[derive(Debug, Clone, Copy)]
pub struct SmaAggregator {
    window: WindowLength,
    strategy: Strategy,
}

impl SmaAggregator {
    pub fn new(window: WindowLength, strategy: Strategy) -> Self {
        Self { window, strategy }
    }

    pub fn window(&self) -> WindowLength {
        self.window
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn run(&self, store: &EventStore) -> Result<MinuteAverages, AggregationError> {
        self.run_with_stop(store, &AtomicBool::new(false))
    }

    /// Run to completion unless `stop` is raised; checked once per minute.
    pub fn run_with_stop(
        &self,
        store: &EventStore,
        stop: &AtomicBool,
    ) -> Result<MinuteAverages, AggregationError> {
        match self.strategy {
            Strategy::Circular => {
                let queue = CircularWindow::for_event_count(store.len())?;
                run_windowed(store, self.window, queue, stop)
            }
            Strategy::Growing => run_windowed(store, self.window, GrowingWindow::new(), stop),
            Strategy::BruteForce => run_brute_force(store, self.window, stop),
        }
    }
}

/// Drive the minute cursor over `store` using `queue` as the live window.
pub fn run_windowed<Q: WindowQueue>(
    store: &EventStore,
    window: WindowLength,
    mut queue: Q,
    stop: &AtomicBool,
) -> Result<MinuteAverages, AggregationError> {
    let events = store.as_slice();
    let (mut current, end) = minute_range(store);
    let mut next = 0;
    let mut results = MinuteAverages::new();

    while current <= end {
        check_stop(stop, current)?;

        while next < events.len() && events[next].timestamp < current {
            queue.push(events[next])?;
            next += 1;
        }

        queue.evict_expired(current, window.as_duration());
        results.record(current, queue.average());

        current += Duration::minutes(1);
    }

    Ok(results)
}

/// Re-scan every event for every minute. O(minutes × events).
pub fn run_brute_force(
    store: &EventStore,
    window: WindowLength,
    stop: &AtomicBool,
) -> Result<MinuteAverages, AggregationError> {
    let (mut current, end) = minute_range(store);
    let mut results = MinuteAverages::new();

    while current <= end {
        check_stop(stop, current)?;

        let lower = current - window.as_duration();
        let (sum, count) = store
            .as_slice()
            .iter()
            .filter(|e| e.timestamp > lower && e.timestamp < current)
            .fold((0u128, 0usize), |(sum, count), e| {
                (sum + u128::from(e.duration), count + 1)
            });

        let average = if count > 0 {
            sum as f64 / count as f64
        } else {
            0.0
        };
        results.record(current, average);

        current += Duration::minutes(1);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::normalizer::{parse_timestamp, Event};

    fn ts(value: &str) -> NaiveDateTime {
        parse_timestamp(value).unwrap()
    }

    fn store(events: &[(&str, u64)]) -> EventStore {
        EventStore::new(
            events
                .iter()
                .map(|(t, d)| Event::new(ts(t), *d))
                .collect(),
        )
        .unwrap()
    }

    fn window(minutes: i64) -> WindowLength {
        WindowLength::from_minutes(minutes).unwrap()
    }

    fn averages(results: &MinuteAverages) -> Vec<f64> {
        results.rows().map(|r| r.average_delivery_time).collect()
    }

    fn delivery_store() -> EventStore {
        store(&[
            ("2018-12-26 18:11:08.509654", 20),
            ("2018-12-26 18:15:19.903159", 31),
            ("2018-12-26 18:23:19.903159", 54),
        ])
    }

    #[test]
    fn test_floor_to_minute() {
        assert_eq!(
            floor_to_minute(ts("2018-12-26 18:23:19.903159")),
            ts("2018-12-26 18:23:00")
        );
        assert_eq!(
            floor_to_minute(ts("2018-12-26 18:23:00")),
            ts("2018-12-26 18:23:00")
        );
    }

    #[test]
    fn test_window_length_validation() {
        assert!(WindowLength::from_minutes(0).is_none());
        assert!(WindowLength::from_minutes(-5).is_none());
        assert!(WindowLength::from_minutes(i64::MAX).is_none());
        assert_eq!(window(10).minutes(), 10);
        assert_eq!(window(10).as_duration(), Duration::minutes(10));
    }

    #[test]
    fn test_strategy_names() {
        for strategy in Strategy::all() {
            assert_eq!(Strategy::from_str(strategy.as_str()), Some(strategy));
        }
        assert_eq!(Strategy::from_str("brute_force"), Some(Strategy::BruteForce));
        assert_eq!(Strategy::from_str("quantum"), None);
    }

    #[test]
    fn test_delivery_dataset_all_strategies() {
        let expected = vec![
            0.0, 20.0, 20.0, 20.0, 20.0, 25.5, 25.5, 25.5, 25.5, 25.5, 25.5, 31.0, 31.0, 42.5,
        ];

        for strategy in Strategy::all() {
            let results = SmaAggregator::new(window(10), strategy)
                .run(&delivery_store())
                .unwrap();
            assert_eq!(results.len(), 14, "strategy {}", strategy.as_str());
            assert_eq!(results.first_minute(), Some(ts("2018-12-26 18:11:00")));
            assert_eq!(results.last_minute(), Some(ts("2018-12-26 18:24:00")));
            assert_eq!(averages(&results), expected, "strategy {}", strategy.as_str());
        }
    }

    #[test]
    fn test_event_on_minute_boundary_admitted_next_minute() {
        let events = store(&[
            ("2018-12-26 18:11:00", 20),
            ("2018-12-26 18:12:00", 20),
            ("2018-12-26 18:17:00", 31),
        ]);

        let results = SmaAggregator::new(window(10), Strategy::Circular)
            .run(&events)
            .unwrap();

        assert_eq!(results.get(&ts("2018-12-26 18:11:00")), Some(0.0));
        assert_eq!(results.get(&ts("2018-12-26 18:12:00")), Some(20.0));
        assert_eq!(results.get(&ts("2018-12-26 18:17:00")), Some(20.0));
        assert_eq!(results.get(&ts("2018-12-26 18:18:00")), Some(71.0 / 3.0));
        assert_eq!(results.len(), 8);
    }

    #[test]
    fn test_event_exactly_one_window_old_excluded() {
        let events = store(&[("2018-12-26 18:00:00", 10), ("2018-12-26 18:05:00", 30)]);

        for strategy in Strategy::all() {
            let results = SmaAggregator::new(window(5), strategy).run(&events).unwrap();
            assert_eq!(
                averages(&results),
                vec![0.0, 10.0, 10.0, 10.0, 10.0, 0.0, 30.0],
                "strategy {}",
                strategy.as_str()
            );
        }
    }

    #[test]
    fn test_sparse_events_default_to_zero() {
        let events = store(&[("2018-12-26 18:00:30", 10), ("2018-12-26 19:00:30", 50)]);

        let results = SmaAggregator::new(window(3), Strategy::Circular)
            .run(&events)
            .unwrap();

        assert_eq!(results.len(), 62);
        assert_eq!(results.get(&ts("2018-12-26 18:01:00")), Some(10.0));
        assert_eq!(results.get(&ts("2018-12-26 18:03:00")), Some(10.0));
        assert_eq!(results.get(&ts("2018-12-26 18:04:00")), Some(0.0));
        assert_eq!(results.get(&ts("2018-12-26 18:30:00")), Some(0.0));
        assert_eq!(results.get(&ts("2018-12-26 19:01:00")), Some(50.0));
    }

    #[test]
    fn test_single_event() {
        let events = store(&[("2018-12-26 18:11:08", 7)]);
        let results = SmaAggregator::new(window(1), Strategy::Circular)
            .run(&events)
            .unwrap();

        assert_eq!(averages(&results), vec![0.0, 7.0]);
    }

    #[test]
    fn test_idempotent_runs() {
        let aggregator = SmaAggregator::new(window(10), Strategy::Circular);
        let first = aggregator.run(&delivery_store()).unwrap();
        let second = aggregator.run(&delivery_store()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stop_flag_cancels_run() {
        let stop = AtomicBool::new(true);
        for strategy in Strategy::all() {
            let result = SmaAggregator::new(window(10), strategy).run_with_stop(&delivery_store(), &stop);
            match result {
                Err(AggregationError::Cancelled { minute }) => {
                    assert_eq!(minute, ts("2018-12-26 18:11:00"))
                }
                other => panic!("expected cancellation, got {:?}", other),
            }
        }
    }

    /// Raises `stop` on the `trigger`-th push.
    struct StoppingWindow<'a> {
        inner: CircularWindow,
        stop: &'a AtomicBool,
        pushes: usize,
        trigger: usize,
    }

    impl WindowQueue for StoppingWindow<'_> {
        fn push(&mut self, event: Event) -> Result<(), WindowError> {
            self.pushes += 1;
            if self.pushes == self.trigger {
                self.stop.store(true, Ordering::Relaxed);
            }
            self.inner.push(event)
        }

        fn pop_front(&mut self) -> Option<Event> {
            self.inner.pop_front()
        }

        fn front(&self) -> Option<&Event> {
            self.inner.front()
        }

        fn average(&self) -> f64 {
            self.inner.average()
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    #[test]
    fn test_stop_flag_raised_mid_run_cancels_next_minute() {
        let stop = AtomicBool::new(false);
        let queue = StoppingWindow {
            inner: CircularWindow::with_capacity(16).unwrap(),
            stop: &stop,
            pushes: 0,
            trigger: 2,
        };

        // second event (18:15:19) is admitted at 18:16, so the 18:17 check stops the run
        let result = run_windowed(&delivery_store(), window(10), queue, &stop);
        match result {
            Err(AggregationError::Cancelled { minute }) => {
                assert_eq!(minute, ts("2018-12-26 18:17:00"))
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    /// Records every push and pop so eviction order can be checked.
    struct RecordingWindow {
        inner: CircularWindow,
        pushed: Vec<Event>,
        popped: Vec<Event>,
    }

    impl WindowQueue for &mut RecordingWindow {
        fn push(&mut self, event: Event) -> Result<(), WindowError> {
            self.pushed.push(event);
            self.inner.push(event)
        }

        fn pop_front(&mut self) -> Option<Event> {
            let event = self.inner.pop_front();
            if let Some(event) = event {
                self.popped.push(event);
            }
            event
        }

        fn front(&self) -> Option<&Event> {
            self.inner.front()
        }

        fn average(&self) -> f64 {
            self.inner.average()
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    #[test]
    fn test_each_event_admitted_and_evicted_once_in_order() {
        let events = store(&[
            ("2018-12-26 18:00:10", 1),
            ("2018-12-26 18:00:20", 2),
            ("2018-12-26 18:03:00", 3),
            ("2018-12-26 18:07:45", 4),
            ("2018-12-26 18:20:00", 5),
        ]);

        let mut recorder = RecordingWindow {
            inner: CircularWindow::with_capacity(16).unwrap(),
            pushed: Vec::new(),
            popped: Vec::new(),
        };
        run_windowed(&events, window(4), &mut recorder, &AtomicBool::new(false)).unwrap();

        assert_eq!(recorder.pushed, events.as_slice().to_vec());
        // the last event is still live at the final minute
        assert_eq!(recorder.popped, events.as_slice()[..4].to_vec());
        assert_eq!(recorder.inner.len(), 1);
    }
}
