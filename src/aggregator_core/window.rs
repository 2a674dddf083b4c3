//! Sliding window queues for the per-minute moving average
//!
//! A queue holds copies of the events currently inside the trailing window.
//! Events are pushed in ascending timestamp order, so expired events are
//! always at the front and eviction only ever inspects the head.

use super::normalizer::Event;
use chrono::{Duration, NaiveDateTime};

/// Smallest circular buffer ever allocated.
pub const MIN_CAPACITY: usize = 16;

/// Share of the total event count used as the initial circular capacity.
pub const INITIAL_CAPACITY_PERCENT: usize = 25;

/// Initial queue capacity for a run over `total_events` events.
pub fn initial_capacity(total_events: usize) -> usize {
    (total_events.saturating_mul(INITIAL_CAPACITY_PERCENT) / 100).max(MIN_CAPACITY)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// The buffer could not grow to `requested` slots.
    CapacityExhausted { requested: usize },
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::CapacityExhausted { requested } => {
                write!(f, "unable to allocate window buffer of {} slots", requested)
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// FIFO of in-window events.
pub trait WindowQueue {
    /// Append an event. Timestamps must be non-decreasing across pushes.
    fn push(&mut self, event: Event) -> Result<(), WindowError>;

    /// Remove the oldest event. Returns `None` (and does nothing) when empty.
    fn pop_front(&mut self) -> Option<Event>;

    fn front(&self) -> Option<&Event>;

    /// Mean duration of the live events, `0.0` when empty.
    fn average(&self) -> f64;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop every event whose age relative to `reference` is at least
    /// `window`. Returns the number of evicted events.
    fn evict_expired(&mut self, reference: NaiveDateTime, window: Duration) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.front() {
            if reference - front.timestamp < window {
                break;
            }
            self.pop_front();
            evicted += 1;
        }
        evicted
    }
}

fn allocate_slots(capacity: usize) -> Result<Vec<Option<Event>>, WindowError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| WindowError::CapacityExhausted {
            requested: capacity,
        })?;
    Ok(slots)
}

/// Capacity-doubling circular buffer.
///
/// Keeps a running sum of durations so `average` is O(1); push and
/// pop are amortized O(1).
#[derive(Debug)]
pub struct CircularWindow {
    slots: Vec<Option<Event>>,
    head: usize,
    tail: usize,
    count: usize,
    sum: u128,
}

impl CircularWindow {
    /// Create a buffer with at least [`MIN_CAPACITY`] slots.
    pub fn with_capacity(capacity: usize) -> Result<Self, WindowError> {
        let capacity = capacity.max(MIN_CAPACITY);
        let mut slots = allocate_slots(capacity)?;
        slots.resize(capacity, None);

        Ok(Self {
            slots,
            head: 0,
            tail: 0,
            count: 0,
            sum: 0,
        })
    }

    /// Sized for a run over `total_events` events.
    pub fn for_event_count(total_events: usize) -> Result<Self, WindowError> {
        Self::with_capacity(initial_capacity(total_events))
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let capacity = self.capacity();
        (0..self.count).filter_map(move |offset| self.slots[(self.head + offset) % capacity].as_ref())
    }

    /// Double the buffer, unwrapping live events to start at slot 0.
    fn grow(&mut self) -> Result<(), WindowError> {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(WindowError::CapacityExhausted {
                requested: usize::MAX,
            })?;

        let mut slots = allocate_slots(new_capacity)?;
        slots.extend(self.slots[self.head..].iter_mut().map(Option::take));
        slots.extend(self.slots[..self.tail].iter_mut().map(Option::take));
        slots.resize(new_capacity, None);

        self.slots = slots;
        self.head = 0;
        self.tail = self.count;

        log::debug!(
            "Window buffer grew from {} to {} slots",
            old_capacity,
            new_capacity
        );
        Ok(())
    }
}

impl WindowQueue for CircularWindow {
    fn push(&mut self, event: Event) -> Result<(), WindowError> {
        if self.count == self.capacity() {
            self.grow()?;
        }

        self.slots[self.tail] = Some(event);
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
        self.sum += u128::from(event.duration);
        Ok(())
    }

    fn pop_front(&mut self) -> Option<Event> {
        if self.count == 0 {
            return None;
        }

        let event = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        if let Some(ref event) = event {
            self.sum -= u128::from(event.duration);
        }
        event
    }

    fn front(&self) -> Option<&Event> {
        if self.count == 0 {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }

    fn len(&self) -> usize {
        self.count
    }
}

/// Naive growable FIFO: dequeue shifts the whole buffer and the average
/// re-scans every live event. Kept as a comparison tier for benchmarks.
#[derive(Debug, Default)]
pub struct GrowingWindow {
    events: Vec<Event>,
}

impl GrowingWindow {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl WindowQueue for GrowingWindow {
    fn push(&mut self, event: Event) -> Result<(), WindowError> {
        self.events
            .try_reserve(1)
            .map_err(|_| WindowError::CapacityExhausted {
                requested: self.events.len().saturating_add(1),
            })?;
        self.events.push(event);
        Ok(())
    }

    fn pop_front(&mut self) -> Option<Event> {
        if self.events.is_empty() {
            return None;
        }
        Some(self.events.remove(0))
    }

    fn front(&self) -> Option<&Event> {
        self.events.first()
    }

    fn average(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        let sum: u128 = self.events.iter().map(|e| u128::from(e.duration)).sum();
        sum as f64 / self.events.len() as f64
    }

    fn len(&self) -> usize {
        self.events.len()
    }
}
