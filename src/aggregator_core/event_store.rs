//! Validated, immutable, time-ordered event sequence

use super::normalizer::{Event, InputError};

/// Events sorted ascending by timestamp. Guaranteed non-empty.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    /// Validate ordering and build the store.
    ///
    /// Equal timestamps are allowed; a timestamp older than its
    /// predecessor is rejected with the offending index.
    pub fn new(events: Vec<Event>) -> Result<Self, InputError> {
        if events.is_empty() {
            return Err(InputError::Empty);
        }

        if let Some(pos) = events
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(InputError::Unsorted { index: pos + 1 });
        }

        Ok(Self { events })
    }

    pub fn first(&self) -> &Event {
        &self.events[0]
    }

    pub fn last(&self) -> &Event {
        &self.events[self.events.len() - 1]
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::normalizer::parse_timestamp;

    fn event(ts: &str, duration: u64) -> Event {
        Event::new(parse_timestamp(ts).unwrap(), duration)
    }

    #[test]
    fn test_store_accepts_sorted_events() {
        let store = EventStore::new(vec![
            event("2018-12-26 18:11:08", 20),
            event("2018-12-26 18:11:08", 25),
            event("2018-12-26 18:15:19", 31),
        ])
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.first().duration, 20);
        assert_eq!(store.last().duration, 31);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_store_rejects_empty() {
        assert!(matches!(EventStore::new(Vec::new()), Err(InputError::Empty)));
    }

    #[test]
    fn test_store_rejects_unsorted() {
        let result = EventStore::new(vec![
            event("2018-12-26 18:11:08", 20),
            event("2018-12-26 18:15:19", 31),
            event("2018-12-26 18:12:00", 54),
        ]);

        assert!(matches!(result, Err(InputError::Unsorted { index: 2 })));
    }
}
