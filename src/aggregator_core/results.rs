//! Per-minute aggregate results

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Output layout: second granularity, no fraction, no offset suffix.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One output row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinuteAverage {
    #[serde(serialize_with = "serialize_minute")]
    pub date: NaiveDateTime,
    pub average_delivery_time: f64,
}

fn serialize_minute<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format(OUTPUT_DATE_FORMAT))
}

/// Minute-keyed averages. Keys are unique; iteration is ascending by minute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinuteAverages {
    entries: BTreeMap<NaiveDateTime, f64>,
}

impl MinuteAverages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the average for `minute`, replacing any previous value.
    pub fn record(&mut self, minute: NaiveDateTime, average: f64) {
        self.entries.insert(minute, average);
    }

    pub fn get(&self, minute: &NaiveDateTime) -> Option<f64> {
        self.entries.get(minute).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_minute(&self) -> Option<NaiveDateTime> {
        self.entries.keys().next().copied()
    }

    pub fn last_minute(&self) -> Option<NaiveDateTime> {
        self.entries.keys().next_back().copied()
    }

    /// Rows in ascending minute order.
    pub fn rows(&self) -> impl Iterator<Item = MinuteAverage> + '_ {
        self.entries
            .iter()
            .map(|(date, average)| MinuteAverage {
                date: *date,
                average_delivery_time: *average,
            })
    }
}
