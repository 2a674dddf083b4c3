//! Aggregator Core - Per-Minute Moving Average Engine
//!
//! Computes, for a time-ordered stream of duration-bearing events, the
//! simple moving average of duration over a trailing window, one value per
//! minute spanned by the input.
//!
//! # Architecture
//!
//! ```text
//! JSON / JSONL input → normalizer → EventStore (sorted, non-empty)
//!     ↓
//! SmaAggregator (minute cursor: admit → evict → average)
//!     ↓ push / pop_front / average
//! WindowQueue (CircularWindow | GrowingWindow)
//!     ↓
//! MinuteAverages → ResultWriter → JSONL rows
//! ```

pub mod aggregator;
pub mod event_store;
pub mod generator;
pub mod jsonl_writer;
pub mod normalizer;
pub mod results;
pub mod window;
pub mod writer_backend;

pub use aggregator::{AggregationError, SmaAggregator, Strategy, WindowLength};
pub use event_store::EventStore;
pub use generator::SyntheticStream;
pub use jsonl_writer::ResultWriter;
pub use normalizer::{load_event_store, parse_events, Event, InputError};
pub use results::{MinuteAverage, MinuteAverages};
pub use window::{CircularWindow, GrowingWindow, WindowError, WindowQueue};
pub use writer_backend::WriterError;
