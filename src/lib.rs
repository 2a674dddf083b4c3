//! Per-minute simple moving average of event durations over a trailing window.

pub mod aggregator_core;
pub mod config;
pub mod runner;

pub use config::{CalculatorConfig, ConfigError, OutputTarget};
pub use runner::{run, run_until_ctrl_c, CalculatorError, RunSummary};
