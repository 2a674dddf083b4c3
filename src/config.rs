use crate::aggregator_core::{Strategy, WindowLength};
use std::env;
use std::path::PathBuf;

const DEFAULT_INPUT_FILE: &str = "events.json";
const DEFAULT_OUTPUT_PATH: &str = "result.txt";
const DEFAULT_WINDOW_MINUTES: i64 = 10;

pub const USAGE: &str = "\
Calculates the simple moving average (SMA) of event durations per minute.

Usage: sma_calculator [--input_file <path>] [--window <minutes>] [--output <path|->] [--strategy <name>]

Options:
  --input_file <path>   JSON array or JSON Lines file with events (env SMA_INPUT_FILE, default events.json)
  --window <minutes>    Trailing window length, positive integer (env SMA_WINDOW_MINUTES, default 10)
  --output <path|->     Result file, '-' for stdout (env SMA_OUTPUT_PATH, default result.txt)
  --strategy <name>     circular | growing | brute-force (env SMA_STRATEGY, default circular)
  --help                Print this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    fn parse(value: &str) -> Self {
        if value == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(value))
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingValue(String),
    InvalidValue(String),
    UnknownArgument(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingValue(flag) => write!(f, "Missing value for {}", flag),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigError::UnknownArgument(arg) => write!(f, "Unknown argument: {}", arg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one calculator run
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    pub input_file: PathBuf,
    pub window: WindowLength,
    pub output: OutputTarget,
    pub strategy: Strategy,
}

impl CalculatorConfig {
    /// Load configuration from process arguments and environment variables
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file. Flags win over
    /// environment variables:
    /// - `SMA_INPUT_FILE` (default: events.json)
    /// - `SMA_WINDOW_MINUTES` (default: 10)
    /// - `SMA_OUTPUT_PATH` (default: result.txt, `-` for stdout)
    /// - `SMA_STRATEGY` (default: circular)
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_sources(&args, |key| env::var(key).ok())
    }

    /// Build from explicit arguments (program name excluded) and an
    /// environment lookup.
    pub fn from_sources<F>(args: &[String], lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut input_file = lookup("SMA_INPUT_FILE");
        let mut window = lookup("SMA_WINDOW_MINUTES");
        let mut output = lookup("SMA_OUTPUT_PATH");
        let mut strategy = lookup("SMA_STRATEGY");

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            // accept both `--flag value` and `--flag=value`
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (arg.as_str(), None),
            };

            let slot = match flag {
                "--input_file" | "--input-file" => &mut input_file,
                "--window" | "--window_size" => &mut window,
                "--output" => &mut output,
                "--strategy" => &mut strategy,
                _ => return Err(ConfigError::UnknownArgument(arg.clone())),
            };

            let value = match inline {
                Some(value) => value,
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?,
            };
            *slot = Some(value);
        }

        let window_minutes = match window {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ConfigError::InvalidValue(format!("window must be an integer, got '{}'", raw))
            })?,
            None => DEFAULT_WINDOW_MINUTES,
        };
        let window = WindowLength::from_minutes(window_minutes).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "window must be a positive integer, got {}",
                window_minutes
            ))
        })?;

        let strategy = match strategy {
            Some(name) => Strategy::from_str(name.trim()).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "unknown strategy '{}' (expected circular, growing or brute-force)",
                    name
                ))
            })?,
            None => Strategy::Circular,
        };

        let input_file = input_file.unwrap_or_else(|| DEFAULT_INPUT_FILE.to_string());
        if input_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "input file path cannot be empty".to_string(),
            ));
        }

        let output = OutputTarget::parse(output.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH));

        Ok(Self {
            input_file: PathBuf::from(input_file),
            window,
            output,
            strategy,
        })
    }

    /// True when the arguments ask for usage text.
    pub fn wants_help(args: &[String]) -> bool {
        args.iter().any(|a| a == "--help" || a == "-h")
    }
}
