//! End-to-end calculator run: load events, aggregate, write results

use crate::aggregator_core::{
    load_event_store, AggregationError, InputError, ResultWriter, SmaAggregator, WriterError,
};
use crate::config::{CalculatorConfig, ConfigError, OutputTarget};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum CalculatorError {
    Config(ConfigError),
    Input(InputError),
    Aggregation(AggregationError),
    Output(WriterError),
    Worker(String),
}

impl From<ConfigError> for CalculatorError {
    fn from(err: ConfigError) -> Self {
        CalculatorError::Config(err)
    }
}

impl From<InputError> for CalculatorError {
    fn from(err: InputError) -> Self {
        CalculatorError::Input(err)
    }
}

impl From<AggregationError> for CalculatorError {
    fn from(err: AggregationError) -> Self {
        CalculatorError::Aggregation(err)
    }
}

impl From<WriterError> for CalculatorError {
    fn from(err: WriterError) -> Self {
        CalculatorError::Output(err)
    }
}

impl std::fmt::Display for CalculatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculatorError::Config(e) => write!(f, "Configuration error: {}", e),
            CalculatorError::Input(e) => write!(f, "Input error: {}", e),
            CalculatorError::Aggregation(e) => write!(f, "Aggregation error: {}", e),
            CalculatorError::Output(e) => write!(f, "Output error: {}", e),
            CalculatorError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for CalculatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalculatorError::Config(e) => Some(e),
            CalculatorError::Input(e) => Some(e),
            CalculatorError::Aggregation(e) => Some(e),
            CalculatorError::Output(e) => Some(e),
            CalculatorError::Worker(_) => None,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub events: usize,
    pub minutes: usize,
    pub elapsed: Duration,
}

/// Run the calculator synchronously. `stop` is polled once per minute step.
pub fn run(config: &CalculatorConfig, stop: &AtomicBool) -> Result<RunSummary, CalculatorError> {
    let started = Instant::now();

    let store = load_event_store(&config.input_file)?;
    log::info!(
        "📥 Loaded {} events from {}",
        store.len(),
        config.input_file.display()
    );

    let aggregator = SmaAggregator::new(config.window, config.strategy);
    let results = aggregator.run_with_stop(&store, stop)?;
    log::info!(
        "📊 Computed {} minute averages ({} strategy, {}m window)",
        results.len(),
        config.strategy.as_str(),
        config.window.minutes()
    );

    let minutes = match &config.output {
        OutputTarget::Stdout => ResultWriter::stdout().write_all(&results)?,
        OutputTarget::File(path) => ResultWriter::create(path)?.write_all(&results)?,
    };

    let elapsed = started.elapsed();
    log::info!("⏱️  Executed in {:.2}s", elapsed.as_secs_f64());

    Ok(RunSummary {
        events: store.len(),
        minutes,
        elapsed,
    })
}

/// Run on a blocking worker and raise the stop flag on CTRL+C.
pub async fn run_until_ctrl_c(config: CalculatorConfig) -> Result<RunSummary, CalculatorError> {
    let stop = Arc::new(AtomicBool::new(false));

    let stop_on_signal = Arc::clone(&stop);
    let signal_task = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::warn!("⚠️  Received CTRL+C, cancelling...");
                stop_on_signal.store(true, Ordering::SeqCst);
            }
            Err(err) => log::error!("❌ Failed to listen for CTRL+C: {}", err),
        }
    });

    let stop_for_worker = Arc::clone(&stop);
    let outcome = tokio::task::spawn_blocking(move || run(&config, &stop_for_worker)).await;
    signal_task.abort();

    outcome.map_err(|e| CalculatorError::Worker(e.to_string()))?
}
