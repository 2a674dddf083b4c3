//! SMA Calculator - per-minute moving average of delivery durations
//!
//! Reads a JSON (array or JSON Lines) event file, computes for every minute
//! the average duration of the events inside the trailing window, and writes
//! one JSON object per minute.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin sma_calculator -- --input_file events.json --window 10
//! ```
//!
//! ## Environment Variables
//!
//! - SMA_INPUT_FILE - Input events file (default: events.json)
//! - SMA_WINDOW_MINUTES - Trailing window length in minutes (default: 10)
//! - SMA_OUTPUT_PATH - Result file, `-` for stdout (default: result.txt)
//! - SMA_STRATEGY - circular | growing | brute-force (default: circular)
//! - RUST_LOG - Logging level (optional, default: info)

use delivery_sma::config::USAGE;
use delivery_sma::{run_until_ctrl_c, CalculatorConfig, OutputTarget};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if CalculatorConfig::wants_help(&args) {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = CalculatorConfig::from_env()?;

    log::info!("🚀 Starting SMA calculator");
    log::info!("   Input: {}", config.input_file.display());
    log::info!("   Window: {}m", config.window.minutes());
    log::info!("   Strategy: {}", config.strategy.as_str());
    match &config.output {
        OutputTarget::Stdout => log::info!("   Output: stdout"),
        OutputTarget::File(path) => log::info!("   Output: {}", path.display()),
    }

    let output = config.output.clone();
    let summary = run_until_ctrl_c(config).await?;

    log::info!(
        "✅ Done: {} events → {} minutes in {:.2}s",
        summary.events,
        summary.minutes,
        summary.elapsed.as_secs_f64()
    );
    if let OutputTarget::File(path) = output {
        log::info!("   Check {}", path.display());
    }

    Ok(())
}
