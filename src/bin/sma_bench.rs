//! Strategy benchmark - times every aggregation strategy on a synthetic stream
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin sma_bench
//! ```
//!
//! ## Environment Variables
//!
//! - SMA_BENCH_EVENTS - Number of generated events (default: 20000)
//! - SMA_BENCH_SEED - RNG seed (default: 42)
//! - SMA_BENCH_ORACLE_LIMIT - Largest event count the brute-force strategy is run on (default: 50000)
//! - SMA_WINDOW_MINUTES - Trailing window length in minutes (default: 10)
//! - RUST_LOG - Logging level (optional, default: info)

use chrono::Utc;
use delivery_sma::aggregator_core::{
    EventStore, MinuteAverages, SmaAggregator, Strategy, SyntheticStream, WindowLength,
};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let event_count: usize = env_or("SMA_BENCH_EVENTS", 20_000);
    let seed: u64 = env_or("SMA_BENCH_SEED", 42);
    let oracle_limit: usize = env_or("SMA_BENCH_ORACLE_LIMIT", 50_000);
    let window_minutes: i64 = env_or("SMA_WINDOW_MINUTES", 10);
    let window = WindowLength::from_minutes(window_minutes)
        .ok_or_else(|| format!("SMA_WINDOW_MINUTES must be positive, got {}", window_minutes))?;

    let start = Utc::now().naive_utc();
    let mut rng = StdRng::seed_from_u64(seed);
    let events = SyntheticStream::new(event_count, start).generate(&mut rng);
    let store = EventStore::new(events)?;

    log::info!("🚀 Benchmarking {} events (seed {}, {}m window)", store.len(), seed, window.minutes());

    let mut oracle: Option<(Strategy, MinuteAverages)> = None;
    let mut timings = Vec::new();

    for strategy in [Strategy::BruteForce, Strategy::Growing, Strategy::Circular] {
        if strategy == Strategy::BruteForce && store.len() > oracle_limit {
            log::info!("   Skipping {} (over {} events)", strategy.as_str(), oracle_limit);
            continue;
        }

        let started = Instant::now();
        let results = SmaAggregator::new(window, strategy).run(&store)?;
        let elapsed = started.elapsed();

        log::info!(
            "   {:<12} {:>10.3} ms  ({} minutes)",
            strategy.as_str(),
            elapsed.as_secs_f64() * 1000.0,
            results.len()
        );
        timings.push((strategy, elapsed));

        if let Some((reference, expected)) = oracle.as_ref() {
            if *expected != results {
                return Err(format!(
                    "{} disagrees with {}",
                    strategy.as_str(),
                    reference.as_str()
                )
                .into());
            }
        } else {
            oracle = Some((strategy, results));
        }
    }

    if let (Some((_, slowest)), Some((fastest_strategy, fastest))) = (
        timings.iter().max_by_key(|(_, d)| *d),
        timings.iter().min_by_key(|(_, d)| *d),
    ) {
        let speedup = slowest.as_secs_f64() / fastest.as_secs_f64().max(f64::EPSILON);
        log::info!("✅ Fastest: {} ({:.1}x over slowest)", fastest_strategy.as_str(), speedup);
    }

    Ok(())
}
