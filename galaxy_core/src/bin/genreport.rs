//! Run a full galaxy generation against the in-memory store and print
//! the structured report as JSON.
//!
//! Usage: `genreport [tier] [seed] [method]`
//!   tier:   small | medium | large | massive (default small)
//!   seed:   integer (default 42)
//!   method: scatter | poisson | halton | r2 | vogel | stratified |
//!           latin | uniform (default scatter)

use std::env;
use std::process::ExitCode;

use galaxy_core::points::DistributionMethod;
use galaxy_core::{GenerationConfig, GenerationOrchestrator, MemoryStore, ProgressSink};
use galaxy_schema::SizeTier;

struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, step: &str, percent: u8) {
        tracing::info!(target: "galaxy::genreport", step, percent, "progress");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let tier = match args.first().map(String::as_str).unwrap_or("small") {
        "small" => SizeTier::Small,
        "medium" => SizeTier::Medium,
        "large" => SizeTier::Large,
        "massive" => SizeTier::Massive,
        other => {
            eprintln!("unknown tier '{other}', expected small|medium|large|massive");
            return ExitCode::FAILURE;
        }
    };

    let seed: u64 = match args.get(1).map(String::as_str).unwrap_or("42").parse() {
        Ok(seed) => seed,
        Err(_) => {
            eprintln!("seed must be an unsigned integer");
            return ExitCode::FAILURE;
        }
    };

    let mut config = GenerationConfig::from_tier(tier, seed);
    if let Some(tag) = args.get(2) {
        config.distribution = DistributionMethod::from_tag(tag);
    }

    let mut store = MemoryStore::new();
    let report = GenerationOrchestrator::new(&mut store)
        .with_progress(&ConsoleProgress)
        .generate(&config);

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize report: {err}");
            return ExitCode::FAILURE;
        }
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
