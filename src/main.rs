mod alert;
mod cache;
mod catalog;
mod config;
mod filter;
mod pipeline;
mod predict;
mod scheduler;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::alert::{AlertRenderer, LogRenderer};
use crate::config::Config;
use crate::scheduler::Runner;

#[derive(Parser)]
#[command(name = "debris-chime")]
#[command(about = "Orbital debris pass monitor with audio alerts")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the catalog and recompute pass predictions
    Acquire {
        /// Refetch the catalog even if the cached copy is fresh
        #[arg(long)]
        force: bool,
    },
    /// Run the monitoring loop
    Run,
    /// Validate the configuration file
    CheckConfig,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Acquire { force } => acquire(config, force),
        Commands::Run => run(config),
        Commands::CheckConfig => check(config),
    }
}

fn acquire(config: Config, force: bool) -> ExitCode {
    let observer = match config.observer() {
        Ok(observer) => observer,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match pipeline::refresh_passes(&config, &observer, chrono::Utc::now(), force) {
        Ok(events) => {
            println!(
                "{} pass events written to {}",
                events.len(),
                config.passes.cache_file.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Acquisition failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> ExitCode {
    let observer = match config.observer() {
        Ok(observer) => observer,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let renderer = make_renderer(&config);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runner = Runner::new(config, observer, renderer);
    runtime.block_on(runner.run());
    ExitCode::SUCCESS
}

fn check(config: Config) -> ExitCode {
    match config.observer() {
        Ok(observer) => {
            println!(
                "Configuration is valid: station {} at ({}, {}), radius {} km",
                config.station.name.as_deref().unwrap_or("(unnamed)"),
                observer.latitude_deg,
                observer.longitude_deg,
                config.prediction.radius_km
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "audio")]
fn make_renderer(config: &Config) -> Box<dyn AlertRenderer> {
    match alert::AudioRenderer::open(config.audio.volume, config.audio.sample_rate) {
        Some(renderer) => Box::new(renderer),
        None => Box::new(LogRenderer),
    }
}

#[cfg(not(feature = "audio"))]
fn make_renderer(_config: &Config) -> Box<dyn AlertRenderer> {
    Box::new(LogRenderer)
}
