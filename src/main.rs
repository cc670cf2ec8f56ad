//! Version Stamp - pre-build hook writing `version.json`

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use version_stamp::clock::TimeBasis;
use version_stamp::config::Config;
use version_stamp::{inspect, stamp};

/// Version Stamp - record build date and time for the filesystem image
#[derive(Parser, Debug)]
#[command(name = "version-stamp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Stamp file to write or inspect (overrides config)
    #[arg(short, long, value_name = "PATH", global = true)]
    output: Option<PathBuf>,

    /// Render date and time in UTC instead of host local time
    #[arg(long, global = true)]
    utc: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a fresh stamp (the default)
    Generate,
    /// Validate an existing stamp
    Inspect {
        /// Stamp to check (defaults to the configured output path)
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("version-stamp: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config, cli.verbose);

    match run(cli.command.unwrap_or(Command::Generate), &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("version-stamp: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Config file (explicit or discovered) then CLI overrides.
fn resolve_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if let Some(ref path) = cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(ref output) = cli.output {
        config.output_path = output.clone();
    }
    if cli.utc {
        config.time_basis = TimeBasis::Utc;
    }
    Ok(config)
}

fn init_tracing(config: &Config, verbose: bool) {
    let log_level = if verbose {
        "version_stamp=trace".to_string()
    } else {
        config.log_level.clone()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Command, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Generate => {
            let clock = stamp::clock_for(config);
            if let Some(pinned) = clock.pinned() {
                info!("Using SOURCE_DATE_EPOCH {}", pinned.timestamp());
            }
            stamp::generate(config, &clock, &mut std::io::stdout())?;
        }
        Command::Inspect { path } => {
            let path = path.unwrap_or_else(|| config.output_path.clone());
            let record = inspect::inspect(&path, config.time_basis)?;
            println!("✓ {} is valid", path.display());
            println!("  Build Date: {}", record.build_date);
            println!("  Build Time: {}", record.build_time);
            println!("  Build Timestamp: {}", record.build_timestamp);
            println!("  Builder: {}", record.builder);
        }
    }
    Ok(())
}
