//! Body tracking stream publisher - Main Entry Point
//!
//! Runs one streaming session against the simulated sensor and exits with the
//! session's exit code.

use anyhow::{Context, Result};
use bodystream_rs::{
    config::{default_config_path, AppConfig},
    sensor::SimulatedDriver,
    stream::{MemoryOutletHandle, MemoryTransport, StreamTransport, TcpTransport},
    streamer::{SessionReport, Streamer, EXIT_INIT_FAILURE},
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bodystream")]
#[command(about = "Publish tracked body skeletons as a network stream")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to acquire before stopping
    #[arg(short, long, conflicts_with = "unbounded")]
    frames: Option<u64>,

    /// Acquire until a fault or a multi-subject frame
    #[arg(long)]
    unbounded: bool,

    /// Address the TCP outlet listens on
    #[arg(short, long)]
    listen: Option<String>,

    /// Print the stream descriptor as JSON and exit
    #[arg(long)]
    describe: bool,

    /// Stream to an in-memory outlet with one consumer attached
    #[arg(long)]
    dry_run: bool,

    /// Write the default config to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => default_config_path()
            .map(AppConfig::load_or_default)
            .unwrap_or_default(),
    };

    if let Some(frames) = cli.frames {
        config.acquisition.frame_limit = Some(frames);
    }
    if cli.unbounded {
        config.acquisition.frame_limit = None;
    }
    if let Some(listen) = &cli.listen {
        config.stream.listen = listen.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_with<X: StreamTransport>(config: &AppConfig, mut transport: X) -> Result<SessionReport> {
    let mut driver = SimulatedDriver::new(config.simulation.clone());
    let report = Streamer::run(&mut driver, &mut transport, config)?;
    Ok(report)
}

fn run(cli: Cli) -> Result<i32> {
    if let Some(path) = &cli.write_default_config {
        AppConfig::default()
            .save(path)
            .with_context(|| format!("Writing default config to {}", path.display()))?;
        println!("Wrote default config to {}", path.display());
        return Ok(0);
    }

    let config = load_config(&cli)?;

    if cli.describe {
        let info = Streamer::stream_info(&config, config.preferred_mode())?;
        let json = serde_json::to_string_pretty(&info)?;
        println!("{}", json);
        return Ok(0);
    }

    let report = if cli.dry_run {
        let handle = MemoryOutletHandle::new();
        handle.attach_consumer();
        let report = run_with(&config, MemoryTransport::new(handle.clone()))?;
        tracing::info!("Dry run recorded {} samples", handle.sample_count());
        report
    } else {
        run_with(&config, TcpTransport::new(config.stream.listen.clone()))?
    };

    tracing::info!(
        "Session finished in {} mode: {} published, {} rejected by outlet",
        report.mode,
        report.publisher.published,
        report.publisher.failed
    );
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    // Logs go to stderr so `--describe` output stays clean on stdout
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bodystream_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_INIT_FAILURE
        }
    };

    ExitCode::from(code as u8)
}
