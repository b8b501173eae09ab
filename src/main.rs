//! Localization application driver
//!
//! Wires one configured measurement source through the localization engine
//! and out to the configured sink(s). Construction-time errors are fatal;
//! a cycle that yields no fix is a normal, logged outcome.

use clap::Parser;
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uwb_locator::io::{
    now_ms, ConsoleSink, FileSink, FileSource, MultiSink, SerialSource, UdpSink, UdpSource,
};
use uwb_locator::utils::config::{InputConfig, OutputConfig};
use uwb_locator::{AppConfig, ConfigError, PositionSink, SourceReader};

/// How long the consumer loop waits for a cycle before re-checking the stop
/// flag.
const CYCLE_RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// Bounded capacity of the reader-to-consumer channel.
const READER_CHANNEL_CAPACITY: usize = 32;

#[derive(Parser)]
#[command(name = "uwb-locator", about = "Anchor-range localization service")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli.config) {
        error!("fatal: {err}");
        std::process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path)?;
    let engine = config.build_engine()?;
    info!(anchors = engine.anchor_count(), "localization engine ready");

    let mut sink = build_sink(&config.output)?;
    let mut reader = spawn_source(&config.input)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))?;
    }

    info!("localization loop running, press Ctrl+C to stop");
    while !stop.load(Ordering::Relaxed) {
        let Some(cycle) = reader.recv_timeout(CYCLE_RECV_TIMEOUT) else {
            continue;
        };
        match engine.calculate_position(&cycle) {
            Some(position) => {
                if let Err(err) = sink.send_position(&position, Some(now_ms())) {
                    error!("position delivery failed: {err}");
                }
            }
            None => debug!(samples = cycle.len(), "no fix this cycle"),
        }
    }

    reader.stop();
    info!("stopped");
    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match AppConfig::load(path) {
        Ok(config) => {
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        Err(ConfigError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(AppConfig::default())
        }
        Err(err) => Err(err),
    }
}

fn spawn_source(config: &InputConfig) -> Result<SourceReader, Box<dyn Error>> {
    let reader = match config {
        InputConfig::Serial { port, baud } => {
            info!(%port, baud, "starting serial measurement source");
            SourceReader::spawn(
                "serial",
                SerialSource::open(port)?,
                READER_CHANNEL_CAPACITY,
            )?
        }
        InputConfig::Udp { host, port } => SourceReader::spawn(
            "udp",
            UdpSource::bind(host, *port)?,
            READER_CHANNEL_CAPACITY,
        )?,
        InputConfig::File {
            filepath,
            poll_interval,
        } => SourceReader::spawn(
            "file",
            FileSource::new(filepath, Duration::from_secs_f64(*poll_interval)),
            READER_CHANNEL_CAPACITY,
        )?,
    };
    Ok(reader)
}

fn build_sink(config: &OutputConfig) -> Result<Box<dyn PositionSink>, Box<dyn Error>> {
    Ok(match config {
        OutputConfig::Console { format } => Box::new(ConsoleSink::new(*format)),
        OutputConfig::Udp { host, port } => Box::new(UdpSink::connect(host, *port)?),
        OutputConfig::File { filepath, append } => Box::new(FileSink::create(filepath, *append)?),
        OutputConfig::Multi { sinks } => {
            let built = sinks
                .iter()
                .map(|sink| build_sink(sink))
                .collect::<Result<Vec<_>, _>>()?;
            info!(sinks = built.len(), "multi-sink output initialized");
            Box::new(MultiSink::new(built))
        }
    })
}
