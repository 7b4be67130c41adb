use clap::Parser;
use serial_deck::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use serial_deck::{console, App, AppResult, StdoutLog};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-deck",
    version,
    about = "Build, save and send binary command lists over a serial port.",
    long_about = "Compose commands from typed parameters (char, uint8, uint16), keep them in XML protocol files and send them to a serial device while every line the device sends back is printed."
)]
struct Args {
    /// Configuration file. Skips the standard search locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Baud rate used when connecting.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Protocol document to open at startup.
    #[arg(short, long)]
    open: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset, e.g. "debug".
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> AppResult<Config> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();

    if let Some(baud) = args.baud {
        config.serial.default_baud = baud;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Full => builder.init(),
    }
}

fn run(args: &Args, config: Config) -> AppResult<()> {
    let mut app = App::system(config, Arc::new(StdoutLog));

    if let Err(e) = app.refresh_ports() {
        if e.is_fatal() {
            return Err(e);
        }
        warn!("Initial port scan failed: {}", e);
    }
    if let Some(path) = &args.open {
        // Failures are already on the operator log; start with an empty list.
        let _ = app.open(path);
    }

    println!("Serial Deck v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands.");
    console::run(app, BufReader::new(io::stdin()), &mut io::stdout())
}

// --- Main Application Entry Point ---
fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("serial-deck: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);
    info!("Starting serial-deck");

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("serial-deck: {}", e);
            ExitCode::FAILURE
        }
    }
}
