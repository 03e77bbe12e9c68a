//! # Tickdev CLI
//!
//! Front-end for the tickdev in-memory character devices. Registers the
//! timer, delay and ticks devices, opens one of them and drives it from
//! the command line.
//!
//! # Usage
//!
//! ```bash
//! # Write a payload, then read the status report
//! tickdev --device timer --write hello --read
//!
//! # Configure the job delay, append data, reset
//! tickdev -d timer -w 'work_delay=100' -w hello -w reset --read
//!
//! # Poll the report every second until Ctrl+C
//! tickdev --device timer --watch 1000
//!
//! # JSON snapshot of the timer device
//! tickdev --device timer --write hello --json
//! ```

#![deny(warnings)]

use clap::Parser;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tickdev_common::config::{ConfigLoader, TickdevConfig};
use tickdev_common::consts::REPORT_CAPACITY;
use tickdev_common::device::{CharDevice, Whence};
use tickdev_core::{DelayDevice, DeviceHandle, DeviceRegistry, TicksDevice, TimerConfig, TimerDevice};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Tickdev - in-memory character devices demonstrating timing primitives
#[derive(Parser, Debug)]
#[command(name = "tickdev")]
#[command(version)]
#[command(about = "Drive the tickdev timer/delay/ticks devices from the command line")]
#[command(long_about = None)]
struct Args {
    /// Path to the configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Device to open: timer, delay or ticks
    #[arg(short, long, default_value = "timer")]
    device: String,

    /// Payload to write (can be specified multiple times, applied in order)
    #[arg(short = 'w', long = "write", action = clap::ArgAction::Append, value_name = "PAYLOAD")]
    writes: Vec<String>,

    /// Read and print the status report after the writes
    #[arg(short, long)]
    read: bool,

    /// Poll the report every N milliseconds until Ctrl+C
    #[arg(long, value_name = "MS")]
    watch: Option<u64>,

    /// Print a JSON snapshot instead of the text report (timer device only)
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("tickdev failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_tracing(&args);

    info!("tickdev v{} starting...", env!("CARGO_PKG_VERSION"));

    let timer_config = load_timer_config(args.config.as_deref())?;
    let timer = Arc::new(TimerDevice::new(timer_config));

    let mut registry = DeviceRegistry::new();
    let timer_dyn: Arc<dyn CharDevice> = timer.clone();
    registry.register(timer_dyn);
    registry.register(Arc::new(DelayDevice::new()));
    registry.register(Arc::new(TicksDevice::new()));

    let mut handle = registry.open(&args.device)?;
    info!(device = args.device.as_str(), "device opened");

    for payload in &args.writes {
        match handle.write(payload.as_bytes()) {
            Ok(count) => info!(count, payload = payload.as_str(), "write ok"),
            Err(e) => warn!(payload = payload.as_str(), "write failed: {}", e),
        }
    }

    if let Some(interval_ms) = args.watch {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("received shutdown signal");
            flag.store(false, Ordering::SeqCst);
        })?;

        while running.load(Ordering::SeqCst) {
            print_report(&mut handle, &timer, &args)?;
            std::thread::sleep(Duration::from_millis(interval_ms));
        }
    } else if args.read || args.json || args.writes.is_empty() {
        print_report(&mut handle, &timer, &args)?;
    }

    info!("tickdev shutdown complete");
    Ok(())
}

/// Print one report (or JSON snapshot) to stdout. Device-level read errors
/// such as the ticks gate are logged, not fatal.
fn print_report(
    handle: &mut DeviceHandle,
    timer: &Arc<TimerDevice>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();

    if args.json {
        if handle.device_name() == "timer" {
            let snapshot = timer.snapshot();
            writeln!(stdout, "{}", serde_json::to_string_pretty(&snapshot)?)?;
            return Ok(());
        }
        warn!("--json is only available for the timer device; printing text");
    }

    handle.seek(0, Whence::Set)?;
    match handle.read(REPORT_CAPACITY) {
        Ok(bytes) => {
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
        Err(e) => warn!("read failed: {}", e),
    }
    Ok(())
}

/// Load timer tuning from the optional config file, falling back to the
/// protocol defaults.
fn load_timer_config(path: Option<&Path>) -> Result<TimerConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(TimerConfig::default());
    };

    let config = TickdevConfig::load(path)?;
    config.validate()?;
    info!(
        service_name = config.shared.service_name.as_str(),
        "loaded configuration from {:?}", path
    );
    Ok(TimerConfig::from(&config.timer))
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
