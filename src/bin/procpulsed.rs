//! procpulsed - system metrics exporter daemon.
//!
//! Samples CPU, memory, disk, network, page fault, and scheduler counters
//! from /proc on a configurable cadence and exposes them as Prometheus
//! gauges on an HTTP endpoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use procpulse::collector::{RealFs, SystemCollector};
use procpulse::registry::MetricRegistry;
use procpulse::sampler::Sampler;
use procpulse::server;

/// System metrics exporter daemon.
#[derive(Parser)]
#[command(name = "procpulsed", about = "System metrics exporter daemon", version)]
struct Args {
    /// Path to the JSON configuration file (re-read every tick).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Port for the metrics endpoint.
    #[arg(short, long, default_value = "8000", env = "PROCPULSE_PORT")]
    port: u16,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Block device watched for disk throughput.
    #[arg(long, default_value = "sda")]
    disk_device: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("procpulsed={}", level).parse().unwrap())
        .add_directive(format!("procpulse={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("procpulsed {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: file={}, port={}, proc={}, disk={}",
        args.config.display(),
        args.port,
        args.proc_path,
        args.disk_device
    );

    let registry = match MetricRegistry::new() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("failed to initialize metric registry: {}", e);
            process::exit(1);
        }
    };

    // Graceful shutdown: the flag stops the sampling loop and the server.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("failed to set Ctrl-C handler: {}", e);
    }

    let sampler = Sampler::new(
        SystemCollector::new(RealFs::new(), args.proc_path.as_str()),
        args.disk_device.as_str(),
        registry.clone(),
    );

    let sampler_running = running.clone();
    let config_path = args.config.clone();
    let sampler_thread = std::thread::Builder::new()
        .name("sampler".to_string())
        .spawn(move || sampler.run(&config_path, &sampler_running))
        .unwrap_or_else(|e| {
            error!("failed to spawn sampling thread: {}", e);
            process::exit(1);
        });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let server_running = running.clone();
    let shutdown = async move {
        while server_running.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(server::serve(registry, addr, shutdown));

    if let Err(e) = result {
        error!("metrics endpoint failed on {}: {}", addr, e);
        running.store(false, Ordering::SeqCst);
        let _ = sampler_thread.join();
        process::exit(1);
    }

    let _ = sampler_thread.join();
    info!("shutdown complete");
}
