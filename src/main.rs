//! Station Agent - Entry Point
//!
//! Factory-floor inspection-station control: reads device serials (typed or
//! scanned), selects the model from the serial prefix, triggers the camera
//! fleet and files the captured artifacts.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use stationd::app::run::run;
use stationd::config::{general_settings, ConfigLoader};
use stationd::logs::{init_logging, LogOptions};

use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/config.json";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        println!("stationd {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config_path = cli_args
        .get("config")
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Retrieve the scalar settings (log level lives in the config file)
    let settings = match ConfigLoader::new(&config_path).load().await {
        Ok(config) => match general_settings(&config) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings from {}: {}", config_path, e);
                return;
            }
        },
        Err(e) => {
            eprintln!("Unable to read config file {}: {}", config_path, e);
            return;
        }
    };

    // Initialize logging; a CLI level overrides the config file
    let log_level = cli_args
        .get("log-level")
        .and_then(|s| s.parse().ok())
        .unwrap_or(settings.log_level);
    let log_options = LogOptions {
        log_level,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    info!("Running station agent with config {}", config_path);
    let result = run(PathBuf::from(config_path), await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the station agent: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
