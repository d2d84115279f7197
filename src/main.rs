//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `region_probe` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Choosing between the check server and a one-shot check
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use region_probe::config::{CheckArgs, Command};
use region_probe::initialization::{init_crypto_provider, init_logger_with, init_resolver};
use region_probe::{run_server, CheckRequest, CheckType, Config, Prober};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try the current directory first, then the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();
    if let Err(message) = config.validate() {
        eprintln!("region_probe: {message}");
        process::exit(2);
    }

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    let command = config.command.clone();
    let config = Arc::new(config);
    let prober = Prober::new(Arc::clone(&config), init_resolver(&config))
        .context("Failed to initialize prober")?;

    match command {
        None | Some(Command::Serve) => run_server(Arc::new(prober)).await,
        Some(Command::Check(args)) => run_once(&prober, args).await,
    }
}

async fn run_once(prober: &Prober, args: CheckArgs) -> Result<()> {
    let request = CheckRequest {
        check_type: Some(if args.url.is_some() {
            CheckType::Http
        } else {
            CheckType::Tcp
        }),
        url: args.url,
        host: args.host,
        port: args.port,
        method: Some(args.method),
        expected_status: Some(args.expected_status),
        timeout: args.timeout,
        ignore_ssl_errors: args.ignore_ssl_errors,
        degraded_threshold_ms: args.degraded_threshold_ms,
        ..Default::default()
    };

    match prober.run_check(request).await {
        Ok(result) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Failed to serialize result")?
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("region_probe error: {e}");
            process::exit(2);
        }
    }
}
