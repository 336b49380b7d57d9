//! Maintenance entry point: runs one delivery pass.
//!
//! Usage: `everletter [CONFIG]`. Without an argument the config is read from
//! `~/.everletter/config.json`.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use everletter::{init_logging, load_config, Everletter, Result};
use tracing::{error, info};

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".everletter").join("config.json"))
}

fn run(config_path: PathBuf) -> Result<()> {
    let mut config = load_config(&config_path)?;
    config.apply_env_overrides();
    init_logging(&config.logging)?;

    info!(
        "Starting everletter v{} with config {}",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let app = Everletter::open(config)?;
    let report = app.scheduler.deliver_due(Utc::now())?;
    info!(
        checked = report.letters_checked,
        created = report.deliveries_created,
        missing_recipients = report.recipients_missing,
        "Delivery pass finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let Some(config_path) = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(default_config_path)
    else {
        eprintln!("Could not determine config path; pass it as the first argument");
        return ExitCode::FAILURE;
    };

    match run(config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
