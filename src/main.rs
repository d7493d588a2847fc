//! # Vallox RS485
//!
//! Listens to a Vallox ventilation unit bus and prints decoded readings.
//!
//! Every event is written to stdout as one JSON object per line; logs go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! vallox-rs485 [config.toml]
//! ```
//!
//! Expected output:
//! ```text
//! {"time":"2024-01-01T12:00:00Z","source":17,"destination":32,"register":41,"raw":7,"value":3}
//! ```

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use vallox_rs485::config::Config;
use vallox_rs485::Vallox;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Vallox RS485 v{} starting...", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    let mut vallox = Vallox::open(&config).await?;
    let mut events = vallox.events().context("Event stream already taken")?;

    if config.startup.set_speed != 0 {
        info!("Setting fan speed to {}", config.startup.set_speed);
        vallox.set_speed(config.startup.set_speed).await;
    }

    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    error!("Vallox bus stopped");
                    bail!("Lost connection to Vallox bus at {}", config.serial.device);
                };

                if config.startup.only_for_me && !vallox.for_me(&event) {
                    continue;
                }
                println!("{}", serde_json::to_string(&event)?);
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(())
}
