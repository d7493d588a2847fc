//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ValloxError};
use crate::protocol::constants::{
    DEFAULT_REMOTE_CLIENT_ID, REMOTE_CLIENT_ID_MAX, REMOTE_CLIENT_ID_MIN,
};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub startup: StartupConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Bus behaviour of the engine
#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    /// Address of this client, 0x20..=0x2f
    #[serde(default = "default_remote_client_id")]
    pub remote_client_id: u8,

    /// Allow register writes at all; queries are always allowed
    #[serde(default)]
    pub enable_write: bool,

    /// Minimum quiet time on the bus before transmitting
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_ms: u64,

    /// Capacity of the incoming and outgoing queues
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Actions the binary takes after opening the bus
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StartupConfig {
    /// Fan speed to set once the bus is open, 0 leaves it untouched
    #[serde(default)]
    pub set_speed: u8,

    /// Print only events addressed to this client
    #[serde(default)]
    pub only_for_me: bool,
}

// Default value functions
fn default_device() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }

fn default_remote_client_id() -> u8 { DEFAULT_REMOTE_CLIENT_ID }
fn default_min_gap_ms() -> u64 { 50 }
fn default_queue_capacity() -> usize { 50 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            remote_client_id: default_remote_client_id(),
            enable_write: false,
            min_gap_ms: default_min_gap_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl BusConfig {
    /// Minimum inter-transmission gap
    pub fn min_gap(&self) -> Duration {
        Duration::from_millis(self.min_gap_ms)
    }

    /// Check the local bus address
    ///
    /// # Errors
    ///
    /// Returns [`ValloxError::InvalidRemoteClientId`] outside 0x20..=0x2f
    pub fn validate_remote_client_id(&self) -> Result<()> {
        if !(REMOTE_CLIENT_ID_MIN..=REMOTE_CLIENT_ID_MAX).contains(&self.remote_client_id) {
            return Err(ValloxError::InvalidRemoteClientId(self.remote_client_id));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vallox_rs485::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.device.is_empty() {
            return Err(ValloxError::Config(
                toml::de::Error::custom("serial device cannot be empty")
            ));
        }

        if ![4800, 9600, 19200].contains(&self.serial.baud_rate) {
            return Err(ValloxError::Config(
                toml::de::Error::custom("baud_rate must be one of: 4800, 9600, 19200")
            ));
        }

        self.bus.validate_remote_client_id()?;

        if self.bus.min_gap_ms == 0 || self.bus.min_gap_ms > 1000 {
            return Err(ValloxError::Config(
                toml::de::Error::custom("min_gap_ms must be between 1 and 1000")
            ));
        }

        if self.bus.queue_capacity == 0 || self.bus.queue_capacity > 1024 {
            return Err(ValloxError::Config(
                toml::de::Error::custom("queue_capacity must be between 1 and 1024")
            ));
        }

        if self.startup.set_speed > 8 {
            return Err(ValloxError::Config(
                toml::de::Error::custom("set_speed must be between 0 (disabled) and 8")
            ));
        }

        if self.startup.set_speed != 0 && !self.bus.enable_write {
            return Err(ValloxError::Config(
                toml::de::Error::custom("set_speed requires bus.enable_write = true")
            ));
        }

        Ok(())
    }
}
