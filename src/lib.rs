//! # Vallox RS485 Library
//!
//! Driver for the RS485 bus of Vallox ventilation units.
//!
//! This library provides the protocol engine: frame resynchronization,
//! checksum validation, register value decoding and a rate-limited outgoing
//! queue, exposed through the [`engine::Vallox`] handle.

pub mod config;
pub mod error;
pub mod protocol;
pub mod serial;
pub mod engine;

pub use engine::Vallox;
pub use protocol::values::{Decoded, Event};
