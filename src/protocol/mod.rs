//! # Vallox Protocol Module
//!
//! Implementation of the Vallox RS485 bus protocol.
//!
//! This module handles:
//! - Six-byte packet encoding with additive checksum
//! - Checksum-driven frame resynchronization
//! - Register value decoding (fan speed, temperature, humidity, CO2)

pub mod constants;
pub mod packet;
pub mod framer;
pub mod values;
