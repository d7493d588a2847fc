//! # Vallox Packet Codec
//!
//! Six-byte frames protected by an additive checksum.
//!
//! ```text
//! | system | source | destination | register | value | checksum |
//! ```
//!
//! The checksum is the sum of the first five bytes modulo 256.

use super::constants::{DEVICE_MAIN, PACKET_LEN, REGISTER_QUERY, SYSTEM};

/// Calculate the additive checksum over frame bytes
///
/// # Examples
///
/// ```
/// use vallox_rs485::protocol::packet::checksum;
///
/// assert_eq!(checksum(&[0x01, 0x27, 0x11, 0x00, 0x29]), 0x62);
/// assert_eq!(checksum(&[0xff, 0x02]), 0x01);
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// A single frame on the Vallox bus
///
/// Packets are immutable once built; the checksum is computed on construction
/// for outgoing frames and verified on decode for incoming ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    system: u8,
    source: u8,
    destination: u8,
    register: u8,
    value: u8,
    checksum: u8,
}

impl Packet {
    /// Build an outgoing packet with a freshly computed checksum
    pub fn new(source: u8, destination: u8, register: u8, value: u8) -> Self {
        let checksum = checksum(&[SYSTEM, source, destination, register, value]);
        Self {
            system: SYSTEM,
            source,
            destination,
            register,
            value,
            checksum,
        }
    }

    /// Build a query for `register`, addressed to the main unit
    pub fn query(source: u8, register: u8) -> Self {
        Self::new(source, DEVICE_MAIN, REGISTER_QUERY, register)
    }

    /// Parse a frame from the first six bytes of `window`
    ///
    /// Returns `None` if fewer than six bytes are given or the checksum does
    /// not match. A mismatch is the normal outcome while resynchronizing, so
    /// this never fails loudly.
    pub fn try_decode(window: &[u8]) -> Option<Self> {
        let bytes: &[u8; PACKET_LEN] = window.get(..PACKET_LEN)?.try_into().ok()?;
        let [system, source, destination, register, value, received] = *bytes;

        if checksum(&bytes[..PACKET_LEN - 1]) != received {
            return None;
        }

        Some(Self {
            system,
            source,
            destination,
            register,
            value,
            checksum: received,
        })
    }

    /// Serialize to the wire order
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        [
            self.system,
            self.source,
            self.destination,
            self.register,
            self.value,
            self.checksum,
        ]
    }

    /// Whether this packet asks for a register rather than writing one
    pub fn is_query(&self) -> bool {
        self.register == REGISTER_QUERY
    }

    pub fn system(&self) -> u8 {
        self.system
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn register(&self) -> u8 {
        self.register
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }
}
