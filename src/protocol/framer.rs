//! # Frame Receiver
//!
//! Recovers packet boundaries from a raw byte stream.
//!
//! The bus has no delimiters or length field, so framing relies on the
//! checksum alone: a six-byte window that validates is a packet, anything
//! else costs exactly one byte and the window slides forward.

use bytes::{Buf, BytesMut};
use tracing::trace;

use super::constants::PACKET_LEN;
use super::packet::Packet;

/// Rolling buffer that turns raw reads into validated packets
#[derive(Debug, Default)]
pub struct FrameReceiver {
    buffer: BytesMut,
    discarded: u64,
}

impl FrameReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes from a read
    ///
    /// Reads need not align with frame boundaries.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Pull the next validated packet from the buffer
    ///
    /// Returns `None` once fewer than six bytes remain; that is the steady
    /// "waiting for more input" state, not an error.
    pub fn next_packet(&mut self) -> Option<Packet> {
        while self.buffer.len() >= PACKET_LEN {
            if let Some(packet) = Packet::try_decode(&self.buffer[..PACKET_LEN]) {
                self.buffer.advance(PACKET_LEN);
                return Some(packet);
            }

            trace!(
                "No frame at buffer head, discarding 0x{:02x} ({} bytes buffered)",
                self.buffer[0],
                self.buffer.len()
            );
            self.buffer.advance(1);
            self.discarded += 1;
        }

        None
    }

    /// Drain every packet currently available
    pub fn drain_packets(&mut self) -> Vec<Packet> {
        std::iter::from_fn(|| self.next_packet()).collect()
    }

    /// Bytes waiting for more input
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes skipped while resynchronizing
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}
