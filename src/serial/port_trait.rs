//! Trait abstraction for the write side of the bus to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::protocol::constants::PACKET_LEN;

/// Trait for writing encoded frames to the bus
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BusWriter: Send {
    /// Write one encoded frame and flush it to the line
    async fn write_frame(&mut self, frame: &[u8; PACKET_LEN]) -> io::Result<()>;
}

/// Wrapper around any async writer (serial port half, duplex stream) that implements BusWriter
pub struct StreamWriter<W> {
    inner: W,
}

impl<W> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W> BusWriter for StreamWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, frame: &[u8; PACKET_LEN]) -> io::Result<()> {
        self.inner.write_all(frame).await?;
        self.inner.flush().await
    }
}
