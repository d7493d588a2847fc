//! Receive loop: raw bytes in, decoded events out.

use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};

use super::state::BusState;
use crate::protocol::framer::FrameReceiver;
use crate::protocol::values::{Event, ValueDecoder};

/// Bytes requested per read
const READ_CHUNK: usize = 64;

/// Read the bus until a read fails, then stop the engine
///
/// Pushing to a full event queue blocks reading; a slow consumer therefore
/// stalls the bus reader instead of losing events.
pub(crate) async fn receive_loop<R>(mut reader: R, events: mpsc::Sender<Event>, state: Arc<BusState>)
where
    R: AsyncRead + Unpin,
{
    let mut framer = FrameReceiver::new();
    let mut decoder = ValueDecoder::new();
    let mut buf = [0u8; READ_CHUNK];

    while state.is_running() {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                error!("Vallox bus stream closed");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                error!("Failed to read from Vallox bus: {}", e);
                break;
            }
        };

        state.touch();
        framer.extend(&buf[..n]);

        while let Some(packet) = framer.next_packet() {
            match decoder.event(&packet, Instant::now(), Utc::now()) {
                Some(event) => {
                    trace!("Received {:?}", event);
                    if events.send(event).await.is_err() {
                        trace!("Event receiver dropped, discarding event");
                    }
                }
                None => debug!(
                    "Discarding packet from 0x{:02x} register 0x{:02x} value 0x{:02x}",
                    packet.source(),
                    packet.register(),
                    packet.value()
                ),
            }
        }
    }

    state.stop();
    info!(
        "Receive loop stopped ({} bytes skipped while resynchronizing)",
        framer.discarded()
    );
}
