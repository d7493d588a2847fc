//! # Outgoing Dispatcher
//!
//! Drains the outgoing queue onto the bus.
//!
//! Each packet goes through two gates:
//!
//! 1. **Write permission** - queries always pass; writes need writes enabled
//!    and a whitelisted register. Refused packets are dropped silently.
//! 2. **Bus gap** - the bus must have been quiet for the minimum gap. A packet
//!    that comes too early goes to the back of the queue and the dispatcher
//!    sleeps for one gap. Packets enqueued later may overtake it.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::state::BusState;
use crate::protocol::constants::WRITABLE_REGISTERS;
use crate::protocol::packet::Packet;
use crate::serial::BusWriter;

/// Which outgoing packets may reach the bus
#[derive(Debug, Clone, Copy)]
pub struct WritePolicy {
    writes_enabled: bool,
    writable: &'static [u8],
}

impl WritePolicy {
    pub fn new(writes_enabled: bool) -> Self {
        Self {
            writes_enabled,
            writable: WRITABLE_REGISTERS,
        }
    }

    /// Whether a packet for `register` may be sent
    pub fn permits(&self, register: u8) -> bool {
        if register == 0 {
            return true;
        }
        self.writes_enabled && self.writable.contains(&register)
    }
}

pub(crate) struct Dispatcher<W> {
    writer: W,
    queue: mpsc::Receiver<Packet>,
    requeue: mpsc::WeakSender<Packet>,
    held: Option<Packet>,
    policy: WritePolicy,
    gap: Duration,
    state: Arc<BusState>,
}

impl<W: BusWriter> Dispatcher<W> {
    pub fn new(
        writer: W,
        queue: mpsc::Receiver<Packet>,
        requeue: mpsc::WeakSender<Packet>,
        policy: WritePolicy,
        gap: Duration,
        state: Arc<BusState>,
    ) -> Self {
        Self {
            writer,
            queue,
            requeue,
            held: None,
            policy,
            gap,
            state,
        }
    }

    /// Run until the engine stops or every queue handle is gone
    pub async fn run(mut self) {
        loop {
            let packet = match self.held.take() {
                Some(packet) => packet,
                None => match self.queue.recv().await {
                    Some(packet) => packet,
                    None => {
                        debug!("Outgoing queue closed");
                        break;
                    }
                },
            };

            if !self.state.is_running() {
                break;
            }

            self.dispatch(packet).await;
        }

        info!("Outgoing dispatcher stopped");
    }

    async fn dispatch(&mut self, packet: Packet) {
        if !self.policy.permits(packet.register()) {
            debug!(
                "Outgoing not allowed for register 0x{:02x} = 0x{:02x}",
                packet.register(),
                packet.value()
            );
            return;
        }

        if !self.state.claim_bus(self.gap) {
            debug!(
                "Bus busy, delaying outgoing to 0x{:02x} register 0x{:02x} = 0x{:02x}",
                packet.destination(),
                packet.register(),
                packet.value()
            );
            self.defer(packet);
            sleep(self.gap).await;
            return;
        }

        match self.writer.write_frame(&packet.encode()).await {
            Ok(()) => debug!(
                "Sent outgoing to 0x{:02x} register 0x{:02x} = 0x{:02x}",
                packet.destination(),
                packet.register(),
                packet.value()
            ),
            Err(e) => warn!("Failed to write packet to Vallox bus: {}", e),
        }
    }

    /// Put a packet back at the end of the queue
    ///
    /// A full or closed queue cannot take it, so it is held and retried next.
    fn defer(&mut self, packet: Packet) {
        let requeued = match self.requeue.upgrade() {
            Some(queue) => queue.try_send(packet).map_err(|e| e.into_inner()),
            None => Err(packet),
        };

        if let Err(packet) = requeued {
            self.held = Some(packet);
        }
    }
}
