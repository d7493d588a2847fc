//! # Vallox Engine
//!
//! Owns the two bus loops and the queues connecting them to callers.
//!
//! ```text
//! serial ──► receive loop ──► incoming queue ──► events()
//! query()/set_speed() ──► outgoing queue ──► dispatch loop ──► serial
//! ```
//!
//! Both queues are bounded. A full incoming queue blocks the receive loop; a
//! full outgoing queue blocks `query` and `set_speed` until the dispatcher
//! catches up. There is no shutdown call: the loops stop only when reading
//! the bus fails, after which [`Vallox::is_running`] reports `false` and the
//! event receiver yields `None` once drained.
//!
//! ## Usage
//!
//! ```no_run
//! use vallox_rs485::config::Config;
//! use vallox_rs485::engine::Vallox;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/default.toml")?;
//!     let mut vallox = Vallox::open(&config).await?;
//!     let mut events = vallox.events().expect("first call");
//!
//!     while let Some(event) = events.recv().await {
//!         if vallox.for_me(&event) {
//!             println!("register 0x{:02x} = {}", event.register, event.value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod dispatcher;
mod receiver;
mod state;

use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{BusConfig, Config};
use crate::error::Result;
use crate::protocol::constants::{DEVICE_MAIN, FAN_SPEED, REMOTE_CLIENT_MULTICAST};
use crate::protocol::packet::Packet;
use crate::protocol::values::{speed_to_value, Event};
use crate::serial::{open_port, BusWriter, StreamWriter};

use dispatcher::{Dispatcher, WritePolicy};
use receiver::receive_loop;
use state::BusState;

/// Handle to a running Vallox bus engine
pub struct Vallox {
    remote_client_id: u8,
    outgoing: mpsc::Sender<Packet>,
    events: Option<mpsc::Receiver<Event>>,
    state: Arc<BusState>,
}

impl std::fmt::Debug for Vallox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vallox")
            .field("remote_client_id", &self.remote_client_id)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Vallox {
    /// Open the configured serial device and start the engine
    ///
    /// # Errors
    ///
    /// Returns error if the remote client id is out of range or the serial
    /// device cannot be opened. No loops are started in either case.
    pub async fn open(config: &Config) -> Result<Self> {
        config.bus.validate_remote_client_id()?;
        let port = open_port(&config.serial.device, config.serial.baud_rate)?;
        let (reader, writer) = tokio::io::split(port);
        Self::start(reader, StreamWriter::new(writer), config.bus.clone()).await
    }

    /// Start the engine over an arbitrary byte stream
    ///
    /// Queues a fan speed query to seed state, then spawns the receive and
    /// dispatch loops on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ValloxError::InvalidRemoteClientId`] if
    /// `bus.remote_client_id` is outside 0x20..=0x2f
    pub async fn start<R, W>(reader: R, writer: W, bus: BusConfig) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: BusWriter + 'static,
    {
        bus.validate_remote_client_id()?;

        let capacity = bus.queue_capacity.max(1);
        let (outgoing, outgoing_rx) = mpsc::channel(capacity);
        let (events_tx, events) = mpsc::channel(capacity);
        let state = Arc::new(BusState::new());

        let vallox = Self {
            remote_client_id: bus.remote_client_id,
            outgoing,
            events: Some(events),
            state: state.clone(),
        };

        vallox.query(FAN_SPEED).await;

        tokio::spawn(receive_loop(reader, events_tx, state.clone()));
        tokio::spawn(
            Dispatcher::new(
                writer,
                outgoing_rx,
                vallox.outgoing.downgrade(),
                WritePolicy::new(bus.enable_write),
                bus.min_gap(),
                state,
            )
            .run(),
        );

        info!(
            "Vallox engine started as 0x{:02x} (writes {})",
            bus.remote_client_id,
            if bus.enable_write { "enabled" } else { "disabled" }
        );
        Ok(vallox)
    }

    /// Take the receiving end of the event queue
    ///
    /// Returns `Some` on the first call only.
    pub fn events(&mut self) -> Option<mpsc::Receiver<Event>> {
        self.events.take()
    }

    /// Whether an event is addressed to this client
    pub fn for_me(&self, event: &Event) -> bool {
        event.destination == REMOTE_CLIENT_MULTICAST || event.destination == self.remote_client_id
    }

    /// Ask the main unit for the value of `register`
    pub async fn query(&self, register: u8) {
        self.enqueue(Packet::query(self.remote_client_id, register)).await;
    }

    /// Change the fan speed (1-8)
    ///
    /// The new speed goes to the main unit and to every remote controller so
    /// their displays stay in sync. Out of range speeds are ignored. Whether
    /// the write reaches the bus depends on `enable_write`; callers get no
    /// delivery feedback.
    pub async fn set_speed(&self, speed: u8) {
        let Some(value) = speed_to_value(speed) else {
            warn!("Ignoring invalid fan speed {}", speed);
            return;
        };

        debug!("Setting fan speed {}", speed);
        self.write_register(DEVICE_MAIN, FAN_SPEED, value).await;
        self.write_register(REMOTE_CLIENT_MULTICAST, FAN_SPEED, value).await;
    }

    /// Whether both loops are still alive
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn remote_client_id(&self) -> u8 {
        self.remote_client_id
    }

    async fn write_register(&self, destination: u8, register: u8, value: u8) {
        self.enqueue(Packet::new(self.remote_client_id, destination, register, value))
            .await;
    }

    async fn enqueue(&self, packet: Packet) {
        if self.outgoing.send(packet).await.is_err() {
            debug!("Outgoing queue closed, dropping {:?}", packet);
        }
    }
}
