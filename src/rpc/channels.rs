//! RPC inter-task communication channels.
//!
//! Uses `embassy-sync` bounded MPMC channels to bridge the blocking
//! reader thread with the async tasks on the control executor.
//!
//! ```text
//! ┌──────────────┐  CommandMsg  ┌──────────────┐  Outbound  ┌──────────────┐
//! │ Reader thread│────────────▶│ Command loop │──────────▶│ Write loop   │
//! │  (blocking)  │             └──────────────┘     ▲      │  (async)     │
//! └──────────────┘                                  │      └──────────────┘
//!                              ┌──────────────┐     │
//!                              │ Telemetry    │─────┘ Outbound::Report
//!                              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::info;

use crate::app::commands::{CommandRequest, CommandResult};
use crate::app::ports::ReportChannel;
use crate::app::telemetry::Snapshot;
use crate::error::TransportError;

/// Inbound command, delivered to the command loop.
#[derive(Debug, Clone)]
pub struct CommandMsg {
    /// Request id chosen by the control plane; echoed in the response.
    pub id: u32,
    pub request: CommandRequest,
}

/// Outbound frame, delivered to the write loop.
#[derive(Debug, Clone)]
pub enum Outbound {
    Response { id: u32, result: CommandResult },
    Report(Snapshot),
}

/// Channel depth for command (inbound) messages.
pub const CMD_DEPTH: usize = 8;

/// Channel depth for outbound messages (responses and reports).
pub const OUT_DEPTH: usize = 16;

type RawMutex = CriticalSectionRawMutex;

/// The channels and stop signals shared by every link task.
///
/// `const`-constructible so the binary can keep one in a `static`.
pub struct Link {
    /// Inbound command channel: reader → command loop.
    pub commands: Channel<RawMutex, CommandMsg, CMD_DEPTH>,
    /// Outbound channel: command loop + telemetry → write loop.
    pub outbound: Channel<RawMutex, Outbound, OUT_DEPTH>,
    /// One stop signal per task; a `Signal` wakes a single waiter.
    pub stop_telemetry: Signal<RawMutex, ()>,
    pub stop_commands: Signal<RawMutex, ()>,
    /// Raised by the I/O loop once the producers have finished, so the
    /// writer can flush their last frames.
    pub stop_writer: Signal<RawMutex, ()>,
}

impl Link {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            outbound: Channel::new(),
            stop_telemetry: Signal::new(),
            stop_commands: Signal::new(),
            stop_writer: Signal::new(),
        }
    }

    /// Queue an inbound command, waiting for room when the channel is full.
    pub async fn submit(&self, msg: CommandMsg) {
        self.commands.send(msg).await;
    }

    /// Queue an outbound frame without blocking.
    pub fn send_outbound(&self, frame: Outbound) -> Result<(), TransportError> {
        self.outbound
            .try_send(frame)
            .map_err(|_| TransportError::ChannelFull)
    }

    /// Ask the telemetry and command loops to stop.
    pub fn request_shutdown(&self) {
        info!("Link: shutdown requested");
        self.stop_telemetry.signal(());
        self.stop_commands.signal(());
    }

    pub fn reporter(&self) -> LinkReporter<'_> {
        LinkReporter { link: self }
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ReportChannel`] adapter that queues snapshots for the write loop.
pub struct LinkReporter<'a> {
    link: &'a Link,
}

impl ReportChannel for LinkReporter<'_> {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TransportError> {
        self.link.send_outbound(Outbound::Report(*snapshot))
    }
}
