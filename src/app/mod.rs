//! Application core: fan state machine, command handling, telemetry.
//!
//! All interaction with hardware and the control plane happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without a real sensor, relay or network link.

pub mod commands;
pub mod fan;
pub mod ports;
pub mod telemetry;

pub use commands::{CommandHandler, CommandRequest, CommandResult};
pub use fan::{FanController, FanState};
pub use telemetry::{Reading, Snapshot, TelemetryLoop};
