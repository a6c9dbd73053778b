//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FanController / TelemetryLoop (domain)
//! ```
//!
//! Driven adapters (sensor, fan output, report channel, config store)
//! implement these traits.  The domain consumes them via generics, so the
//! core never touches hardware or the network directly.

use crate::config::SystemConfig;
use crate::error::{ActuatorError, SensorError, TransportError};

use super::telemetry::{Reading, Snapshot};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the telemetry loop calls this once per cycle.
pub trait SensorPort {
    /// Sample temperature (°F) and relative humidity (%).
    fn read(&mut self) -> Result<Reading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the fan controller drives the relay through this.
pub trait ActuatorPort {
    /// Energise (`true`) or de-energise (`false`) the fan output.
    fn set(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Report channel (driven adapter: domain → control plane)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the control-plane link.
///
/// Inbound commands take the other direction through the bounded command
/// channel in [`crate::rpc::channels`]; the domain never pulls them itself.
pub trait ReportChannel {
    /// Hand a snapshot to the control plane.
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ config source)
// ───────────────────────────────────────────────────────────────

/// Loads system configuration.
///
/// Implementations return [`SystemConfig::default()`] when no stored config
/// exists and leave validation to [`SystemConfig::validate`].
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured source does not exist.
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing store.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

// Boxed and mutable-reference forwarding so adapters can be handed over
// either by value or borrowed from the caller.

impl<T: SensorPort + ?Sized> SensorPort for &mut T {
    fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read()
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for Box<T> {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        (**self).set(on)
    }
}

impl<T: ReportChannel + ?Sized> ReportChannel for &mut T {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TransportError> {
        (**self).publish(snapshot)
    }
}
