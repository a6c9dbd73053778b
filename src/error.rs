//! Unified error types for the cheese cave agent.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! telemetry loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the control path without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level agent error
// ---------------------------------------------------------------------------

/// Every fallible operation in the agent funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The climate sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// The fan output could not be driven.
    Actuator(ActuatorError),
    /// A fan command was rejected.
    Fan(FanError),
    /// The link to the control plane failed.
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Fan(e) => write!(f, "fan: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction to the sensor failed.
    ReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Fan command errors
// ---------------------------------------------------------------------------

/// Why a fan command was not applied.
///
/// These never escape the command path: the handler turns every variant
/// into a structured 400 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanError {
    /// The fan is in the terminal `Failed` state.
    AlreadyFailed,
    /// The payload is not one of `off` / `on`.
    InvalidValue,
    /// State was updated but the output pin could not be driven.
    Actuator(ActuatorError),
}

impl fmt::Display for FanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyFailed => write!(f, "fan already failed"),
            Self::InvalidValue => write!(f, "invalid fan state value"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

impl std::error::Error for FanError {}

impl From<FanError> for Error {
    fn from(e: FanError) -> Self {
        Self::Fan(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The report could not be handed to the control plane.
    PublishFailed,
    /// A bounded link channel had no room.
    ChannelFull,
    /// The underlying stream was closed.
    Closed,
    /// A frame could not be serialised or exceeded the frame limit.
    Encode,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublishFailed => write!(f, "publish failed"),
            Self::ChannelFull => write!(f, "channel full"),
            Self::Closed => write!(f, "stream closed"),
            Self::Encode => write!(f, "frame encode failed"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Agent-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
