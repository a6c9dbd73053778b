//! Inbound direct-method commands.
//!
//! A [`CommandRequest`] is what the control plane sends; the
//! [`CommandHandler`] turns it into a [`CommandResult`] that travels back
//! as the method response.  Every rejection is a structured 400; nothing
//! here propagates an error to the transport.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::FanError;

use super::fan::{FanController, FanState};
use super::ports::ActuatorPort;

/// Name of the only method the device registers.
pub const SET_FAN_STATE: &str = "SetFanState";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_IMPLEMENTED: u16 = 501;

/// A direct-method invocation from the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub name: String,
    /// Raw payload bytes; expected to be UTF-8 text such as `"on"`.
    pub payload: Vec<u8>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Body of every method response: `{"result": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBody {
    pub result: String,
}

/// Status code plus structured body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: u16,
    pub body: ResultBody,
}

impl CommandResult {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResultBody {
                result: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// JSON text of the body.
    pub fn body_json(&self) -> String {
        // A struct with one string field always serialises.
        serde_json::to_string(&self.body).unwrap_or_default()
    }

    fn fan_failed() -> Self {
        Self::new(STATUS_BAD_REQUEST, "Fan failed")
    }

    fn invalid_parameter() -> Self {
        Self::new(STATUS_BAD_REQUEST, "Invalid parameter")
    }

    fn actuator_fault() -> Self {
        Self::new(STATUS_BAD_REQUEST, "Actuator fault")
    }
}

/// Handles `SetFanState` against a shared [`FanController`].
pub struct CommandHandler<A> {
    fan: Arc<FanController<A>>,
}

impl<A> Clone for CommandHandler<A> {
    fn clone(&self) -> Self {
        Self {
            fan: Arc::clone(&self.fan),
        }
    }
}

impl<A: ActuatorPort> CommandHandler<A> {
    pub fn new(fan: Arc<FanController<A>>) -> Self {
        Self { fan }
    }

    pub fn handle(&self, req: &CommandRequest) -> CommandResult {
        if self.fan.current() == FanState::Failed {
            let result = CommandResult::fan_failed();
            warn!("Direct method failed: {}", result.body_json());
            return result;
        }

        let Ok(text) = core::str::from_utf8(&req.payload) else {
            let result = CommandResult::invalid_parameter();
            warn!("Direct method failed (payload not UTF-8): {}", result.body_json());
            return result;
        };
        let value = text.replace('"', "");

        let result = match self.fan.apply(&value) {
            Ok(_) => CommandResult::new(
                STATUS_OK,
                format!("Executed direct method: {}", req.name),
            ),
            Err(FanError::InvalidValue) => CommandResult::invalid_parameter(),
            // Lost a race with `fail()` between the check above and the lock.
            Err(FanError::AlreadyFailed) => CommandResult::fan_failed(),
            Err(FanError::Actuator(_)) => CommandResult::actuator_fault(),
        };

        if !result.is_success() {
            warn!("Direct method failed: {}", result.body_json());
        }
        result
    }
}
