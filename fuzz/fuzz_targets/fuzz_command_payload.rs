//! Fuzz target: `CommandHandler::handle`
//!
//! Arbitrary payload bytes for `SetFanState`.  The handler must answer
//! every input with 200 or 400, and a rejected payload must leave the
//! fan state untouched.
//!
//! cargo fuzz run fuzz_command_payload

#![no_main]

use std::sync::Arc;

use cheesecave::app::commands::{CommandHandler, CommandRequest, SET_FAN_STATE};
use cheesecave::app::fan::FanController;
use cheesecave::app::ports::ActuatorPort;
use cheesecave::error::ActuatorError;
use libfuzzer_sys::fuzz_target;

struct NullPin;

impl ActuatorPort for NullPin {
    fn set(&mut self, _on: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let fan = Arc::new(FanController::new(NullPin));
    let handler = CommandHandler::new(Arc::clone(&fan));
    let before = fan.current();

    let result = handler.handle(&CommandRequest::new(SET_FAN_STATE, data));

    assert!(result.status == 200 || result.status == 400);
    if !result.is_success() {
        assert_eq!(fan.current(), before);
    }
});
