//! CommandHandler status codes and messages, end to end through the fan.

use std::sync::Arc;

use super::mock_hw::RecordingActuator;

use cheesecave::app::commands::{
    CommandHandler, CommandRequest, SET_FAN_STATE, STATUS_BAD_REQUEST, STATUS_OK,
};
use cheesecave::app::fan::{FanController, FanState};

fn handler() -> (CommandHandler<RecordingActuator>, Arc<FanController<RecordingActuator>>, RecordingActuator) {
    let hw = RecordingActuator::new();
    let fan = Arc::new(FanController::new(hw.clone()));
    (CommandHandler::new(Arc::clone(&fan)), fan, hw)
}

fn set_fan(payload: &[u8]) -> CommandRequest {
    CommandRequest::new(SET_FAN_STATE, payload)
}

#[test]
fn valid_command_returns_200_naming_the_method() {
    let (h, fan, hw) = handler();

    let result = h.handle(&set_fan(b"\"on\""));

    assert_eq!(result.status, STATUS_OK);
    assert_eq!(result.body.result, "Executed direct method: SetFanState");
    assert_eq!(result.body_json(), r#"{"result":"Executed direct method: SetFanState"}"#);
    assert_eq!(fan.current(), FanState::On);
    assert_eq!(hw.writes(), vec![true]);
}

#[test]
fn unquoted_payload_is_accepted() {
    let (h, fan, _) = handler();
    assert_eq!(h.handle(&set_fan(b"off")).status, STATUS_OK);
    assert_eq!(fan.current(), FanState::Off);
}

#[test]
fn bad_value_is_invalid_parameter() {
    let (h, fan, hw) = handler();

    let result = h.handle(&set_fan(b"\"sideways\""));

    assert_eq!(result.status, STATUS_BAD_REQUEST);
    assert_eq!(result.body.result, "Invalid parameter");
    assert_eq!(fan.current(), FanState::Off);
    assert!(hw.writes().is_empty());
}

#[test]
fn non_utf8_payload_is_invalid_parameter() {
    let (h, _, hw) = handler();
    let result = h.handle(&set_fan(&[0xff, 0xfe, b'o', b'n']));
    assert_eq!(result.status, STATUS_BAD_REQUEST);
    assert_eq!(result.body.result, "Invalid parameter");
    assert!(hw.writes().is_empty());
}

#[test]
fn failed_fan_rejects_everything() {
    let (h, fan, hw) = handler();
    fan.fail("stalled");

    let payloads: [&[u8]; 4] = [b"\"on\"", b"off", b"", &[0xff]];
    for payload in payloads {
        let result = h.handle(&set_fan(payload));
        assert_eq!(result.status, STATUS_BAD_REQUEST);
        assert_eq!(result.body.result, "Fan failed");
    }
    // Only the write from fail() itself.
    assert_eq!(hw.writes(), vec![false]);
}

#[test]
fn actuator_fault_is_reported() {
    let (h, fan, hw) = handler();
    hw.set_failing(true);

    let result = h.handle(&set_fan(b"\"on\""));

    assert_eq!(result.status, STATUS_BAD_REQUEST);
    assert_eq!(result.body.result, "Actuator fault");
    assert_eq!(fan.current(), FanState::On);
}

#[test]
fn cloned_handlers_share_one_fan() {
    let (h, fan, _) = handler();
    let other = h.clone();
    h.handle(&set_fan(b"on"));
    assert_eq!(other.handle(&set_fan(b"off")).status, STATUS_OK);
    assert_eq!(fan.current(), FanState::Off);
}
