//! FanController against a recording actuator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::mock_hw::RecordingActuator;

use cheesecave::app::fan::{FanController, FanState};
use cheesecave::error::{ActuatorError, FanError};

fn controller() -> (FanController<RecordingActuator>, RecordingActuator) {
    let hw = RecordingActuator::new();
    (FanController::new(hw.clone()), hw)
}

#[test]
fn on_and_off_drive_the_output() {
    let (fan, hw) = controller();

    assert_eq!(fan.apply("on"), Ok(FanState::On));
    assert_eq!(fan.current(), FanState::On);
    assert_eq!(fan.apply("off"), Ok(FanState::Off));
    assert_eq!(fan.current(), FanState::Off);

    assert_eq!(hw.writes(), vec![true, false]);
}

#[test]
fn quoted_values_are_accepted() {
    let (fan, hw) = controller();
    assert_eq!(fan.apply("\"on\""), Ok(FanState::On));
    assert_eq!(hw.last_write(), Some(true));
}

#[test]
fn repeated_value_writes_again() {
    let (fan, hw) = controller();
    fan.apply("on").unwrap();
    fan.apply("on").unwrap();
    assert_eq!(hw.writes(), vec![true, true]);
}

#[test]
fn unknown_value_leaves_state_and_output_alone() {
    let (fan, hw) = controller();
    fan.apply("on").unwrap();

    for bad in ["", "ON", "Off", "failed", "1", "onn"] {
        assert_eq!(fan.apply(bad), Err(FanError::InvalidValue), "input {bad:?}");
    }

    assert_eq!(fan.current(), FanState::On);
    assert_eq!(hw.writes(), vec![true]);
}

#[test]
fn failed_state_is_terminal() {
    let (fan, hw) = controller();
    fan.apply("on").unwrap();
    fan.fail("overcurrent");

    assert_eq!(fan.current(), FanState::Failed);
    // fail() forces the line low once.
    assert_eq!(hw.writes(), vec![true, false]);

    for value in ["on", "off", "\"on\"", "garbage"] {
        assert_eq!(fan.apply(value), Err(FanError::AlreadyFailed));
    }
    assert_eq!(fan.current(), FanState::Failed);
    assert_eq!(hw.writes(), vec![true, false]);
}

#[test]
fn failing_twice_touches_output_once() {
    let (fan, hw) = controller();
    fan.fail("first");
    fan.fail("second");
    assert_eq!(hw.writes(), vec![false]);
}

#[test]
fn actuator_fault_keeps_new_state() {
    let (fan, hw) = controller();
    hw.set_failing(true);

    assert_eq!(
        fan.apply("on"),
        Err(FanError::Actuator(ActuatorError::GpioWriteFailed))
    );
    assert_eq!(fan.current(), FanState::On);

    hw.set_failing(false);
    fan.sync_output().unwrap();
    assert_eq!(hw.writes(), vec![true, true]);
}

#[test]
fn sync_output_follows_initial_state() {
    let hw = RecordingActuator::new();
    let fan = FanController::with_state(hw.clone(), FanState::Failed);
    fan.sync_output().unwrap();
    assert_eq!(hw.writes(), vec![false]);
}

#[test]
fn concurrent_commands_keep_state_and_output_in_step() {
    const WRITERS: usize = 4;
    const ROUNDS: usize = 200;

    let hw = RecordingActuator::new();
    let fan = Arc::new(FanController::new(hw.clone()));
    let done = Arc::new(AtomicBool::new(false));

    let observer = {
        let fan = Arc::clone(&fan);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut seen = Vec::new();
            while !done.load(Ordering::Acquire) {
                seen.push(fan.current());
            }
            seen
        })
    };

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let fan = Arc::clone(&fan);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    let value = if (i + w) % 2 == 0 { "on" } else { "off" };
                    fan.apply(value).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    let seen = observer.join().unwrap();

    assert!(seen.iter().all(|s| matches!(s, FanState::Off | FanState::On)));
    assert_eq!(hw.writes().len(), WRITERS * ROUNDS);
    // State and output change under one lock, so the last write is the final state.
    assert_eq!(hw.last_write(), Some(fan.current() == FanState::On));
}
