//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock adapters.  Everything runs on the host with no real hardware.

mod command_handler_tests;
mod fan_controller_tests;
mod link_tests;
