//! Cheese cave agent library.
//!
//! Exposes the control core (fan state machine, command handling,
//! telemetry), the direct-method link and the hardware adapters for
//! integration testing and for the `cheesecave` binary.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod rpc;
