//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `hardware`     | ActuatorPort       | `embedded-hal` output pin     |
//! |                | SensorPort         | Simulated cave (host)         |
//! | `config_file`  | ConfigPort         | JSON file on disk             |
//!
//! The report channel adapter lives with the link, in
//! [`crate::rpc::channels::LinkReporter`].

pub mod config_file;
pub mod hardware;
