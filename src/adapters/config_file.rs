//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over an optional path.  No path means
//! defaults; a path that does not exist is an error, since the operator
//! asked for it explicitly.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

pub struct JsonConfigFile {
    path: Option<PathBuf>,
}

impl JsonConfigFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(SystemConfig::default());
        };

        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        let config = serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        info!("Config loaded from {}", path.display());
        Ok(config)
    }
}
