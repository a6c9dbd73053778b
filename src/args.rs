use std::path::PathBuf;

use clap::Parser;

/// Cheese cave device agent: reports climate and fan state, accepts
/// `SetFanState` direct methods as JSON lines on stdin.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// JSON configuration file; built-in defaults when omitted.
    #[arg(long, env = "CHEESECAVE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CHEESECAVE_CONNECTION_STRING", hide_env_values = true)]
    pub connection_string: Option<String>,

    /// Milliseconds between reports.
    #[arg(long, env = "CHEESECAVE_INTERVAL_MS")]
    pub interval_ms: Option<u32>,

    #[arg(long, env = "CHEESECAVE_FAN_GPIO")]
    pub fan_gpio: Option<i32>,
}

impl Args {
    /// Overlay the flags that were given on top of the file config.
    pub fn apply_to(&self, config: &mut cheesecave::config::SystemConfig) {
        if let Some(cs) = &self.connection_string {
            config.connection_string = cs.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.telemetry_interval_ms = ms;
        }
        if let Some(gpio) = self.fan_gpio {
            config.fan_gpio = gpio;
        }
    }
}
