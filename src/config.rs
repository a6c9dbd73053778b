//! System configuration parameters
//!
//! All tunable parameters for the cheese cave agent.
//! Values come from an optional JSON file and can be overridden from the
//! command line or environment.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Highest GPIO line number accepted for the fan output.
const MAX_FAN_GPIO: i32 = 40;

/// Core system configuration
///
/// `Debug` masks the shared access key inside `connection_string`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Control plane ---
    /// Device connection string (`HostName=…;DeviceId=…;SharedAccessKey=…`).
    pub connection_string: String,

    // --- Timing ---
    /// Interval between telemetry reports (milliseconds)
    pub telemetry_interval_ms: u32,

    // --- Fan ---
    /// GPIO line driving the fan relay
    pub fan_gpio: i32,

    // --- Desired conditions ---
    /// Target cave temperature (°F)
    pub desired_temperature_f: f64,
    /// Acceptable range above or below the target temperature (°F)
    pub desired_temperature_limit_f: f64,
    /// Target relative humidity (%)
    pub desired_humidity_pct: f64,
    /// Acceptable range above or below the target humidity (%)
    pub desired_humidity_limit_pct: f64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),

            telemetry_interval_ms: 5000,

            fan_gpio: 21,

            desired_temperature_f: 50.0,
            desired_temperature_limit_f: 5.0,
            desired_humidity_pct: 85.0,
            desired_humidity_limit_pct: 10.0,
        }
    }
}

impl fmt::Debug for SystemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemConfig")
            .field("connection_string", &redact_key(&self.connection_string))
            .field("telemetry_interval_ms", &self.telemetry_interval_ms)
            .field("fan_gpio", &self.fan_gpio)
            .field("desired_temperature_f", &self.desired_temperature_f)
            .field("desired_temperature_limit_f", &self.desired_temperature_limit_f)
            .field("desired_humidity_pct", &self.desired_humidity_pct)
            .field("desired_humidity_limit_pct", &self.desired_humidity_limit_pct)
            .finish()
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must be greater than zero",
            ));
        }
        if !(0..=MAX_FAN_GPIO).contains(&self.fan_gpio) {
            return Err(ConfigError::ValidationFailed("fan_gpio out of range"));
        }
        if self.desired_temperature_limit_f.is_nan() || self.desired_temperature_limit_f < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "desired_temperature_limit_f must be non-negative",
            ));
        }
        if !(0.0..=100.0).contains(&self.desired_humidity_pct) {
            return Err(ConfigError::ValidationFailed(
                "desired_humidity_pct must be within 0..=100",
            ));
        }
        if self.desired_humidity_limit_pct.is_nan() || self.desired_humidity_limit_pct < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "desired_humidity_limit_pct must be non-negative",
            ));
        }
        self.connection()?;
        Ok(())
    }

    /// Parse the connection string.
    pub fn connection(&self) -> Result<ConnectionInfo, ConfigError> {
        self.connection_string.parse()
    }

    /// Whether a reading falls inside the desired temperature band.
    pub fn temperature_in_range(&self, temperature_f: f64) -> bool {
        (temperature_f - self.desired_temperature_f).abs() <= self.desired_temperature_limit_f
    }

    /// Whether a reading falls inside the desired humidity band.
    pub fn humidity_in_range(&self, humidity_pct: f64) -> bool {
        (humidity_pct - self.desired_humidity_pct).abs() <= self.desired_humidity_limit_pct
    }
}

// ---------------------------------------------------------------------------
// Connection string
// ---------------------------------------------------------------------------

/// Parsed control-plane credentials.
///
/// `Debug` and `Display` never print the shared access key.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host_name: String,
    pub device_id: String,
    pub shared_access_key: Option<String>,
}

impl core::str::FromStr for ConnectionInfo {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Keys may contain base64 padding, so split on the first '=' only.
            let Some((key, value)) = part.split_once('=') else {
                return Err(ConfigError::ValidationFailed(
                    "connection string segment without '='",
                ));
            };
            match key.trim() {
                "HostName" => host_name = Some(value.trim().to_owned()),
                "DeviceId" => device_id = Some(value.trim().to_owned()),
                "SharedAccessKey" => shared_access_key = Some(value.trim().to_owned()),
                _ => {}
            }
        }

        let host_name = host_name
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::ValidationFailed("connection string missing HostName"))?;
        let device_id = device_id
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::ValidationFailed("connection string missing DeviceId"))?;

        Ok(Self {
            host_name,
            device_id,
            shared_access_key,
        })
    }
}

/// Connection string with the `SharedAccessKey` value replaced.
fn redact_key(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _)) if key.trim() == "SharedAccessKey" => format!("{key}=<redacted>"),
            _ => part.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_key", &self.shared_access_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.device_id, self.host_name)
    }
}
