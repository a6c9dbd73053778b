//! Periodic sampling and reporting.
//!
//! Each cycle reads the climate sensor, reads the fan state *at that
//! moment*, builds a fresh [`Snapshot`] and publishes it.  Cycles are
//! spaced by sleeping for the interval after each publish; there is no
//! drift correction and cycles never overlap.
//!
//! A failed cycle (sensor or publish error) is logged and skipped.  The
//! loop keeps running; losing one report is better than losing monitoring.

use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::error::{Result, SensorError};

use super::fan::{FanController, FanState};
use super::ports::{ActuatorPort, ReportChannel, SensorPort};

/// Plausible sensor envelope (°F), matching a BME280's -40..85 °C range.
const TEMPERATURE_MIN_F: f64 = -40.0;
const TEMPERATURE_MAX_F: f64 = 185.0;

/// One sensor sample.  Not persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_f: f64,
    pub humidity_pct: f64,
}

impl Reading {
    pub fn is_plausible(&self) -> bool {
        self.temperature_f.is_finite()
            && self.humidity_pct.is_finite()
            && (TEMPERATURE_MIN_F..=TEMPERATURE_MAX_F).contains(&self.temperature_f)
            && (0.0..=100.0).contains(&self.humidity_pct)
    }
}

/// Reported device state.  Field names are the wire names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub fanstate: FanState,
    pub humidity: f64,
    pub temperature: f64,
}

impl Snapshot {
    pub fn new(fanstate: FanState, reading: &Reading) -> Self {
        Self {
            fanstate,
            humidity: round2(reading.humidity_pct),
            temperature: round2(reading.temperature_f),
        }
    }
}

/// Round to two decimals, half away from zero on the scaled value.
///
/// `72.345` → `72.35`, `55.555` → `55.56`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Running counters, mostly for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub cycles: u64,
    pub published: u64,
    pub skipped: u64,
}

/// The sampling loop.
pub struct TelemetryLoop<S, R, A> {
    sensor: S,
    channel: R,
    fan: Arc<FanController<A>>,
    config: Option<SystemConfig>,
    stats: TelemetryStats,
}

impl<S: SensorPort, R: ReportChannel, A: ActuatorPort> TelemetryLoop<S, R, A> {
    pub fn new(sensor: S, channel: R, fan: Arc<FanController<A>>) -> Self {
        Self {
            sensor,
            channel,
            fan,
            config: None,
            stats: TelemetryStats::default(),
        }
    }

    /// Log a warning whenever a reading leaves the configured desired band.
    pub fn with_desired_conditions(mut self, config: SystemConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn stats(&self) -> TelemetryStats {
        self.stats
    }

    /// Run exactly one cycle: read, snapshot, publish.
    pub fn step(&mut self) -> Result<Snapshot> {
        self.stats.cycles += 1;

        let reading = self.sensor.read()?;
        if !reading.is_plausible() {
            return Err(SensorError::OutOfRange.into());
        }
        self.check_desired(&reading);

        let snapshot = Snapshot::new(self.fan.current(), &reading);
        self.channel.publish(&snapshot)?;
        self.stats.published += 1;
        Ok(snapshot)
    }

    /// Run cycles every `interval` until `shutdown` is signalled.
    ///
    /// The first cycle runs immediately.  A shutdown raised mid-sleep ends
    /// the loop without waiting out the interval.
    pub async fn run(&mut self, interval: Duration, shutdown: &Signal<CriticalSectionRawMutex, ()>) {
        info!("Telemetry loop started (interval {} ms)", interval.as_millis());

        loop {
            match self.step() {
                Ok(snapshot) => info!(
                    "Twin state reported: fanstate={} humidity={:.2} temperature={:.2}",
                    snapshot.fanstate, snapshot.humidity, snapshot.temperature
                ),
                Err(e) => {
                    self.stats.skipped += 1;
                    warn!("Telemetry cycle {} skipped: {}", self.stats.cycles, e);
                }
            }

            let stop = futures_lite::future::or(
                async {
                    shutdown.wait().await;
                    true
                },
                async {
                    async_io_mini::Timer::after(interval).await;
                    false
                },
            )
            .await;

            if stop {
                break;
            }
        }

        info!(
            "Telemetry loop stopped after {} cycles ({} published, {} skipped)",
            self.stats.cycles, self.stats.published, self.stats.skipped
        );
    }

    fn check_desired(&self, reading: &Reading) {
        let Some(config) = &self.config else {
            return;
        };
        if !config.temperature_in_range(reading.temperature_f) {
            warn!(
                "Temperature {:.2}F outside desired {:.1}F ±{:.1}",
                reading.temperature_f, config.desired_temperature_f, config.desired_temperature_limit_f
            );
        }
        if !config.humidity_in_range(reading.humidity_pct) {
            warn!(
                "Humidity {:.2}% outside desired {:.1}% ±{:.1}",
                reading.humidity_pct, config.desired_humidity_pct, config.desired_humidity_limit_pct
            );
        }
    }
}
