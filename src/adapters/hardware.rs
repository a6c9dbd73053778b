//! Hardware adapters: bridge peripherals to the domain port traits.
//!
//! [`PinActuator`] drives the fan relay through any `embedded-hal`
//! [`OutputPin`], so a board HAL pin plugs in unchanged.
//!
//! ## Dual-target design
//!
//! On a board: wrap the HAL's output pin in a [`PinActuator`] and supply a
//! real climate sensor.  On host/test: [`SimulatedCave`] provides a fan
//! pin and a climate sensor that share a small thermal model, so turning
//! the fan on visibly cools and dries the cave in the reports.

use core::cell::Cell;
use core::convert::Infallible;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, warn};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::app::telemetry::Reading;
use crate::error::{ActuatorError, SensorError};

// ── Fan output ────────────────────────────────────────────────

/// Fan relay on a digital output.  HIGH = fan energised.
pub struct PinActuator<P> {
    pin: P,
    gpio: i32,
}

impl<P: OutputPin> PinActuator<P> {
    pub fn new(pin: P, gpio: i32) -> Self {
        Self { pin, gpio }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl<P: OutputPin> ActuatorPort for PinActuator<P> {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|e| {
            warn!("GPIO{} write failed: {:?}", self.gpio, e);
            ActuatorError::GpioWriteFailed
        })
    }
}

// ── Simulated cave ────────────────────────────────────────────

/// Temperature the cave drifts toward with the fan off (°F).
const AMBIENT_TEMP_F: f64 = 58.0;
/// Temperature the fan pulls the cave toward (°F).
const COOLED_TEMP_F: f64 = 46.0;
/// Humidity the cave drifts toward with the fan off (%).
const AMBIENT_HUMIDITY_PCT: f64 = 93.0;
/// Humidity the fan pulls the cave toward (%).
const VENTED_HUMIDITY_PCT: f64 = 78.0;
/// Fraction of the remaining gap closed per sensor read.
const DRIFT_RATE: f64 = 0.08;

#[derive(Debug, Clone, Copy)]
struct CaveState {
    temperature_f: f64,
    humidity_pct: f64,
    fan_on: bool,
    sensor_fault: bool,
}

type Shared = Arc<Mutex<CriticalSectionRawMutex, Cell<CaveState>>>;

/// Host stand-in for the cave: one shared climate that the fan pin and
/// the climate sensor both act on.
#[derive(Clone)]
pub struct SimulatedCave {
    state: Shared,
}

impl SimulatedCave {
    pub fn new(temperature_f: f64, humidity_pct: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(Cell::new(CaveState {
                temperature_f,
                humidity_pct,
                fan_on: false,
                sensor_fault: false,
            }))),
        }
    }

    pub fn fan_pin(&self) -> SimFanPin {
        SimFanPin {
            state: Arc::clone(&self.state),
        }
    }

    pub fn sensor(&self) -> SimClimateSensor {
        SimClimateSensor {
            state: Arc::clone(&self.state),
        }
    }

    /// Current level of the simulated fan line.
    pub fn fan_on(&self) -> bool {
        self.state.lock(|s| s.get().fan_on)
    }

    /// Make subsequent sensor reads fail (or recover).
    pub fn set_sensor_fault(&self, fault: bool) {
        self.update(|s| s.sensor_fault = fault);
    }

    fn update(&self, f: impl FnOnce(&mut CaveState)) {
        self.state.lock(|cell| {
            let mut s = cell.get();
            f(&mut s);
            cell.set(s);
        });
    }
}

impl Default for SimulatedCave {
    fn default() -> Self {
        Self::new(52.0, 88.0)
    }
}

/// Simulated fan GPIO.
pub struct SimFanPin {
    state: Shared,
}

impl ErrorType for SimFanPin {
    type Error = Infallible;
}

impl OutputPin for SimFanPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

impl SimFanPin {
    fn write(&self, high: bool) {
        self.state.lock(|cell| {
            let mut s = cell.get();
            s.fan_on = high;
            cell.set(s);
        });
        debug!("SIM: fan line {}", if high { "HIGH" } else { "LOW" });
    }
}

/// Simulated temperature/humidity sensor.
pub struct SimClimateSensor {
    state: Shared,
}

impl SensorPort for SimClimateSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.state.lock(|cell| {
            let mut s = cell.get();
            if s.sensor_fault {
                return Err(SensorError::ReadFailed);
            }

            let (temp_target, humidity_target) = if s.fan_on {
                (COOLED_TEMP_F, VENTED_HUMIDITY_PCT)
            } else {
                (AMBIENT_TEMP_F, AMBIENT_HUMIDITY_PCT)
            };
            s.temperature_f += (temp_target - s.temperature_f) * DRIFT_RATE;
            s.humidity_pct += (humidity_target - s.humidity_pct) * DRIFT_RATE;
            cell.set(s);

            Ok(Reading {
                temperature_f: s.temperature_f,
                humidity_pct: s.humidity_pct,
            })
        })
    }
}
