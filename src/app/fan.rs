//! Fan state machine.
//!
//! ```text
//!        apply("on")            apply("off")
//!   ┌─────────────────┐    ┌─────────────────┐
//!   │                 ▼    │                 ▼
//!  Off ◀──────────────── On              (either)
//!   │                      │                 │
//!   └──────── fail() ──────┴──── fail() ────▶ Failed  (terminal)
//! ```
//!
//! [`FanController`] is the single owner of the fan state.  The state and
//! the actuator live behind one critical-section mutex, so a reader on the
//! telemetry path sees either the pre- or post-command value and actuator
//! writes are never interleaved.

use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::FanError;

use super::ports::ActuatorPort;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanState {
    Off,
    On,
    /// Permanently disabled until restart.  Not reachable by command.
    Failed,
}

impl FanState {
    /// Parse a command value.
    ///
    /// Surrounding whitespace and `"` characters are ignored; the remaining
    /// token must be exactly `off` or `on`.  `failed` is not settable.
    pub fn from_command(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"').trim() {
            "off" => Some(Self::Off),
            "on" => Some(Self::On),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Failed => "failed",
        }
    }

    /// Whether the fan output should be energised in this state.
    pub fn output_level(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct FanInner<A> {
    state: FanState,
    actuator: A,
}

/// Owns the fan state and the output that follows it.
pub struct FanController<A> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<FanInner<A>>>,
}

impl<A: ActuatorPort> FanController<A> {
    /// New controller in the `Off` state.  The output is not touched until
    /// [`sync_output`](Self::sync_output) or the first command.
    pub fn new(actuator: A) -> Self {
        Self::with_state(actuator, FanState::Off)
    }

    pub fn with_state(actuator: A, state: FanState) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(FanInner { state, actuator })),
        }
    }

    /// Current fan state.
    pub fn current(&self) -> FanState {
        self.inner.lock(|inner| inner.borrow().state)
    }

    /// Validate and apply a requested state.
    ///
    /// The state is committed before the output is driven; an actuator
    /// failure is reported but does not roll the state back.
    pub fn apply(&self, requested: &str) -> Result<FanState, FanError> {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();

            if inner.state == FanState::Failed {
                return Err(FanError::AlreadyFailed);
            }

            let next = FanState::from_command(requested).ok_or(FanError::InvalidValue)?;
            let prev = inner.state;
            inner.state = next;

            if let Err(e) = inner.actuator.set(next.output_level()) {
                error!("Fan output write failed after {} -> {}: {}", prev, next, e);
                return Err(FanError::Actuator(e));
            }

            info!("Fan set to: {}", next);
            Ok(next)
        })
    }

    /// Drive the output to match the current state (e.g. at start-up).
    ///
    /// A failed fan is forced low.
    pub fn sync_output(&self) -> Result<(), FanError> {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let level = inner.state.output_level();
            inner.actuator.set(level).map_err(FanError::Actuator)
        })
    }

    /// Move to the terminal `Failed` state.
    ///
    /// Entry point for fault detection outside the command path.  The
    /// output is driven low on a best-effort basis.
    pub fn fail(&self, reason: &str) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.state == FanState::Failed {
                return;
            }
            error!("Fan failed ({}); commands disabled until restart", reason);
            inner.state = FanState::Failed;
            if let Err(e) = inner.actuator.set(false) {
                error!("Could not de-energise failed fan: {}", e);
            }
        });
    }
}
