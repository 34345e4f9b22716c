//! Serving-Loop State
//!
//! Cross-cycle mutable state lives in one explicit object instead of
//! process-wide globals: the activity mode, the current event-loop wait, the
//! committed rotation, and the client-presented scale. The serving loop is
//! single-threaded, so the state needs no locking; it is read each cycle and
//! written only at cycle boundaries.
//!
//! Shutdown is the one cross-thread signal. A signal handler (outside this
//! crate) may trigger [`ShutdownFlag`] at any time, but the loop observes it
//! only between cycles, so cleanup never races an in-flight diff/publish
//! pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use framecast_frame::Rotation;

use crate::config::ServerConfig;
use crate::scale::ScaleFactor;

/// Whether the server is doing capture work or waiting for viewers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityMode {
    /// At least one viewer is connected: capture/diff/publish every cycle
    Active,
    /// No viewers: long waits, no capture work
    Idle,
}

/// Per-process serving state, read each cycle
///
/// Startup assumes [`ActivityMode::Active`] until the first observation so
/// the initial full-frame publish is not delayed behind an idle wait.
#[derive(Debug)]
pub struct ServerState {
    mode: ActivityMode,
    wait: Duration,
    active_wait: Duration,
    idle_wait: Duration,
    rotation: Rotation,
    scale: ScaleFactor,
}

impl ServerState {
    /// Initialize from configuration
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            mode: ActivityMode::Active,
            wait: config.active_wait,
            active_wait: config.active_wait,
            idle_wait: config.idle_wait,
            rotation: config.rotation,
            scale: config.scale,
        }
    }

    /// Current activity mode
    #[must_use]
    pub const fn mode(&self) -> ActivityMode {
        self.mode
    }

    /// Event-loop wait for the current mode
    #[must_use]
    pub const fn wait_interval(&self) -> Duration {
        self.wait
    }

    /// Committed rotation angle
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Client-presented scale
    #[must_use]
    pub const fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// Record a committed rotation
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Record the scale the protocol layer actually applied
    ///
    /// Written when a connection hook answers with a different effective
    /// scale than the one offered.
    pub fn set_scale(&mut self, scale: ScaleFactor) {
        self.scale = scale;
    }

    /// Fold the observed viewer count into the activity mode
    ///
    /// Zero viewers inflates the wait to the idle value and skips capture
    /// work; the first observed connection reverts to the active wait.
    /// Returns the mode now in effect.
    pub fn observe_clients(&mut self, connected: usize) -> ActivityMode {
        let mode = if connected == 0 {
            ActivityMode::Idle
        } else {
            ActivityMode::Active
        };

        if mode != self.mode {
            debug!(
                "Activity {:?} -> {:?} ({} viewer(s))",
                self.mode, mode, connected
            );
            self.mode = mode;
            self.wait = match mode {
                ActivityMode::Active => self.active_wait,
                ActivityMode::Idle => self.idle_wait,
            };
        }

        mode
    }
}

/// Cooperative shutdown signal
///
/// Clone freely; all clones observe the same flag. Triggering is sticky and
/// safe from any thread (including a signal handler), but the serving loop
/// only acts on it at cycle boundaries.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create an untriggered flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
