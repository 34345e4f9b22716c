//! Server Configuration
//!
//! Everything the serving loop needs to know at startup, with a builder for
//! ergonomic construction. Protocol-facing fields (port, password, reverse
//! connection host) are handed to the protocol sink verbatim; the core never
//! interprets them.
//!
//! # Examples
//!
//! ```rust
//! use framecast_server::{ScaleFactor, ServerConfig};
//! use framecast_frame::Rotation;
//!
//! // Using builder pattern
//! let config = ServerConfig::builder()
//!     .port(5902)
//!     .rotation(Rotation::Deg90)
//!     .scale(ScaleFactor::normalize(50))
//!     .compat_flip(true)
//!     .build();
//!
//! // Using struct literal with defaults
//! let config = ServerConfig {
//!     port: 5902,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use framecast_frame::Rotation;

use crate::scale::ScaleFactor;

/// Configuration for the serving loop
///
/// Use [`ServerConfig::builder()`] for ergonomic construction or struct
/// literal syntax with [`Default::default()`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port the protocol layer listens on (default: 5901)
    ///
    /// 5900 is natively occupied on some devices, so the default sidesteps
    /// it.
    pub port: u16,

    /// Access password handed to the protocol layer (default: None)
    ///
    /// Storage and authentication are the protocol engine's concern.
    pub password: Option<String>,

    /// Reverse-connection target as `host:port` (default: None)
    ///
    /// When set, the protocol layer dials out instead of waiting for
    /// viewers.
    pub reverse_host: Option<String>,

    /// Startup rotation (default: no rotation)
    ///
    /// Applied before buffers are sized, so a 90°/270° start serves a
    /// transposed viewport from the first frame.
    pub rotation: Rotation,

    /// Client-presented scale (default: 100%)
    pub scale: ScaleFactor,

    /// 180° display compatibility flip for certain device quirks
    /// (default: off)
    pub compat_flip: bool,

    /// Event-loop wait while viewers are connected (default: 15 ms)
    pub active_wait: Duration,

    /// Event-loop wait while no viewer is connected (default: 1000 ms)
    ///
    /// Inflating the wait keeps an idle server from burning battery on
    /// capture passes nobody sees.
    pub idle_wait: Duration,

    /// Base interval added to every event-loop wait (default: 5 ms)
    pub defer_interval: Duration,

    /// Dirty-rectangle cap per diff pass (default: 64)
    pub max_rects: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5901,
            password: None,
            reverse_host: None,
            rotation: Rotation::Deg0,
            scale: ScaleFactor::default(),
            compat_flip: false,
            active_wait: Duration::from_millis(15),
            idle_wait: Duration::from_millis(1000),
            defer_interval: Duration::from_millis(5),
            max_rects: 64,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Validate configuration and return any issues
    ///
    /// Returns `Ok(())` if configuration is valid, or a list of issues.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.port == 0 {
            issues.push("port must be non-zero".to_string());
        }

        if self.active_wait.is_zero() {
            issues.push("active_wait must be non-zero".to_string());
        }

        if self.idle_wait < self.active_wait {
            issues.push("idle_wait must not be shorter than active_wait".to_string());
        }

        if self.max_rects == 0 {
            issues.push("max_rects must be at least 1".to_string());
        }

        if let Some(ref host) = self.reverse_host {
            if !host.contains(':') {
                issues.push("reverse_host must be host:port".to_string());
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Builder for [`ServerConfig`]
///
/// Provides a fluent interface for constructing configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    port: Option<u16>,
    password: Option<String>,
    reverse_host: Option<String>,
    rotation: Option<Rotation>,
    scale: Option<ScaleFactor>,
    compat_flip: Option<bool>,
    active_wait: Option<Duration>,
    idle_wait: Option<Duration>,
    defer_interval: Option<Duration>,
    max_rects: Option<usize>,
}

impl ServerConfigBuilder {
    /// Set the listening port
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the access password
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the reverse-connection target (`host:port`)
    #[must_use]
    pub fn reverse_host(mut self, host: impl Into<String>) -> Self {
        self.reverse_host = Some(host.into());
        self
    }

    /// Set the startup rotation
    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Set the client-presented scale
    #[must_use]
    pub fn scale(mut self, scale: ScaleFactor) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Enable the 180° display compatibility flip
    #[must_use]
    pub fn compat_flip(mut self, enable: bool) -> Self {
        self.compat_flip = Some(enable);
        self
    }

    /// Set the active-mode event-loop wait
    #[must_use]
    pub fn active_wait(mut self, wait: Duration) -> Self {
        self.active_wait = Some(wait);
        self
    }

    /// Set the idle-mode event-loop wait
    #[must_use]
    pub fn idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = Some(wait);
        self
    }

    /// Set the base interval added to every wait
    #[must_use]
    pub fn defer_interval(mut self, interval: Duration) -> Self {
        self.defer_interval = Some(interval);
        self
    }

    /// Set the dirty-rectangle cap
    #[must_use]
    pub fn max_rects(mut self, cap: usize) -> Self {
        self.max_rects = Some(cap);
        self
    }

    /// Build the configuration
    ///
    /// Returns a [`ServerConfig`] with builder values overriding defaults.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();

        ServerConfig {
            port: self.port.unwrap_or(defaults.port),
            password: self.password.or(defaults.password),
            reverse_host: self.reverse_host.or(defaults.reverse_host),
            rotation: self.rotation.unwrap_or(defaults.rotation),
            scale: self.scale.unwrap_or(defaults.scale),
            compat_flip: self.compat_flip.unwrap_or(defaults.compat_flip),
            active_wait: self.active_wait.unwrap_or(defaults.active_wait),
            idle_wait: self.idle_wait.unwrap_or(defaults.idle_wait),
            defer_interval: self.defer_interval.unwrap_or(defaults.defer_interval),
            max_rects: self.max_rects.unwrap_or(defaults.max_rects),
        }
    }
}
