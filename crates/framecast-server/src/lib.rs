//! # Framecast Server
//!
//! The serving half of the screen-mirroring pipeline: configuration, the
//! single-threaded capture→diff→publish loop, viewer-count backoff, and the
//! connect-time scaling policy.
//!
//! Platform specifics stay outside the crate behind two seams:
//!
//! - [`CaptureSource`]: the screen grabber (initialize, fill one frame per
//!   cycle, release)
//! - [`ProtocolSink`]: the remote-display protocol engine (publish
//!   rectangles, hook connections, pump I/O)
//!
//! The [`ServerLifecycle`] wires those to the diff core from
//! [`framecast_frame`] and runs until a [`ShutdownFlag`] is triggered or a
//! fatal error occurs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use framecast_server::{ServerConfig, ServerLifecycle, ShutdownFlag};
//!
//! let shutdown = ShutdownFlag::new();
//! let config = ServerConfig::builder().port(5901).build();
//!
//! let mut server = ServerLifecycle::start(config, capture, sink, shutdown)?;
//! server.run()?;
//! # Ok::<(), framecast_server::ServerError>(())
//! ```

#![warn(missing_docs)]

pub mod capture;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod scale;
pub mod sink;
pub mod state;

pub use capture::{CaptureSource, ScreenFormat};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{Result, ServerError};
pub use lifecycle::ServerLifecycle;
pub use scale::{ScaleFactor, ScalingAdvertiser};
pub use sink::ProtocolSink;
pub use state::{ActivityMode, ServerState, ShutdownFlag};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }
}
