//! # framecast
//!
//! Screen mirroring core: frame capture, change detection, and dirty-region
//! publishing.
//!
//! This crate provides a unified interface to the framecast libraries:
//!
//! - **[`frame`]** - Pixel buffers, rotation geometry, and the dirty-region
//!   diff engine
//! - **[`server`]** - The capture→diff→publish serving loop with idle/active
//!   backoff and the capture/protocol seams
//!
//! # Features
//!
//! All features are enabled by default. You can selectively enable only what
//! you need:
//!
//! ```toml
//! # Use everything (default)
//! framecast = "0.2"
//!
//! # Diff engine only (embedding your own loop)
//! framecast = { version = "0.2", default-features = false, features = ["frame"] }
//! ```
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `frame` | Yes | Pixel buffers, geometry, diff engine |
//! | `server` | Yes | Serving loop and collaborator seams |
//!
//! # Quick Start
//!
//! ## Serving a Screen
//!
//! ```rust,ignore
//! use framecast::server::{ServerConfig, ServerLifecycle, ShutdownFlag};
//!
//! fn main() -> framecast::server::Result<()> {
//!     let shutdown = ShutdownFlag::new();
//!     let config = ServerConfig::builder().port(5901).build();
//!
//!     // `capture` implements CaptureSource for your platform's grabber;
//!     // `sink` implements ProtocolSink over your wire protocol engine.
//!     let mut server = ServerLifecycle::start(config, capture, sink, shutdown)?;
//!     server.run()
//! }
//! ```
//!
//! ## Diffing Frames Directly
//!
//! ```rust
//! use framecast::frame::{DiffConfig, DiffEngine, FramePair, PixelDepth, Rotation, ViewportGeometry};
//!
//! let geometry = ViewportGeometry::new(240, 320, Rotation::Deg0, false, PixelDepth::Bpp16);
//! let mut pair = FramePair::new(240, 320, PixelDepth::Bpp16)?;
//! let engine = DiffEngine::new(PixelDepth::Bpp16, DiffConfig::default());
//!
//! // First pass reports the whole viewport
//! let rects = engine.run(&mut pair, &geometry);
//! assert_eq!(rects.len(), 1);
//! # Ok::<(), framecast::frame::BufferError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                       framecast                       │
//! ├──────────────────────────┬────────────────────────────┤
//! │     framecast-frame      │      framecast-server      │
//! │                          │                            │
//! │  FramePair               │  ServerLifecycle           │
//! │  ViewportGeometry        │  ServerConfig              │
//! │  DiffEngine              │  CaptureSource (trait)     │
//! │  DirtyRect               │  ProtocolSink (trait)      │
//! └────────────┬─────────────┴─────────────┬──────────────┘
//!              │                           │
//!              ▼                           ▼
//!       Pixel comparison          Platform grabber and
//!       and geometry              wire protocol engine
//! ```
//!
//! # Related Crates
//!
//! You can also use the individual crates directly:
//!
//! - [`framecast-frame`](https://crates.io/crates/framecast-frame) - Diff core only
//! - [`framecast-server`](https://crates.io/crates/framecast-server) - Serving loop

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// RE-EXPORTS
// =============================================================================

/// Pixel buffers, rotation geometry, and the dirty-region diff engine.
///
/// This module provides the protocol-agnostic pipeline core:
/// - Current/reference frame pair with fallible allocation
/// - Viewport geometry and rotation transforms
/// - Depth-specialized change detection producing dirty rectangles
///
/// See [`framecast_frame`] documentation for details.
#[cfg(feature = "frame")]
#[cfg_attr(docsrs, doc(cfg(feature = "frame")))]
pub use framecast_frame as frame;

/// The serving loop and its collaborator seams.
///
/// This module provides the orchestration layer:
/// - Single-threaded capture→diff→publish cycles
/// - Idle/active backoff keyed on viewer count
/// - Rotation transitions and connect-time scaling
///
/// See [`framecast_server`] documentation for details.
#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub use framecast_server as server;

// =============================================================================
// PRELUDE - Common types for convenience
// =============================================================================

/// Prelude module with commonly used types.
///
/// ```rust
/// use framecast::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "frame")]
    pub use framecast_frame::{
        DiffConfig, DiffEngine, DirtyRect, FramePair, PixelDepth, Rotation, ViewportGeometry,
    };

    #[cfg(feature = "server")]
    pub use framecast_server::{
        CaptureSource, ProtocolSink, ServerConfig, ServerError, ServerLifecycle, ShutdownFlag,
    };
}
