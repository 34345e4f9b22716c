//! # framecast-frame
//!
//! Pixel buffer model, rotation transforms, and per-depth dirty-region
//! detection for screen mirroring.
//!
//! This crate is the algorithmic core of the
//! [framecast](https://github.com/framecast/framecast) workspace: it owns the
//! current/reference buffer pair, decides which pixels changed between
//! captures, and maps device coordinates into the rotated viewport presented
//! to remote viewers. It knows nothing about wire protocols or capture
//! hardware; [`framecast-server`](https://crates.io/crates/framecast-server)
//! wires it to those collaborators.
//!
//! # Features
//!
//! - **Current/Reference Pair**: two geometry-locked pixel buffers with a
//!   pending full-frame mark for geometry changes
//! - **Per-Depth Comparison**: 8/16/32 bpp diff passes selected once at
//!   startup, branch-free per pixel
//! - **Row-Bound Rectangles**: changed pixels collapse into merged dirty
//!   rectangles with a cap-and-fall-back bound on fragmentation
//! - **Rotation Transforms**: 0/90/180/270 device-to-viewport mapping with a
//!   180° compatibility flip and padded/offset device surfaces
//!
//! # Quick Start
//!
//! ```rust
//! use framecast_frame::{
//!     DiffConfig, DiffEngine, FramePair, PixelDepth, Rotation, ViewportGeometry,
//! };
//!
//! # fn main() -> Result<(), framecast_frame::BufferError> {
//! let geometry = ViewportGeometry::new(240, 320, Rotation::Deg0, false, PixelDepth::Bpp16);
//! let mut pair = FramePair::new(geometry.width(), geometry.height(), PixelDepth::Bpp16)?;
//! let engine = DiffEngine::new(PixelDepth::Bpp16, DiffConfig::default());
//!
//! // The first pass covers everything: nothing has been published yet
//! let rects = engine.run(&mut pair, &geometry);
//! assert_eq!(rects.len(), 1);
//!
//! // Capture writes into pair.current_mut() between passes...
//! pair.current_mut().put_pixel(5 * 240 + 5, 0xF800);
//! let rects = engine.run(&mut pair, &geometry);
//! assert!(rects[0].contains(5, 5));
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! ```text
//! ┌────────────────────┐
//! │  capture source    │  writes a completed frame
//! │  (collaborator)    │  into the current buffer
//! └─────────┬──────────┘
//!           ▼
//! ┌────────────────────┐
//! │  FramePair         │ ◄── geometry-locked current + reference
//! └─────────┬──────────┘
//!           ▼
//! ┌────────────────────┐
//! │  DiffEngine        │ ◄── per-depth row scan, rectangle merge,
//! │  (row bounds)      │     reference update side effect
//! └─────────┬──────────┘
//!           ▼
//! ┌────────────────────┐
//! │  Vec<DirtyRect>    │ ◄── published to the protocol sink
//! └────────────────────┘
//! ```
//!
//! # Concurrency
//!
//! Everything here is synchronous and single-threaded by design: a diff pass
//! never suspends mid-comparison, and geometry is mutated only between
//! passes. The capture source and the core alternate strictly on the current
//! buffer; they never touch it concurrently.

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod buffer;
pub mod diff;
pub mod format;
pub mod geometry;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

// Buffer types
pub use buffer::{BufferError, FramePair, PixelBuffer};

// Diff types
pub use diff::{DiffConfig, DiffEngine, DirtyRect};

// Format types
pub use format::{ChannelLayout, FormatError, PixelDepth, PixelFormatProfile};

// Geometry types
pub use geometry::{
    AxisFamily, DeviceSurface, GeometryError, Rotation, RotationOutcome, RotationRequest,
    ViewportGeometry,
};

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

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
    fn test_reexports() {
        let _ = DiffConfig::default();
        let _ = Rotation::from_degrees(90);
    }
}
