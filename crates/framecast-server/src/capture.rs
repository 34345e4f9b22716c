//! Capture Source Seam
//!
//! The platform-specific screen grabber lives behind this trait. The core
//! only needs three things from it: the native format at startup, a
//! completed frame in the current buffer each cycle, and a clean release on
//! every exit path (including fatal ones).
//!
//! The handoff is a strict alternation: the core calls
//! [`CaptureSource::acquire_frame`] and only reads the buffer after the call
//! returns; the source must not touch the buffer outside that call. Sources
//! that run their own acquisition thread internally still present this
//! single-writer/single-reader contract per cycle.
//!
//! Implementations that read a padded/offset hardware surface translate
//! coordinates with [`DeviceSurface::virtual_index`] on the read side and
//! [`ViewportGeometry::map_to_viewport`] on the write side, so the current
//! buffer always holds viewport-oriented pixels.
//!
//! [`DeviceSurface::virtual_index`]: framecast_frame::DeviceSurface::virtual_index
//! [`ViewportGeometry::map_to_viewport`]: framecast_frame::ViewportGeometry::map_to_viewport

use framecast_frame::{DeviceSurface, PixelBuffer, PixelFormatProfile, ViewportGeometry};

use crate::error::Result;

/// Native capture format reported at startup
#[derive(Debug, Clone, Copy)]
pub struct ScreenFormat {
    /// Pixel depth and channel layout
    pub profile: PixelFormatProfile,

    /// The physical surface the frames come from
    pub surface: DeviceSurface,
}

/// A platform screen grabber
pub trait CaptureSource {
    /// Initialize the grabber and report the native format
    ///
    /// Called exactly once, before any buffer exists.
    ///
    /// # Errors
    ///
    /// Initialization failures are fatal; the server will not start.
    fn init_capture(&mut self) -> Result<ScreenFormat>;

    /// Write one completed frame into `current`
    ///
    /// `geometry` carries the viewport orientation the pixels must land in.
    /// The buffer is never read while this call is in progress.
    ///
    /// # Errors
    ///
    /// A failed acquisition skips the cycle; the next scheduled cycle tries
    /// again.
    fn acquire_frame(&mut self, current: &mut PixelBuffer, geometry: &ViewportGeometry)
        -> Result<()>;

    /// Release the grabber
    ///
    /// Called on every exit path, normal or fatal. Must be idempotent.
    fn close_capture(&mut self);
}
