//! Error types for the serving loop
//!
//! The taxonomy follows the pipeline's failure model: configuration and
//! resource errors are fatal (the server cannot run), geometry errors are
//! recovered locally, and capture hiccups skip a cycle without retry logic.

use thiserror::Error;

use framecast_frame::{BufferError, FormatError, GeometryError};

/// Errors raised by the serving loop
///
/// Use [`ServerError::is_fatal`] to decide between terminating (non-zero
/// exit) and logging-and-continuing.
///
/// # Examples
///
/// ```rust
/// use framecast_server::ServerError;
///
/// let err = ServerError::InvalidRotation(45);
/// assert!(!err.is_fatal());
///
/// let err = ServerError::UnsupportedDepth(24);
/// assert!(err.is_fatal());
/// ```
#[derive(Error, Debug)]
pub enum ServerError {
    /// The capture surface reports an unsupported pixel depth
    ///
    /// Fatal at startup: no comparator exists for this depth. The capture
    /// source is released before the error propagates.
    #[error("unsupported pixel depth: {0} bpp")]
    UnsupportedDepth(u32),

    /// A rotation request named an angle outside {0, 90, 180, 270}
    ///
    /// Recovered locally: the request is ignored, prior state is retained,
    /// and no side effects occur.
    #[error("invalid rotation angle: {0} degrees")]
    InvalidRotation(u16),

    /// The current/reference buffer pair could not be allocated
    ///
    /// Fatal: the pipeline cannot run without backing storage.
    #[error("buffer allocation failed")]
    BufferAllocation(#[from] BufferError),

    /// The capture source failed to initialize or deliver a frame
    ///
    /// Recoverable when it happens mid-run (the cycle is skipped and the
    /// next scheduled cycle tries again); fatal during startup.
    #[error("screen capture failed: {0}")]
    CaptureFailed(String),

    /// The provided configuration is invalid
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for serving-loop operations
pub type Result<T> = std::result::Result<T, ServerError>;

impl ServerError {
    /// Whether this error terminates the process
    ///
    /// Fatal errors exit with non-zero status after the capture source is
    /// released; recoverable ones produce a logged warning and otherwise
    /// invisible continuation.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidRotation(_) | Self::CaptureFailed(_))
    }

    /// Create a capture failure
    ///
    /// Convenience for [`CaptureSource`] implementations reporting grabber
    /// trouble.
    ///
    /// [`CaptureSource`]: crate::capture::CaptureSource
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::CaptureFailed(msg.into())
    }
}

impl From<FormatError> for ServerError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::UnsupportedDepth(bits) => Self::UnsupportedDepth(bits),
        }
    }
}

impl From<GeometryError> for ServerError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InvalidAngle(degrees) => Self::InvalidRotation(degrees),
        }
    }
}
