//! Client-Presented Scaling
//!
//! Viewers can be handed a scaled-down (or slightly scaled-up) virtual
//! screen at connect time. The scale is a pure presentation transform owned
//! by the protocol/encoding layer: the diff engine always operates at native
//! geometry, and no pixel buffer ever changes size because of it.
//!
//! # Examples
//!
//! ```rust
//! use framecast_server::{ScaleFactor, ScalingAdvertiser};
//!
//! // Out-of-range inputs normalize to 100 rather than failing
//! assert_eq!(ScaleFactor::normalize(75).percent(), 75);
//! assert_eq!(ScaleFactor::normalize(151).percent(), 100);
//! assert_eq!(ScaleFactor::normalize(-5).percent(), 100);
//!
//! let advertiser = ScalingAdvertiser::new(ScaleFactor::normalize(50));
//! assert_eq!(advertiser.advertised_size(240, 320), Some((120, 160)));
//! ```

use tracing::{info, warn};

/// Integer scale percentage in [1, 150]
///
/// Constructed through [`ScaleFactor::normalize`], which clamps anything
/// outside the accepted range to 100 (no scaling) instead of rejecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor(u16);

impl ScaleFactor {
    /// Smallest accepted percentage
    pub const MIN: u16 = 1;

    /// Largest accepted percentage
    pub const MAX: u16 = 150;

    /// Identity scale
    pub const IDENTITY: Self = Self(100);

    /// Normalize a requested percentage
    ///
    /// Values in [1, 150] pass through unchanged; everything else (including
    /// zero and negatives) becomes 100.
    #[must_use]
    pub fn normalize(percent: i32) -> Self {
        if (i32::from(Self::MIN)..=i32::from(Self::MAX)).contains(&percent) {
            Self(percent as u16)
        } else {
            warn!("Scale {}% out of range, using 100%", percent);
            Self::IDENTITY
        }
    }

    /// The percentage value
    #[must_use]
    pub const fn percent(self) -> u16 {
        self.0
    }

    /// Whether this scale leaves the screen size untouched
    #[must_use]
    pub const fn is_identity(self) -> bool {
        self.0 == 100
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Computes the virtual screen presented to a newly connected viewer
///
/// At each connect, if the configured scale is not 100%, the protocol layer
/// is asked to present `floor(native * scale / 100)` in each dimension to
/// that viewer. Everything past the size computation (rescaling encoded
/// pixels) belongs to the protocol engine.
#[derive(Debug, Clone, Copy)]
pub struct ScalingAdvertiser {
    scale: ScaleFactor,
}

impl ScalingAdvertiser {
    /// Create an advertiser for a configured scale
    #[must_use]
    pub const fn new(scale: ScaleFactor) -> Self {
        Self { scale }
    }

    /// The configured scale
    #[must_use]
    pub const fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// Virtual screen size for a viewer, or `None` at identity scale
    ///
    /// `None` means the viewer should see the native geometry and no scaling
    /// setup is needed.
    #[must_use]
    pub fn advertised_size(&self, native_width: u32, native_height: u32) -> Option<(u32, u32)> {
        if self.scale.is_identity() {
            return None;
        }

        let percent = u64::from(self.scale.percent());
        let width = (u64::from(native_width) * percent / 100) as u32;
        let height = (u64::from(native_height) * percent / 100) as u32;

        info!(
            "Scaling viewer to {}x{} ({}%)",
            width,
            height,
            self.scale.percent()
        );
        Some((width, height))
    }
}
