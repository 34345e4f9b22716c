//! Rotation and Viewport Geometry
//!
//! Maps captured pixels from device coordinate space into the viewport the
//! remote viewers see. Three things compose here:
//!
//! - the device surface, which may be padded and offset relative to the
//!   logical screen (hardware framebuffers often are),
//! - the requested rotation angle (0/90/180/270),
//! - an independent 180° compatibility flip for device quirks.
//!
//! Rotation requests are either absolute or "advance by 90°". Both funnel
//! into [`ViewportGeometry::apply_rotation`], the single place where the
//! axis-family swap and stride recomputation happen, so the resize/full-frame
//! invariant is enforced exactly once.
//!
//! # Examples
//!
//! ```rust
//! use framecast_frame::{PixelDepth, Rotation, RotationRequest, ViewportGeometry};
//!
//! let mut geo = ViewportGeometry::new(240, 320, Rotation::Deg0, false, PixelDepth::Bpp16);
//! assert_eq!((geo.width(), geo.height()), (240, 320));
//!
//! // 0 -> 90 crosses axis families: the viewport transposes
//! let outcome = geo.apply_rotation(RotationRequest::Advance);
//! assert!(outcome.family_swapped);
//! assert_eq!((geo.width(), geo.height()), (320, 240));
//! ```

use thiserror::Error;
use tracing::debug;

use crate::format::PixelDepth;

/// Errors raised by geometry handling
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// A requested absolute rotation is not a multiple-of-90 angle
    ///
    /// Recovered locally: the request is ignored and prior state retained.
    #[error("invalid rotation angle: {0} degrees (expected 0, 90, 180 or 270)")]
    InvalidAngle(u16),
}

/// Rotation angle of the viewport relative to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// No rotation
    Deg0,
    /// 90° clockwise
    Deg90,
    /// 180°
    Deg180,
    /// 270° clockwise
    Deg270,
}

/// Grouping of rotation angles sharing a width/height orientation
///
/// {0, 180} keep the device orientation; {90, 270} transpose it. Crossing
/// families is what forces a viewport resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisFamily {
    /// Angles 0 and 180: viewport matches device orientation
    Upright,
    /// Angles 90 and 270: viewport width/height are transposed
    Transposed,
}

impl Rotation {
    /// Validate a raw angle in degrees
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidAngle`] for anything outside
    /// {0, 90, 180, 270}. No state is touched by a failed validation.
    pub fn from_degrees(degrees: u16) -> Result<Self, GeometryError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(GeometryError::InvalidAngle(other)),
        }
    }

    /// Angle in degrees
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Next 90° step, wrapping at 360
    #[must_use]
    pub const fn advanced(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// This angle composed with a 180° turn
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg180,
            Self::Deg90 => Self::Deg270,
            Self::Deg180 => Self::Deg0,
            Self::Deg270 => Self::Deg90,
        }
    }

    /// Axis family of this angle
    #[must_use]
    pub const fn axis_family(self) -> AxisFamily {
        match self {
            Self::Deg0 | Self::Deg180 => AxisFamily::Upright,
            Self::Deg90 | Self::Deg270 => AxisFamily::Transposed,
        }
    }

    /// Whether the viewport width/height are the device height/width
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self.axis_family(), AxisFamily::Transposed)
    }
}

/// A rotation request from configuration or a runtime command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationRequest {
    /// Set the angle to an absolute value
    Absolute(Rotation),
    /// Advance to the next 90° step, wrapping at 360
    Advance,
}

/// Result of committing a rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Angle before the request
    pub previous: Rotation,

    /// Angle now committed
    pub rotation: Rotation,

    /// Whether the axis family changed (viewport width/height swapped)
    ///
    /// When set, connected viewers need a framebuffer-size renegotiation
    /// before the next publish.
    pub family_swapped: bool,
}

/// The physical capture surface, possibly larger than the logical screen
///
/// Device framebuffers commonly pad each row and offset the visible area
/// within a larger virtual surface. Capture reads address *device virtual
/// pixels* through [`DeviceSurface::virtual_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSurface {
    /// Logical screen width in pixels
    pub width: u32,

    /// Logical screen height in pixels
    pub height: u32,

    /// Extra pixels per row beyond the logical width
    pub row_padding: u32,

    /// Horizontal offset of the visible area within the surface
    pub x_offset: u32,

    /// Vertical offset of the visible area within the surface
    pub y_offset: u32,
}

impl DeviceSurface {
    /// A surface with no padding or offset
    #[must_use]
    pub const fn unpadded(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            row_padding: 0,
            x_offset: 0,
            y_offset: 0,
        }
    }

    /// Row length in pixels including padding
    #[must_use]
    pub const fn padded_width(&self) -> u32 {
        self.width + self.row_padding
    }

    /// Index of logical pixel (i, j) within the padded surface
    #[must_use]
    pub const fn virtual_index(&self, i: u32, j: u32) -> usize {
        (j + self.y_offset) as usize * self.padded_width() as usize + (i + self.x_offset) as usize
    }
}

/// The logical geometry exposed to remote viewers
///
/// Mutated only between cycles; a single diff/publish pass always observes
/// one consistent geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGeometry {
    width: u32,
    height: u32,
    rotation: Rotation,
    compat_flip: bool,
    depth: PixelDepth,
    stride_bytes: u32,
}

impl ViewportGeometry {
    /// Build the viewport for a device screen under a startup rotation
    ///
    /// A 90°/270° startup rotation serves a transposed viewport from the
    /// first frame.
    #[must_use]
    pub fn new(
        device_width: u32,
        device_height: u32,
        rotation: Rotation,
        compat_flip: bool,
        depth: PixelDepth,
    ) -> Self {
        let (width, height) = if rotation.swaps_axes() {
            (device_height, device_width)
        } else {
            (device_width, device_height)
        };

        Self {
            width,
            height,
            rotation,
            compat_flip,
            depth,
            stride_bytes: width * depth.bytes_per_pixel() as u32,
        }
    }

    /// Viewport width in pixels
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Viewport height in pixels
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Committed rotation angle
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Whether the 180° compatibility flip is active
    #[must_use]
    pub const fn compat_flip(&self) -> bool {
        self.compat_flip
    }

    /// Bytes per viewport row
    #[must_use]
    pub const fn stride_bytes(&self) -> u32 {
        self.stride_bytes
    }

    /// Total viewport pixel count
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Rotation actually applied to pixel coordinates
    ///
    /// The compatibility flip composes as an extra 180° turn.
    #[must_use]
    pub const fn effective_rotation(&self) -> Rotation {
        if self.compat_flip {
            self.rotation.flipped()
        } else {
            self.rotation
        }
    }

    /// Commit a rotation request
    ///
    /// The single transition point: when the request crosses axis families
    /// the stored width/height swap and the row stride is recomputed. The
    /// caller resizes the frame pair and marks viewers pending-renegotiation
    /// when [`RotationOutcome::family_swapped`] is set, and forces a
    /// full-frame dirty region in every case.
    pub fn apply_rotation(&mut self, request: RotationRequest) -> RotationOutcome {
        let previous = self.rotation;
        let target = match request {
            RotationRequest::Absolute(rotation) => rotation,
            RotationRequest::Advance => previous.advanced(),
        };

        let family_swapped = target.axis_family() != previous.axis_family();
        if family_swapped {
            std::mem::swap(&mut self.width, &mut self.height);
            self.stride_bytes = self.width * self.depth.bytes_per_pixel() as u32;
        }
        self.rotation = target;

        debug!(
            "Rotation {} -> {} (family swap: {})",
            previous.degrees(),
            target.degrees(),
            family_swapped
        );

        RotationOutcome {
            previous,
            rotation: target,
            family_swapped,
        }
    }

    /// Map a device pixel (i, j) to its linear index in the viewport buffer
    ///
    /// (i, j) address the device's logical screen; the result indexes the
    /// viewport-space pixel array. For 90/270 the transposition direction
    /// differs (clockwise vs counter-clockwise reflection).
    #[must_use]
    pub fn map_to_viewport(&self, i: u32, j: u32) -> usize {
        // Device logical dimensions, recovered from the viewport orientation
        let (dev_w, dev_h) = if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };

        let (i, j, dev_w, dev_h) = (i as usize, j as usize, dev_w as usize, dev_h as usize);

        match self.effective_rotation() {
            Rotation::Deg0 => j * dev_w + i,
            Rotation::Deg180 => (dev_h - 1 - j) * dev_w + (dev_w - 1 - i),
            Rotation::Deg90 => i * dev_h + (dev_h - 1 - j),
            Rotation::Deg270 => (dev_w - 1 - i) * dev_h + j,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Ok(Rotation::Deg0));
        assert_eq!(Rotation::from_degrees(270), Ok(Rotation::Deg270));
        assert_eq!(
            Rotation::from_degrees(45),
            Err(GeometryError::InvalidAngle(45))
        );
        assert_eq!(
            Rotation::from_degrees(360),
            Err(GeometryError::InvalidAngle(360))
        );
    }

    #[test]
    fn test_rotation_advance_wraps() {
        let mut rotation = Rotation::Deg0;
        for expected in [90, 180, 270, 0] {
            rotation = rotation.advanced();
            assert_eq!(rotation.degrees(), expected);
        }
    }

    #[test]
    fn test_axis_families() {
        assert_eq!(Rotation::Deg0.axis_family(), AxisFamily::Upright);
        assert_eq!(Rotation::Deg180.axis_family(), AxisFamily::Upright);
        assert_eq!(Rotation::Deg90.axis_family(), AxisFamily::Transposed);
        assert_eq!(Rotation::Deg270.axis_family(), AxisFamily::Transposed);
    }

    #[test]
    fn test_device_surface_indexing() {
        let surface = DeviceSurface {
            width: 240,
            height: 320,
            row_padding: 16,
            x_offset: 8,
            y_offset: 2,
        };

        assert_eq!(surface.padded_width(), 256);
        assert_eq!(surface.virtual_index(0, 0), 2 * 256 + 8);
        assert_eq!(surface.virtual_index(10, 5), 7 * 256 + 18);

        let plain = DeviceSurface::unpadded(240, 320);
        assert_eq!(plain.virtual_index(10, 5), 5 * 240 + 10);
    }

    #[test]
    fn test_viewport_new_transposed_start() {
        let geo = ViewportGeometry::new(240, 320, Rotation::Deg90, false, PixelDepth::Bpp16);
        assert_eq!((geo.width(), geo.height()), (320, 240));
        assert_eq!(geo.stride_bytes(), 320 * 2);
    }

    #[test]
    fn test_family_swap_on_apply() {
        let mut geo = ViewportGeometry::new(240, 320, Rotation::Deg0, false, PixelDepth::Bpp16);

        // 0 -> 180: same family, no swap
        let outcome = geo.apply_rotation(RotationRequest::Absolute(Rotation::Deg180));
        assert!(!outcome.family_swapped);
        assert_eq!((geo.width(), geo.height()), (240, 320));

        // 180 -> 270: family change, swap and stride recompute
        let outcome = geo.apply_rotation(RotationRequest::Absolute(Rotation::Deg270));
        assert!(outcome.family_swapped);
        assert_eq!((geo.width(), geo.height()), (320, 240));
        assert_eq!(geo.stride_bytes(), 320 * 2);

        // 270 -> 90: same family again
        let outcome = geo.apply_rotation(RotationRequest::Absolute(Rotation::Deg90));
        assert!(!outcome.family_swapped);
        assert_eq!((geo.width(), geo.height()), (320, 240));
    }

    #[test]
    fn test_advance_request() {
        let mut geo = ViewportGeometry::new(100, 50, Rotation::Deg270, false, PixelDepth::Bpp32);
        let outcome = geo.apply_rotation(RotationRequest::Advance);
        assert_eq!(outcome.rotation, Rotation::Deg0);
        assert!(outcome.family_swapped);
        assert_eq!((geo.width(), geo.height()), (100, 50));
    }

    #[test]
    fn test_identity_mapping() {
        let geo = ViewportGeometry::new(4, 3, Rotation::Deg0, false, PixelDepth::Bpp8);
        assert_eq!(geo.map_to_viewport(0, 0), 0);
        assert_eq!(geo.map_to_viewport(3, 2), 11);
        assert_eq!(geo.map_to_viewport(1, 1), 5);
    }

    #[test]
    fn test_180_mapping_reverses_both_axes() {
        let geo = ViewportGeometry::new(4, 3, Rotation::Deg180, false, PixelDepth::Bpp8);
        assert_eq!(geo.map_to_viewport(0, 0), 11);
        assert_eq!(geo.map_to_viewport(3, 2), 0);

        // The compatibility flip alone behaves as a 180
        let flipped = ViewportGeometry::new(4, 3, Rotation::Deg0, true, PixelDepth::Bpp8);
        assert_eq!(flipped.map_to_viewport(0, 0), 11);

        // Flip on top of 180 cancels back to identity
        let both = ViewportGeometry::new(4, 3, Rotation::Deg180, true, PixelDepth::Bpp8);
        assert_eq!(both.map_to_viewport(0, 0), 0);
    }

    #[test]
    fn test_rotation_90_bijection() {
        let (w, h) = (5u32, 7u32);
        let geo = ViewportGeometry::new(w, h, Rotation::Deg90, false, PixelDepth::Bpp8);

        let mut seen = vec![false; (w * h) as usize];
        for j in 0..h {
            for i in 0..w {
                let idx = geo.map_to_viewport(i, j);
                assert!(!seen[idx], "destination {idx} hit twice");
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|&hit| hit));
    }

    #[test]
    fn test_rotation_270_inverts_90() {
        // Map through 90, then push the destination pixel through the 270
        // transform of the transposed device: it must land on the original
        // row-major index.
        let (w, h) = (5u32, 7u32);
        let forward = ViewportGeometry::new(w, h, Rotation::Deg90, false, PixelDepth::Bpp8);
        let backward = ViewportGeometry::new(h, w, Rotation::Deg270, false, PixelDepth::Bpp8);

        for j in 0..h {
            for i in 0..w {
                let idx = forward.map_to_viewport(i, j);
                let (x, y) = (idx as u32 % forward.width(), idx as u32 / forward.width());
                assert_eq!(backward.map_to_viewport(x, y), (j * w + i) as usize);
            }
        }
    }

    #[test]
    fn test_invalid_angle_leaves_no_trace() {
        // Validation happens before any state exists to mutate
        let result = Rotation::from_degrees(91);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid rotation angle: 91 degrees (expected 0, 90, 180 or 270)"
        );
    }
}
