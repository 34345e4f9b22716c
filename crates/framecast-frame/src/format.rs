//! Pixel Format Description
//!
//! Describes the native capture format: bits per pixel and the bit layout of
//! each colour channel. The profile is established once at startup from the
//! device framebuffer metadata and never changes afterwards; the depth picks
//! which specialized comparison routine runs for the rest of the process
//! lifetime.
//!
//! # Examples
//!
//! ```rust
//! use framecast_frame::{PixelDepth, PixelFormatProfile};
//!
//! // RGB 5:6:5, the common 16-bit device framebuffer layout
//! let profile = PixelFormatProfile::rgb565();
//! assert_eq!(profile.depth, PixelDepth::Bpp16);
//! assert_eq!(profile.red.max_value(), 31);
//!
//! // Depths outside {8, 16, 32} are rejected at the edge
//! assert!(PixelDepth::from_bits(24).is_err());
//! ```

use thiserror::Error;

/// Errors raised while establishing the pixel format
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// The capture surface reports a bit depth the comparison engine has no
    /// specialization for. Fatal at startup: no comparator can be selected.
    #[error("unsupported pixel depth: {0} bpp (supported: 8, 16, 32)")]
    UnsupportedDepth(u32),
}

/// Supported pixel word sizes
///
/// Comparison granularity and channel extraction differ by word size, so the
/// depth is a closed enum rather than a raw integer. Construct from device
/// metadata with [`PixelDepth::from_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelDepth {
    /// 8 bits per pixel
    Bpp8,
    /// 16 bits per pixel
    Bpp16,
    /// 32 bits per pixel
    Bpp32,
}

impl PixelDepth {
    /// Validate a raw bits-per-pixel value from device metadata
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnsupportedDepth`] for anything outside
    /// {8, 16, 32}.
    pub fn from_bits(bits: u32) -> Result<Self, FormatError> {
        match bits {
            8 => Ok(Self::Bpp8),
            16 => Ok(Self::Bpp16),
            32 => Ok(Self::Bpp32),
            other => Err(FormatError::UnsupportedDepth(other)),
        }
    }

    /// Bits per pixel
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bpp8 => 8,
            Self::Bpp16 => 16,
            Self::Bpp32 => 32,
        }
    }

    /// Bytes per pixel
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bpp8 => 1,
            Self::Bpp16 => 2,
            Self::Bpp32 => 4,
        }
    }
}

/// Bit layout of a single colour channel within a pixel word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLayout {
    /// Number of bits occupied by the channel
    pub width: u8,

    /// Bit offset of the channel within the pixel word
    pub shift: u8,
}

impl ChannelLayout {
    /// Create a channel layout
    #[must_use]
    pub const fn new(width: u8, shift: u8) -> Self {
        Self { width, shift }
    }

    /// Maximum value the channel can hold (`2^width - 1`)
    ///
    /// Widths of 32 or more saturate to `u32::MAX`; device metadata is not
    /// validated per channel, so an absurd reported width must not overflow
    /// the shift.
    #[must_use]
    pub const fn max_value(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }
}

/// Native capture format: depth plus per-channel layout
///
/// Immutable after startup. The protocol layer consumes the channel layout
/// verbatim when advertising the server format to viewers; the diff engine
/// only cares about [`PixelFormatProfile::depth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatProfile {
    /// Pixel word size
    pub depth: PixelDepth,

    /// Red channel layout
    pub red: ChannelLayout,

    /// Green channel layout
    pub green: ChannelLayout,

    /// Blue channel layout
    pub blue: ChannelLayout,

    /// Alpha channel layout (width 0 when the surface has no alpha)
    pub alpha: ChannelLayout,

    /// Whether the format is direct colour (no palette indirection)
    pub true_color: bool,
}

impl PixelFormatProfile {
    /// Build a profile from raw device framebuffer metadata
    ///
    /// Channel tuples are `(width, shift)` as reported by the capture
    /// surface.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnsupportedDepth`] when `bits` is not one of
    /// the supported word sizes.
    pub fn from_device(
        bits: u32,
        red: (u8, u8),
        green: (u8, u8),
        blue: (u8, u8),
        alpha: (u8, u8),
    ) -> Result<Self, FormatError> {
        Ok(Self {
            depth: PixelDepth::from_bits(bits)?,
            red: ChannelLayout::new(red.0, red.1),
            green: ChannelLayout::new(green.0, green.1),
            blue: ChannelLayout::new(blue.0, blue.1),
            alpha: ChannelLayout::new(alpha.0, alpha.1),
            true_color: true,
        })
    }

    /// RGB 5:6:5 at 16 bpp, the most common device framebuffer layout
    #[must_use]
    pub const fn rgb565() -> Self {
        Self {
            depth: PixelDepth::Bpp16,
            red: ChannelLayout::new(5, 11),
            green: ChannelLayout::new(6, 5),
            blue: ChannelLayout::new(5, 0),
            alpha: ChannelLayout::new(0, 0),
            true_color: true,
        }
    }

    /// XRGB 8:8:8:8 at 32 bpp
    #[must_use]
    pub const fn xrgb8888() -> Self {
        Self {
            depth: PixelDepth::Bpp32,
            red: ChannelLayout::new(8, 16),
            green: ChannelLayout::new(8, 8),
            blue: ChannelLayout::new(8, 0),
            alpha: ChannelLayout::new(0, 24),
            true_color: true,
        }
    }

    /// RGB 3:3:2 at 8 bpp
    #[must_use]
    pub const fn rgb332() -> Self {
        Self {
            depth: PixelDepth::Bpp8,
            red: ChannelLayout::new(3, 5),
            green: ChannelLayout::new(3, 2),
            blue: ChannelLayout::new(2, 0),
            alpha: ChannelLayout::new(0, 0),
            true_color: true,
        }
    }
}
