//! Pixel Buffers and the Current/Reference Pair
//!
//! Two buffers back the capture-diff-publish pipeline: *current* receives
//! each freshly captured frame and *reference* holds the last state known to
//! viewers. The pair always shares identical geometry and format; every
//! resize goes through [`FramePair`] so the invariant cannot be broken from
//! outside.
//!
//! Allocation is fallible. Mirroring a screen without backing storage is
//! impossible, so callers treat an allocation error as fatal, but the error
//! is surfaced as a value rather than an abort so the capture source can be
//! released first.

use thiserror::Error;
use tracing::debug;

use crate::format::PixelDepth;

/// Errors raised by pixel buffer management
#[derive(Error, Debug)]
pub enum BufferError {
    /// Backing storage for a buffer could not be allocated
    ///
    /// Fatal: the pipeline cannot run without the current/reference pair.
    #[error("pixel buffer allocation of {bytes} bytes failed")]
    Allocation {
        /// Requested allocation size
        bytes: usize,
        /// Underlying reservation failure
        #[source]
        source: std::collections::TryReserveError,
    },
}

/// A contiguous pixel array at a fixed geometry and depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    depth: PixelDepth,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer for `width` x `height` pixels
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Allocation`] when backing storage cannot be
    /// reserved.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self, BufferError> {
        let bytes = width as usize * height as usize * depth.bytes_per_pixel();

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|source| BufferError::Allocation { bytes, source })?;
        data.resize(bytes, 0);

        Ok(Self {
            width,
            height,
            depth,
            data,
        })
    }

    /// Buffer width in pixels
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel word size
    #[must_use]
    pub const fn depth(&self) -> PixelDepth {
        self.depth
    }

    /// Total pixel count
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw byte view of the pixel storage
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw byte view of the pixel storage
    ///
    /// The capture source writes completed frames through this view between
    /// cycles; the strict alternation contract means nobody reads while it
    /// writes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of the pixel at linear index `index`
    #[must_use]
    pub const fn byte_offset(&self, index: usize) -> usize {
        index * self.depth.bytes_per_pixel()
    }

    /// Write one pixel word at linear index `index`
    ///
    /// Only the low `depth.bits()` bits of `value` are stored.
    pub fn put_pixel(&mut self, index: usize, value: u32) {
        let offset = self.byte_offset(index);
        let bpp = self.depth.bytes_per_pixel();
        self.data[offset..offset + bpp].copy_from_slice(&value.to_ne_bytes()[..bpp]);
    }

    /// Read one pixel word at linear index `index`, widened to u32
    #[must_use]
    pub fn get_pixel(&self, index: usize) -> u32 {
        let offset = self.byte_offset(index);
        let bpp = self.depth.bytes_per_pixel();
        let mut word = [0u8; 4];
        word[..bpp].copy_from_slice(&self.data[offset..offset + bpp]);
        u32::from_ne_bytes(word)
    }
}

/// The current/reference buffer pair
///
/// Owns both buffers and the pending full-frame mark. The mark is set when
/// the reference buffer stops being meaningful (startup, rotation, resize)
/// and consumed by the next diff pass, which then skips comparison and
/// reports the whole viewport as dirty.
#[derive(Debug)]
pub struct FramePair {
    current: PixelBuffer,
    reference: PixelBuffer,
    full_frame_pending: bool,
}

impl FramePair {
    /// Allocate a pair of identical buffers
    ///
    /// The pair starts with the full-frame mark set: nothing has been
    /// published yet, so the first pass must cover everything.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Allocation`] when either buffer cannot be
    /// allocated.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self, BufferError> {
        Ok(Self {
            current: PixelBuffer::new(width, height, depth)?,
            reference: PixelBuffer::new(width, height, depth)?,
            full_frame_pending: true,
        })
    }

    /// Shared geometry of the pair
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.current.width(), self.current.height())
    }

    /// Pixel word size of the pair
    #[must_use]
    pub const fn depth(&self) -> PixelDepth {
        self.current.depth()
    }

    /// The freshly captured frame
    #[must_use]
    pub fn current(&self) -> &PixelBuffer {
        &self.current
    }

    /// Mutable access to the capture target
    pub fn current_mut(&mut self) -> &mut PixelBuffer {
        &mut self.current
    }

    /// The last state known to viewers
    #[must_use]
    pub fn reference(&self) -> &PixelBuffer {
        &self.reference
    }

    /// Split borrow for a diff pass: read current, update reference
    pub fn diff_parts(&mut self) -> (&PixelBuffer, &mut PixelBuffer) {
        (&self.current, &mut self.reference)
    }

    /// Mark the reference as stale, forcing a full-frame region next pass
    pub fn mark_full_frame_pending(&mut self) {
        self.full_frame_pending = true;
    }

    /// Consume the pending full-frame mark
    pub fn take_full_frame_pending(&mut self) -> bool {
        std::mem::take(&mut self.full_frame_pending)
    }

    /// Reallocate both buffers for a new geometry
    ///
    /// Used when a rotation swaps the viewport axis family. Both buffers are
    /// rebuilt together so the geometry-equality invariant holds at every
    /// observable point, and the full-frame mark is set because the old
    /// reference content is meaningless under the new geometry.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Allocation`] when reallocation fails; the pair
    /// is left unchanged in that case.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), BufferError> {
        let depth = self.depth();
        let current = PixelBuffer::new(width, height, depth)?;
        let reference = PixelBuffer::new(width, height, depth)?;

        debug!(
            "Frame pair resized {}x{} -> {}x{}",
            self.current.width(),
            self.current.height(),
            width,
            height
        );

        self.current = current;
        self.reference = reference;
        self.full_frame_pending = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_allocation() {
        let buf = PixelBuffer::new(240, 320, PixelDepth::Bpp16).expect("buffer");
        assert_eq!(buf.width(), 240);
        assert_eq!(buf.height(), 320);
        assert_eq!(buf.pixel_count(), 240 * 320);
        assert_eq!(buf.as_bytes().len(), 240 * 320 * 2);
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_area_buffer() {
        let buf = PixelBuffer::new(0, 0, PixelDepth::Bpp32).expect("buffer");
        assert_eq!(buf.pixel_count(), 0);
        assert!(buf.as_bytes().is_empty());
    }

    #[test]
    fn test_pixel_round_trip() {
        let mut buf = PixelBuffer::new(4, 4, PixelDepth::Bpp16).expect("buffer");
        buf.put_pixel(5, 0xBEEF);
        assert_eq!(buf.get_pixel(5), 0xBEEF);
        assert_eq!(buf.get_pixel(4), 0);

        let mut buf8 = PixelBuffer::new(4, 4, PixelDepth::Bpp8).expect("buffer");
        buf8.put_pixel(0, 0x1FF);
        // Only the low 8 bits fit the word
        assert_eq!(buf8.get_pixel(0), 0xFF);
    }

    #[test]
    fn test_pair_geometry_invariant() {
        let pair = FramePair::new(100, 50, PixelDepth::Bpp32).expect("pair");
        assert_eq!(pair.current().width(), pair.reference().width());
        assert_eq!(pair.current().height(), pair.reference().height());
        assert_eq!(pair.size(), (100, 50));
    }

    #[test]
    fn test_pair_starts_full_frame_pending() {
        let mut pair = FramePair::new(10, 10, PixelDepth::Bpp8).expect("pair");
        assert!(pair.take_full_frame_pending());
        assert!(!pair.take_full_frame_pending());

        pair.mark_full_frame_pending();
        assert!(pair.take_full_frame_pending());
    }

    #[test]
    fn test_pair_resize() {
        let mut pair = FramePair::new(240, 320, PixelDepth::Bpp16).expect("pair");
        let _ = pair.take_full_frame_pending();

        pair.resize(320, 240).expect("resize");
        assert_eq!(pair.size(), (320, 240));
        assert_eq!(pair.current().width(), pair.reference().width());
        // Resize invalidates the reference
        assert!(pair.take_full_frame_pending());
    }
}
