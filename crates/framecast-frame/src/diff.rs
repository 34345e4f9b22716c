//! Dirty-Region Detection
//!
//! Compares the current frame against the reference and emits the set of
//! rectangles covering every changed pixel. Rows are scanned top to bottom;
//! within a row the pixel words are compared directly (the word-equality
//! test doubles as the cheap skip over unchanged spans) and the changed
//! columns collapse into a single `[min_x, max_x]` bound per row. Row bounds
//! that overlap or abut the rectangle growing on the previous row merge into
//! it; anything else closes the open rectangle and starts a new one.
//!
//! Comparison granularity differs by pixel word size, so the pass is a
//! generic routine instantiated at 8/16/32 bpp. [`DiffEngine::new`] selects
//! the instantiation once at startup and stores it as a function pointer;
//! the per-pixel inner loop stays branch-free on depth.
//!
//! Two escape hatches bound the work:
//!
//! - a pending geometry change bypasses comparison entirely and yields one
//!   full-frame rectangle (the reference is meaningless under the new
//!   geometry),
//! - when the rectangle count would exceed the configured cap, the partial
//!   rectangles are discarded in favour of one full-frame rectangle to bound
//!   protocol overhead.
//!
//! In every case the reference buffer is updated to match the current buffer
//! for all positions that were compared, so an unchanged follow-up frame
//! produces an empty region set.

use tracing::debug;

use crate::buffer::FramePair;
use crate::format::PixelDepth;
use crate::geometry::ViewportGeometry;

/// A rectangle of changed pixels in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    /// X coordinate of top-left corner
    pub x: u32,

    /// Y coordinate of top-left corner
    pub y: u32,

    /// Rectangle width
    pub width: u32,

    /// Rectangle height
    pub height: u32,
}

impl DirtyRect {
    /// Create a dirty rectangle
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering an entire viewport
    #[must_use]
    pub const fn full_frame(geometry: &ViewportGeometry) -> Self {
        Self::new(0, 0, geometry.width(), geometry.height())
    }

    /// Area in pixels
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the rectangle contains the pixel (x, y)
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Tuning knobs for the diff pass
#[derive(Debug, Clone, Copy)]
pub struct DiffConfig {
    /// Maximum rectangles per pass before falling back to one full-frame
    /// rectangle (default: 64)
    ///
    /// Each published rectangle carries protocol overhead; past this point a
    /// single full update is cheaper than the fragments.
    pub max_rects: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { max_rects: 64 }
    }
}

/// One pixel word of the comparison loop
///
/// Reads go through `from_ne_bytes` so the storage stays plain bytes and the
/// crate stays free of unsafe.
trait PixelWord: Copy + Eq {
    const BYTES: usize;

    fn read(bytes: &[u8], index: usize) -> Self;
}

impl PixelWord for u8 {
    const BYTES: usize = 1;

    #[inline(always)]
    fn read(bytes: &[u8], index: usize) -> Self {
        bytes[index]
    }
}

impl PixelWord for u16 {
    const BYTES: usize = 2;

    #[inline(always)]
    fn read(bytes: &[u8], index: usize) -> Self {
        let offset = index * 2;
        Self::from_ne_bytes([bytes[offset], bytes[offset + 1]])
    }
}

impl PixelWord for u32 {
    const BYTES: usize = 4;

    #[inline(always)]
    fn read(bytes: &[u8], index: usize) -> Self {
        let offset = index * 4;
        Self::from_ne_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }
}

/// Signature of a depth-specialized diff pass
type DiffFn = fn(&mut FramePair, &ViewportGeometry, &DiffConfig) -> Vec<DirtyRect>;

/// The comparison engine, specialized at construction time
///
/// Holds the per-depth pass as a stored function reference so no per-pixel
/// depth branching happens during comparison.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine {
    config: DiffConfig,
    pass: DiffFn,
}

impl DiffEngine {
    /// Select the comparator for a pixel depth
    #[must_use]
    pub fn new(depth: PixelDepth, config: DiffConfig) -> Self {
        let pass: DiffFn = match depth {
            PixelDepth::Bpp8 => diff_pass::<u8>,
            PixelDepth::Bpp16 => diff_pass::<u16>,
            PixelDepth::Bpp32 => diff_pass::<u32>,
        };

        Self { config, pass }
    }

    /// Run one comparison pass
    ///
    /// Returns the ordered dirty rectangles (possibly empty). As a side
    /// effect the pair's reference buffer is updated to equal the current
    /// buffer for every compared position.
    pub fn run(&self, pair: &mut FramePair, geometry: &ViewportGeometry) -> Vec<DirtyRect> {
        (self.pass)(pair, geometry, &self.config)
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &DiffConfig {
        &self.config
    }
}

/// A rectangle still growing across consecutive rows
struct OpenRect {
    min_x: u32,
    max_x: u32,
    top: u32,
    bottom: u32,
}

impl OpenRect {
    fn close(self) -> DirtyRect {
        DirtyRect::new(
            self.min_x,
            self.top,
            self.max_x - self.min_x + 1,
            self.bottom - self.top + 1,
        )
    }

    /// Whether a bound on row `y` continues this rectangle
    fn accepts(&self, y: u32, min_x: u32, max_x: u32) -> bool {
        self.bottom + 1 == y && min_x <= self.max_x + 1 && self.min_x <= max_x + 1
    }
}

/// Copy the whole current buffer over the reference
fn sync_reference(pair: &mut FramePair) {
    let (current, reference) = pair.diff_parts();
    reference.as_bytes_mut().copy_from_slice(current.as_bytes());
}

fn diff_pass<P: PixelWord>(
    pair: &mut FramePair,
    geometry: &ViewportGeometry,
    config: &DiffConfig,
) -> Vec<DirtyRect> {
    let (width, height) = (geometry.width(), geometry.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    if pair.take_full_frame_pending() {
        sync_reference(pair);
        return vec![DirtyRect::full_frame(geometry)];
    }

    let (current, reference) = pair.diff_parts();
    let cur = current.as_bytes();

    let mut rects: Vec<DirtyRect> = Vec::new();
    let mut open: Option<OpenRect> = None;
    let mut capped = false;

    'rows: for y in 0..height {
        let row_base = (y as usize) * (width as usize);

        // Row bound: [min_x, max_x] of changed pixels on this row
        let mut bound: Option<(u32, u32)> = None;
        for x in 0..width {
            let index = row_base + x as usize;
            if P::read(cur, index) != P::read(reference.as_bytes(), index) {
                match bound {
                    None => bound = Some((x, x)),
                    Some((min_x, _)) => bound = Some((min_x, x)),
                }
            }
        }

        if let Some((min_x, max_x)) = bound {
            // Bring the reference up to date for the changed span
            let from = (row_base + min_x as usize) * P::BYTES;
            let to = (row_base + max_x as usize + 1) * P::BYTES;
            reference.as_bytes_mut()[from..to].copy_from_slice(&cur[from..to]);

            open = match open.take() {
                Some(mut acc) if acc.accepts(y, min_x, max_x) => {
                    acc.min_x = acc.min_x.min(min_x);
                    acc.max_x = acc.max_x.max(max_x);
                    acc.bottom = y;
                    Some(acc)
                }
                prior => {
                    if let Some(acc) = prior {
                        rects.push(acc.close());
                        if rects.len() > config.max_rects {
                            capped = true;
                            break 'rows;
                        }
                    }
                    Some(OpenRect {
                        min_x,
                        max_x,
                        top: y,
                        bottom: y,
                    })
                }
            };
        } else if let Some(acc) = open.take() {
            rects.push(acc.close());
            if rects.len() > config.max_rects {
                capped = true;
                break 'rows;
            }
        }
    }

    if let Some(acc) = open.take() {
        rects.push(acc.close());
        if rects.len() > config.max_rects {
            capped = true;
        }
    }

    if capped {
        // Too fragmented: one full update is cheaper than the pieces
        debug!(
            "Rectangle cap ({}) exceeded, publishing full frame",
            config.max_rects
        );
        sync_reference(pair);
        return vec![DirtyRect::full_frame(geometry)];
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(width: u32, height: u32, depth: PixelDepth) -> (FramePair, ViewportGeometry) {
        let mut pair = FramePair::new(width, height, depth).expect("pair");
        // Start from a published state
        let _ = pair.take_full_frame_pending();
        let geometry = ViewportGeometry::new(
            width,
            height,
            crate::geometry::Rotation::Deg0,
            false,
            depth,
        );
        (pair, geometry)
    }

    fn engine(depth: PixelDepth) -> DiffEngine {
        DiffEngine::new(depth, DiffConfig::default())
    }

    #[test]
    fn test_dirty_rect_basics() {
        let rect = DirtyRect::new(10, 20, 100, 50);
        assert_eq!(rect.area(), 5000);
        assert!(rect.contains(10, 20));
        assert!(rect.contains(109, 69));
        assert!(!rect.contains(110, 69));
        assert!(!rect.contains(0, 0));
    }

    #[test]
    fn test_identical_frames_yield_nothing() {
        let (mut pair, geometry) = pair(64, 64, PixelDepth::Bpp32);
        let rects = engine(PixelDepth::Bpp32).run(&mut pair, &geometry);
        assert!(rects.is_empty());
    }

    #[test]
    fn test_zero_area_emits_nothing() {
        let (mut pair, geometry) = pair(0, 0, PixelDepth::Bpp16);
        // Even with the full-frame mark pending
        pair.mark_full_frame_pending();
        let rects = engine(PixelDepth::Bpp16).run(&mut pair, &geometry);
        assert!(rects.is_empty());
    }

    #[test]
    fn test_single_block_change() {
        let (mut pair, geometry) = pair(32, 32, PixelDepth::Bpp16);
        for y in 5..15 {
            for x in 5..15 {
                pair.current_mut().put_pixel(y * 32 + x, 0xF800);
            }
        }

        let rects = engine(PixelDepth::Bpp16).run(&mut pair, &geometry);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0], DirtyRect::new(5, 5, 10, 10));
    }

    #[test]
    fn test_idempotence() {
        let (mut pair, geometry) = pair(32, 32, PixelDepth::Bpp8);
        pair.current_mut().put_pixel(100, 0xAA);

        let engine = engine(PixelDepth::Bpp8);
        let first = engine.run(&mut pair, &geometry);
        assert_eq!(first.len(), 1);

        let second = engine.run(&mut pair, &geometry);
        assert!(second.is_empty(), "reference not synced: {second:?}");
    }

    #[test]
    fn test_completeness() {
        let (mut pair, geometry) = pair(48, 48, PixelDepth::Bpp32);

        // Scatter changes in a few places
        let changed = [(0, 0), (47, 0), (3, 10), (40, 10), (20, 30), (47, 47)];
        for &(x, y) in &changed {
            pair.current_mut().put_pixel(y * 48 + x, 0x00FF_00FF);
        }

        let rects = engine(PixelDepth::Bpp32).run(&mut pair, &geometry);
        for &(x, y) in &changed {
            assert!(
                rects.iter().any(|r| r.contains(x as u32, y as u32)),
                "pixel ({x}, {y}) not covered by {rects:?}"
            );
        }
    }

    #[test]
    fn test_separated_changes_in_one_row_share_a_bound() {
        let (mut pair, geometry) = pair(32, 8, PixelDepth::Bpp8);
        pair.current_mut().put_pixel(2 * 32 + 3, 1);
        pair.current_mut().put_pixel(2 * 32 + 28, 1);

        let rects = engine(PixelDepth::Bpp8).run(&mut pair, &geometry);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0], DirtyRect::new(3, 2, 26, 1));
    }

    #[test]
    fn test_disjoint_row_runs_close_rectangles() {
        let (mut pair, geometry) = pair(16, 16, PixelDepth::Bpp8);
        // Two vertical bars with a clean gap of rows between them
        for y in 0..4 {
            pair.current_mut().put_pixel(y * 16 + 2, 1);
        }
        for y in 8..12 {
            pair.current_mut().put_pixel(y * 16 + 10, 1);
        }

        let rects = engine(PixelDepth::Bpp8).run(&mut pair, &geometry);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], DirtyRect::new(2, 0, 1, 4));
        assert_eq!(rects[1], DirtyRect::new(10, 8, 1, 4));
    }

    #[test]
    fn test_adjacent_rows_with_distant_bounds_split() {
        // Row 0 changes on the far left, row 1 on the far right: the x-ranges
        // neither overlap nor abut, so two rectangles come out.
        let (mut pair, geometry) = pair(32, 4, PixelDepth::Bpp8);
        pair.current_mut().put_pixel(0, 1);
        pair.current_mut().put_pixel(32 + 30, 1);

        let rects = engine(PixelDepth::Bpp8).run(&mut pair, &geometry);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], DirtyRect::new(0, 0, 1, 1));
        assert_eq!(rects[1], DirtyRect::new(30, 1, 1, 1));
    }

    #[test]
    fn test_pending_geometry_change_bypasses_comparison() {
        let (mut pair, geometry) = pair(16, 16, PixelDepth::Bpp16);
        pair.mark_full_frame_pending();

        // No actual pixel difference, yet one full-frame rect comes out
        let engine = engine(PixelDepth::Bpp16);
        let rects = engine.run(&mut pair, &geometry);
        assert_eq!(rects, vec![DirtyRect::new(0, 0, 16, 16)]);

        // The mark is consumed
        let rects = engine.run(&mut pair, &geometry);
        assert!(rects.is_empty());
    }

    #[test]
    fn test_rect_cap_falls_back_to_full_frame() {
        let width = 8u32;
        let height = 64u32;
        let (mut pair, geometry) = pair(width, height, PixelDepth::Bpp8);

        // A change on every other row: each becomes its own rectangle
        for y in (0..height).step_by(2) {
            pair.current_mut().put_pixel((y * width) as usize, 1);
        }

        let engine = DiffEngine::new(PixelDepth::Bpp8, DiffConfig { max_rects: 8 });
        let rects = engine.run(&mut pair, &geometry);
        assert_eq!(rects, vec![DirtyRect::new(0, 0, width, height)]);

        // The fallback still syncs the reference completely
        let rects = engine.run(&mut pair, &geometry);
        assert!(rects.is_empty());
    }

    #[test]
    fn test_cap_boundary_is_inclusive() {
        let width = 8u32;
        let (mut pair, geometry) = pair(width, 16, PixelDepth::Bpp8);

        // Exactly four disjoint rectangles
        for y in [0u32, 4, 8, 12] {
            pair.current_mut().put_pixel((y * width) as usize, 1);
        }

        let engine = DiffEngine::new(PixelDepth::Bpp8, DiffConfig { max_rects: 4 });
        let rects = engine.run(&mut pair, &geometry);
        assert_eq!(rects.len(), 4);
    }

    #[test]
    fn test_word_granularity_at_16bpp() {
        let (mut pair, geometry) = pair(8, 8, PixelDepth::Bpp16);
        // Change only the high byte of one pixel word
        pair.current_mut().put_pixel(9, 0x0100);

        let rects = engine(PixelDepth::Bpp16).run(&mut pair, &geometry);
        assert_eq!(rects.len(), 1);
        assert!(rects[0].contains(1, 1));
    }
}
