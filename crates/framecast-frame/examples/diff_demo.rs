//! Dirty-region detection walkthrough
//!
//! Builds a small 16-bit frame pair, paints a few changes into the current
//! buffer, and prints the rectangles the diff engine reports. Also shows the
//! full-frame fallback after a rotation.

use framecast_frame::{
    DiffConfig, DiffEngine, FramePair, PixelDepth, Rotation, RotationRequest, ViewportGeometry,
};

fn main() {
    println!("framecast-frame v{}", framecast_frame::VERSION);
    println!();

    let mut geometry = ViewportGeometry::new(240, 320, Rotation::Deg0, false, PixelDepth::Bpp16);
    let mut pair = FramePair::new(geometry.width(), geometry.height(), PixelDepth::Bpp16)
        .expect("buffer allocation");
    let engine = DiffEngine::new(PixelDepth::Bpp16, DiffConfig::default());

    // First pass always covers the whole viewport
    let rects = engine.run(&mut pair, &geometry);
    println!("Initial pass: {rects:?}");

    // Paint a 10x10 block at (5, 5)
    for y in 5..15u32 {
        for x in 5..15u32 {
            pair.current_mut()
                .put_pixel((y * geometry.width() + x) as usize, 0xF800);
        }
    }
    let rects = engine.run(&mut pair, &geometry);
    println!("After painting a block: {rects:?}");

    // Nothing changed since: empty set
    let rects = engine.run(&mut pair, &geometry);
    println!("Unchanged frame: {rects:?}");

    // Rotating to 90 degrees swaps the viewport and forces a full frame
    let outcome = geometry.apply_rotation(RotationRequest::Absolute(Rotation::Deg90));
    if outcome.family_swapped {
        pair.resize(geometry.width(), geometry.height())
            .expect("buffer allocation");
    }
    pair.mark_full_frame_pending();

    let rects = engine.run(&mut pair, &geometry);
    println!(
        "After rotating to {}°: viewport {}x{}, {rects:?}",
        geometry.rotation().degrees(),
        geometry.width(),
        geometry.height()
    );
}
