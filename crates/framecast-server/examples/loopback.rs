//! Loopback demo: drives the full serving pipeline against an in-memory
//! screen and a sink that prints what a viewer would receive.
//!
//! Run with: cargo run --example loopback

use std::time::Duration;

use framecast_frame::{
    DeviceSurface, DirtyRect, PixelBuffer, PixelFormatProfile, ViewportGeometry,
};
use framecast_server::{
    CaptureSource, ProtocolSink, Result, ScaleFactor, ScreenFormat, ServerConfig, ServerLifecycle,
    ShutdownFlag,
};

/// A synthetic 240x320 screen with a square that moves one step per frame.
struct BouncingSquare {
    frame: u32,
}

impl CaptureSource for BouncingSquare {
    fn init_capture(&mut self) -> Result<ScreenFormat> {
        Ok(ScreenFormat {
            profile: PixelFormatProfile::rgb565(),
            surface: DeviceSurface::unpadded(240, 320),
        })
    }

    fn acquire_frame(
        &mut self,
        current: &mut PixelBuffer,
        geometry: &ViewportGeometry,
    ) -> Result<()> {
        for j in 0..320 {
            for i in 0..240 {
                current.put_pixel(geometry.map_to_viewport(i, j), 0x0000);
            }
        }

        let offset = (self.frame * 8) % 200;
        for j in offset..offset + 16 {
            for i in offset..offset + 16 {
                current.put_pixel(geometry.map_to_viewport(i, j), 0xF800);
            }
        }

        self.frame += 1;
        Ok(())
    }

    fn close_capture(&mut self) {
        println!("capture released");
    }
}

struct PrintingSink;

impl ProtocolSink for PrintingSink {
    fn publish_dirty_regions(&mut self, regions: &[DirtyRect]) {
        for rect in regions {
            println!(
                "  update {}x{} at ({}, {})",
                rect.width, rect.height, rect.x, rect.y
            );
        }
    }

    fn on_client_connect(&mut self, scale: ScaleFactor) -> ScaleFactor {
        scale
    }

    fn mark_clients_pending_resize(&mut self) {
        println!("  viewers marked for resize");
    }

    fn run_event_loop(&mut self, _max_wait: Duration) -> bool {
        false
    }

    fn client_count(&self) -> usize {
        1
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = ServerConfig::builder()
        .active_wait(Duration::from_millis(1))
        .build();

    let mut server = ServerLifecycle::start(
        config,
        BouncingSquare { frame: 0 },
        PrintingSink,
        ShutdownFlag::new(),
    )?;

    println!(
        "serving {}x{} viewport",
        server.geometry().width(),
        server.geometry().height()
    );

    for cycle in 0..5 {
        println!("cycle {cycle}:");
        server.run_cycle()?;
    }

    println!("rotating to 90°");
    server.set_rotation(90)?;
    println!(
        "viewport now {}x{}",
        server.geometry().width(),
        server.geometry().height()
    );
    server.run_cycle()?;

    Ok(())
}
