//! Serving Loop
//!
//! Owns the cadence of capture→diff→publish cycles. Each cycle blocks on
//! the protocol sink's event loop for at most the current wait interval
//! (servicing accepts and viewer I/O), re-observes the viewer count, and
//! either performs a pass or skips the work entirely while idle.
//!
//! Everything runs on one thread. Rotation requests and the shutdown flag
//! are honoured only at cycle boundaries, so a single pass always observes
//! one consistent geometry and cleanup never races in-flight work.
//!
//! On a fatal error ([`ServerError::is_fatal`]) the capture source is
//! released and the error propagates; embeddings map that to a non-zero
//! exit status. A cooperative shutdown releases the capture source and
//! returns `Ok(())` (exit status 0). Dropping the lifecycle releases the
//! capture source as well; `close_capture` is idempotent, so the explicit
//! releases compose with it.
//!
//! # Examples
//!
//! ```rust,ignore
//! use framecast_server::{ServerConfig, ServerLifecycle, ShutdownFlag};
//!
//! let shutdown = ShutdownFlag::new();
//! // Signal handling is the embedding's business; handlers just trigger
//! // the flag and the loop winds down at the next cycle boundary.
//! let mut server = ServerLifecycle::start(
//!     ServerConfig::default(),
//!     platform_capture_source(),
//!     protocol_engine(),
//!     shutdown.clone(),
//! )?;
//!
//! server.run()?;
//! # Ok::<(), framecast_server::ServerError>(())
//! ```

use tracing::{debug, info, warn};

use framecast_frame::{
    DiffConfig, DiffEngine, FramePair, Rotation, RotationRequest, ViewportGeometry,
};

use crate::capture::CaptureSource;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::scale::ScalingAdvertiser;
use crate::sink::ProtocolSink;
use crate::state::{ActivityMode, ServerState, ShutdownFlag};

/// The capture-diff-publish server
///
/// Generic over the two collaborator seams so the pipeline can be driven by
/// any platform grabber and protocol engine (or by mocks under test).
pub struct ServerLifecycle<C: CaptureSource, S: ProtocolSink> {
    config: ServerConfig,
    capture: C,
    sink: S,
    state: ServerState,
    geometry: ViewportGeometry,
    pair: FramePair,
    engine: DiffEngine,
    advertiser: ScalingAdvertiser,
    shutdown: ShutdownFlag,
    known_viewers: usize,
}

impl<C: CaptureSource, S: ProtocolSink> ServerLifecycle<C, S> {
    /// Initialize the pipeline
    ///
    /// Validates configuration, brings up the capture source, sizes the
    /// viewport under the startup rotation, allocates the buffer pair, and
    /// selects the depth-specialized comparator. The pair starts with the
    /// full-frame mark set, so the first pass publishes everything.
    ///
    /// # Errors
    ///
    /// All startup errors are fatal. The capture source is released before
    /// any error propagates.
    pub fn start(
        config: ServerConfig,
        mut capture: C,
        sink: S,
        shutdown: ShutdownFlag,
    ) -> Result<Self> {
        if let Err(issues) = config.validate() {
            return Err(ServerError::InvalidConfig(issues.join(", ")));
        }

        info!("Initializing capture source");
        let format = match capture.init_capture() {
            Ok(format) => format,
            Err(err) => {
                capture.close_capture();
                return Err(err);
            }
        };
        let depth = format.profile.depth;

        let geometry = ViewportGeometry::new(
            format.surface.width,
            format.surface.height,
            config.rotation,
            config.compat_flip,
            depth,
        );

        info!(
            "Serving {}x{} at {} bpp on port {} (rotation {}°)",
            geometry.width(),
            geometry.height(),
            depth.bits(),
            config.port,
            config.rotation.degrees()
        );
        debug!(
            "Channel layout r{}:{} g{}:{} b{}:{}",
            format.profile.red.width,
            format.profile.red.shift,
            format.profile.green.width,
            format.profile.green.shift,
            format.profile.blue.width,
            format.profile.blue.shift
        );

        let pair = match FramePair::new(geometry.width(), geometry.height(), depth) {
            Ok(pair) => pair,
            Err(err) => {
                capture.close_capture();
                return Err(err.into());
            }
        };

        let engine = DiffEngine::new(
            depth,
            DiffConfig {
                max_rects: config.max_rects,
            },
        );

        let state = ServerState::new(&config);
        let advertiser = ScalingAdvertiser::new(config.scale);

        Ok(Self {
            config,
            capture,
            sink,
            state,
            geometry,
            pair,
            engine,
            advertiser,
            shutdown,
            known_viewers: 0,
        })
    }

    /// Set an absolute rotation angle
    ///
    /// # Errors
    ///
    /// [`ServerError::InvalidRotation`] for angles outside
    /// {0, 90, 180, 270}: the request is ignored, no state changes.
    pub fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        let rotation = match Rotation::from_degrees(degrees) {
            Ok(rotation) => rotation,
            Err(err) => {
                warn!("Ignoring rotation request: {err}");
                return Err(err.into());
            }
        };
        self.transition_rotation(RotationRequest::Absolute(rotation))
    }

    /// Advance to the next 90° step, wrapping at 360
    pub fn advance_rotation(&mut self) -> Result<()> {
        self.transition_rotation(RotationRequest::Advance)
    }

    /// The single rotation transition point
    ///
    /// A family swap resizes the buffer pair and marks all viewers for
    /// framebuffer-size renegotiation. Every committed rotation forces a
    /// full-frame region on the next pass, since every pixel moved.
    fn transition_rotation(&mut self, request: RotationRequest) -> Result<()> {
        let outcome = self.geometry.apply_rotation(request);

        if outcome.family_swapped {
            if let Err(err) = self
                .pair
                .resize(self.geometry.width(), self.geometry.height())
            {
                self.capture.close_capture();
                return Err(err.into());
            }
            self.sink.mark_clients_pending_resize();
        }

        self.pair.mark_full_frame_pending();
        self.state.set_rotation(outcome.rotation);

        info!(
            "Rotation {}° -> {}° committed (viewport {}x{})",
            outcome.previous.degrees(),
            outcome.rotation.degrees(),
            self.geometry.width(),
            self.geometry.height()
        );
        Ok(())
    }

    /// Hand each newly observed viewer the current scale
    ///
    /// The sink answers with the scale it actually applied (it may refuse
    /// scaling and present the native geometry); the effective scale is
    /// recorded in the serving state for subsequent connections.
    fn greet_new_viewers(&mut self, connected: usize) {
        while self.known_viewers < connected {
            let effective = self.sink.on_client_connect(self.state.scale());
            self.state.set_scale(effective);
            self.known_viewers += 1;
        }
        self.known_viewers = connected;
    }

    /// One capture→diff→publish pass
    ///
    /// Invoked by [`ServerLifecycle::run`] each active cycle; exposed so
    /// embeddings with their own outer loop can drive the pipeline
    /// directly.
    ///
    /// # Errors
    ///
    /// A capture failure is recoverable (the caller skips the cycle);
    /// anything else is fatal.
    pub fn run_cycle(&mut self) -> Result<()> {
        self.capture
            .acquire_frame(self.pair.current_mut(), &self.geometry)?;

        let regions = self.engine.run(&mut self.pair, &self.geometry);
        if !regions.is_empty() {
            self.sink.publish_dirty_regions(&regions);
        }
        Ok(())
    }

    /// Run until shutdown
    ///
    /// # Errors
    ///
    /// Returns the first fatal error encountered; the capture source has
    /// been released by then. Recoverable errors are logged and the loop
    /// continues.
    pub fn run(&mut self) -> Result<()> {
        info!("Serving loop starting");

        while !self.shutdown.is_triggered() {
            let wait = self.config.defer_interval + self.state.wait_interval();
            let _ = self.sink.run_event_loop(wait);

            let connected = self.sink.client_count();
            self.greet_new_viewers(connected);
            if self.state.observe_clients(connected) == ActivityMode::Idle {
                continue;
            }

            if let Err(err) = self.run_cycle() {
                if err.is_fatal() {
                    self.capture.close_capture();
                    return Err(err);
                }
                warn!("Cycle skipped: {err}");
            }
        }

        info!("Shutdown requested, releasing capture source");
        self.capture.close_capture();
        Ok(())
    }

    /// Current viewport geometry
    #[must_use]
    pub const fn geometry(&self) -> &ViewportGeometry {
        &self.geometry
    }

    /// Serving state (activity mode, wait interval, rotation, scale)
    #[must_use]
    pub const fn state(&self) -> &ServerState {
        &self.state
    }

    /// The connect-time scaling advertiser
    ///
    /// Protocol sink implementations consult this from their new-connection
    /// hook.
    #[must_use]
    pub const fn scaling(&self) -> &ScalingAdvertiser {
        &self.advertiser
    }

    /// Configuration the server was started with
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The protocol sink
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the protocol sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The capture source
    #[must_use]
    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Mutable access to the capture source
    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }
}

impl<C: CaptureSource, S: ProtocolSink> Drop for ServerLifecycle<C, S> {
    fn drop(&mut self) {
        // Covers fatal exits the embedding handles without reaching run().
        // close_capture is idempotent per the trait contract.
        self.capture.close_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use framecast_frame::{DeviceSurface, DirtyRect, PixelBuffer, PixelFormatProfile};

    use crate::capture::ScreenFormat;
    use crate::scale::ScaleFactor;

    struct TestCapture {
        closed: bool,
    }

    impl TestCapture {
        fn new() -> Self {
            Self { closed: false }
        }
    }

    impl CaptureSource for TestCapture {
        fn init_capture(&mut self) -> Result<ScreenFormat> {
            Ok(ScreenFormat {
                profile: PixelFormatProfile::rgb565(),
                surface: DeviceSurface::unpadded(64, 48),
            })
        }

        fn acquire_frame(
            &mut self,
            _current: &mut PixelBuffer,
            _geometry: &ViewportGeometry,
        ) -> Result<()> {
            Ok(())
        }

        fn close_capture(&mut self) {
            self.closed = true;
        }
    }

    #[derive(Default)]
    struct TestSink {
        published: Vec<Vec<DirtyRect>>,
        resize_marks: usize,
        clients: usize,
        connect_scales: Vec<ScaleFactor>,
        connect_response: Option<ScaleFactor>,
        join_after: Option<usize>,
        event_loops_before_shutdown: usize,
        shutdown: Option<ShutdownFlag>,
    }

    impl ProtocolSink for TestSink {
        fn publish_dirty_regions(&mut self, regions: &[DirtyRect]) {
            self.published.push(regions.to_vec());
        }

        fn on_client_connect(&mut self, scale: ScaleFactor) -> ScaleFactor {
            self.connect_scales.push(scale);
            self.connect_response.unwrap_or(scale)
        }

        fn mark_clients_pending_resize(&mut self) {
            self.resize_marks += 1;
        }

        fn run_event_loop(&mut self, _max_wait: Duration) -> bool {
            // A scripted viewer connects after the configured number of loops
            if let Some(remaining) = self.join_after {
                if remaining == 0 {
                    self.clients += 1;
                    self.join_after = None;
                } else {
                    self.join_after = Some(remaining - 1);
                }
            }
            if let Some(ref shutdown) = self.shutdown {
                if self.event_loops_before_shutdown == 0 {
                    shutdown.trigger();
                } else {
                    self.event_loops_before_shutdown -= 1;
                }
            }
            false
        }

        fn client_count(&self) -> usize {
            self.clients
        }
    }

    fn started() -> ServerLifecycle<TestCapture, TestSink> {
        ServerLifecycle::start(
            ServerConfig::default(),
            TestCapture::new(),
            TestSink::default(),
            ShutdownFlag::new(),
        )
        .expect("startup")
    }

    #[test]
    fn test_startup_geometry_and_first_pass() {
        let mut server = started();
        assert_eq!(server.geometry().width(), 64);
        assert_eq!(server.geometry().height(), 48);

        // First pass publishes the whole viewport
        server.run_cycle().expect("cycle");
        assert_eq!(server.sink().published.len(), 1);
        assert_eq!(
            server.sink().published[0],
            vec![DirtyRect::new(0, 0, 64, 48)]
        );

        // Nothing changed: nothing published
        server.run_cycle().expect("cycle");
        assert_eq!(server.sink().published.len(), 1);
    }

    #[test]
    fn test_startup_rotation_transposes_viewport() {
        let config = ServerConfig::builder().rotation(Rotation::Deg90).build();
        let server = ServerLifecycle::start(
            config,
            TestCapture::new(),
            TestSink::default(),
            ShutdownFlag::new(),
        )
        .expect("startup");

        assert_eq!(server.geometry().width(), 48);
        assert_eq!(server.geometry().height(), 64);
    }

    #[test]
    fn test_invalid_rotation_is_rejected_without_side_effects() {
        let mut server = started();
        let before = *server.geometry();

        let err = server.set_rotation(45).expect_err("must reject");
        assert!(matches!(err, ServerError::InvalidRotation(45)));
        assert_eq!(*server.geometry(), before);
        assert_eq!(server.sink().resize_marks, 0);
    }

    #[test]
    fn test_family_swap_marks_viewers_and_forces_full_frame() {
        let mut server = started();
        server.run_cycle().expect("cycle"); // consume the startup mark

        server.set_rotation(90).expect("rotate");
        assert_eq!(server.sink().resize_marks, 1);
        assert_eq!(server.geometry().width(), 48);
        assert_eq!(server.state().rotation(), Rotation::Deg90);

        server.run_cycle().expect("cycle");
        let last = server.sink().published.last().expect("published");
        assert_eq!(last, &vec![DirtyRect::new(0, 0, 48, 64)]);
    }

    #[test]
    fn test_same_family_rotation_skips_resize() {
        let mut server = started();
        server.run_cycle().expect("cycle");

        server.set_rotation(180).expect("rotate");
        assert_eq!(server.sink().resize_marks, 0);
        assert_eq!(server.geometry().width(), 64);

        // Still forces a full-frame publish
        server.run_cycle().expect("cycle");
        let last = server.sink().published.last().expect("published");
        assert_eq!(last, &vec![DirtyRect::new(0, 0, 64, 48)]);
    }

    #[test]
    fn test_advance_rotation_wraps() {
        let mut server = started();
        for expected in [90u16, 180, 270, 0] {
            server.advance_rotation().expect("advance");
            assert_eq!(server.state().rotation().degrees(), expected);
        }
    }

    #[test]
    fn test_run_honours_shutdown_flag() {
        let shutdown = ShutdownFlag::new();
        let sink = TestSink {
            clients: 1,
            event_loops_before_shutdown: 3,
            shutdown: Some(shutdown.clone()),
            ..Default::default()
        };
        let mut server = ServerLifecycle::start(
            ServerConfig::default(),
            TestCapture::new(),
            sink,
            shutdown,
        )
        .expect("startup");

        server.run().expect("clean shutdown");
        // Cycles ran while the flag was clear (first publishes full frame)
        assert!(!server.sink().published.is_empty());
    }

    #[test]
    fn test_idle_skips_capture_work() {
        let shutdown = ShutdownFlag::new();
        let sink = TestSink {
            clients: 0,
            event_loops_before_shutdown: 3,
            shutdown: Some(shutdown.clone()),
            ..Default::default()
        };
        let mut server = ServerLifecycle::start(
            ServerConfig::default(),
            TestCapture::new(),
            sink,
            shutdown,
        )
        .expect("startup");

        server.run().expect("clean shutdown");
        assert!(server.sink().published.is_empty());
        assert_eq!(server.state().mode(), ActivityMode::Idle);
        assert_eq!(
            server.state().wait_interval(),
            server.config().idle_wait
        );
    }

    #[test]
    fn test_new_viewer_is_handed_the_configured_scale() {
        let shutdown = ShutdownFlag::new();
        let sink = TestSink {
            join_after: Some(1),
            event_loops_before_shutdown: 4,
            shutdown: Some(shutdown.clone()),
            ..Default::default()
        };
        let config = ServerConfig::builder()
            .scale(ScaleFactor::normalize(50))
            .build();
        let mut server =
            ServerLifecycle::start(config, TestCapture::new(), sink, shutdown).expect("startup");

        server.run().expect("clean shutdown");

        // Exactly one connection hook for the one viewer that joined
        assert_eq!(
            server.sink().connect_scales,
            vec![ScaleFactor::normalize(50)]
        );
        assert_eq!(server.state().scale(), ScaleFactor::normalize(50));
    }

    #[test]
    fn test_effective_scale_from_sink_is_recorded() {
        let shutdown = ShutdownFlag::new();
        let sink = TestSink {
            join_after: Some(0),
            // The sink refuses scaling and answers with identity
            connect_response: Some(ScaleFactor::IDENTITY),
            event_loops_before_shutdown: 3,
            shutdown: Some(shutdown.clone()),
            ..Default::default()
        };
        let config = ServerConfig::builder()
            .scale(ScaleFactor::normalize(75))
            .build();
        let mut server =
            ServerLifecycle::start(config, TestCapture::new(), sink, shutdown).expect("startup");

        server.run().expect("clean shutdown");

        assert_eq!(server.sink().connect_scales, vec![ScaleFactor::normalize(75)]);
        assert_eq!(server.state().scale(), ScaleFactor::IDENTITY);
    }

    #[test]
    fn test_drop_releases_capture() {
        struct SignallingCapture(Rc<Cell<bool>>);

        impl CaptureSource for SignallingCapture {
            fn init_capture(&mut self) -> Result<ScreenFormat> {
                Ok(ScreenFormat {
                    profile: PixelFormatProfile::rgb565(),
                    surface: DeviceSurface::unpadded(8, 8),
                })
            }

            fn acquire_frame(
                &mut self,
                _current: &mut PixelBuffer,
                _geometry: &ViewportGeometry,
            ) -> Result<()> {
                Ok(())
            }

            fn close_capture(&mut self) {
                self.0.set(true);
            }
        }

        let closed = Rc::new(Cell::new(false));
        let server = ServerLifecycle::start(
            ServerConfig::default(),
            SignallingCapture(Rc::clone(&closed)),
            TestSink::default(),
            ShutdownFlag::new(),
        )
        .expect("startup");

        assert!(!closed.get());
        drop(server);
        assert!(closed.get());
    }

    #[test]
    fn test_invalid_config_fails_startup() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let result = ServerLifecycle::start(
            config,
            TestCapture::new(),
            TestSink::default(),
            ShutdownFlag::new(),
        );
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));
    }
}
