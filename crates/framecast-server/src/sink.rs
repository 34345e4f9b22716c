//! Protocol Sink Seam
//!
//! The wire-level remote-display engine (handshake, encoding, auth,
//! transport) is an external collaborator behind this trait. The core drives
//! it with exactly five operations: publish dirty rectangles, hook new
//! connections for scaling, mark viewers for framebuffer-size
//! renegotiation, pump its event loop with a bounded wait, and report the
//! connected-viewer count.
//!
//! Transient I/O trouble is the sink's own business; the only effect the
//! core ever sees is a viewer count of zero for that cycle. The core carries
//! no retry logic.

use std::time::Duration;

use framecast_frame::DirtyRect;

use crate::scale::ScaleFactor;

/// The remote-display protocol engine
pub trait ProtocolSink {
    /// Announce changed rectangles to all connected viewers
    ///
    /// Rectangles are in viewport coordinates and arrive in scan order.
    /// Never called with an empty set.
    fn publish_dirty_regions(&mut self, regions: &[DirtyRect]);

    /// Hook a new viewer connection
    ///
    /// The serving loop calls this once for every newly observed viewer.
    /// `scale` is the client-presented scale in effect; the sink returns
    /// the scale it actually applied (a sink may refuse scaling and answer
    /// with identity).
    fn on_client_connect(&mut self, scale: ScaleFactor) -> ScaleFactor;

    /// Mark every connected viewer's framebuffer size as pending
    /// renegotiation
    ///
    /// Called when the viewport axis family changes, before the next
    /// publish.
    fn mark_clients_pending_resize(&mut self);

    /// Service connection accepts and viewer I/O for at most `max_wait`
    ///
    /// Returns whether any I/O occurred.
    fn run_event_loop(&mut self, max_wait: Duration) -> bool;

    /// Number of currently connected viewers
    fn client_count(&self) -> usize;
}
