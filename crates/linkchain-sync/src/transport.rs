use std::time::Duration;

use crate::error::SyncResult;

/// Link-layer frame transport bound to one device.
///
/// Frames are opaque byte buffers no larger than the link MTU. Opening a
/// transport binds it to its device; an unknown device or missing privilege
/// surfaces as [`SyncError::TransportUnavailable`] at open time.
///
/// [`SyncError::TransportUnavailable`]: crate::SyncError::TransportUnavailable
pub trait FrameTransport: Send + Sync {
    /// Name of the bound device.
    fn device(&self) -> &str;

    /// Send `frame` to every peer on the link.
    fn broadcast(&self, frame: &[u8]) -> SyncResult<()>;

    /// Wait up to `timeout` for the next frame from a peer.
    ///
    /// Returns `Ok(None)` if nothing arrived in time.
    fn receive_next(&self, timeout: Duration) -> SyncResult<Option<Vec<u8>>>;
}
