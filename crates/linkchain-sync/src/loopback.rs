use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::trace;

use linkchain_protocol::MAX_FRAME_SIZE;

use crate::error::{SyncError, SyncResult};
use crate::transport::FrameTransport;

/// In-process broadcast medium.
///
/// Every [`LoopbackTransport`] attached to a hub receives every frame
/// broadcast by the others, never its own, mirroring a shared link segment.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    ports: Arc<Mutex<HubPorts>>,
}

#[derive(Default)]
struct HubPorts {
    next_id: u64,
    senders: Vec<(u64, Sender<Vec<u8>>)>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new transport to the hub.
    pub fn attach(&self, device: impl Into<String>) -> LoopbackTransport {
        let (tx, rx) = mpsc::channel();
        let mut ports = self.lock();
        let id = ports.next_id;
        ports.next_id += 1;
        ports.senders.push((id, tx));
        LoopbackTransport {
            id,
            device: device.into(),
            hub: self.clone(),
            inbox: Mutex::new(rx),
        }
    }

    /// Deliver `frame` to every attached transport, as a peer outside the
    /// process would. Returns the number of transports reached.
    pub fn inject(&self, frame: &[u8]) -> usize {
        self.deliver(None, frame)
    }

    pub fn port_count(&self) -> usize {
        self.lock().senders.len()
    }

    fn deliver(&self, from: Option<u64>, frame: &[u8]) -> usize {
        let mut ports = self.lock();
        let mut reached = 0;
        ports.senders.retain(|(id, tx)| {
            if Some(*id) == from {
                return true;
            }
            // A closed channel means the transport was dropped.
            let delivered = tx.send(frame.to_vec()).is_ok();
            if delivered {
                reached += 1;
            }
            delivered
        });
        reached
    }

    fn detach(&self, id: u64) {
        self.lock().senders.retain(|(port, _)| *port != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubPorts> {
        // The port table stays consistent across a panicking holder.
        self.ports.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One endpoint on a [`LoopbackHub`].
pub struct LoopbackTransport {
    id: u64,
    device: String,
    hub: LoopbackHub,
    inbox: Mutex<Receiver<Vec<u8>>>,
}

impl FrameTransport for LoopbackTransport {
    fn device(&self) -> &str {
        &self.device
    }

    fn broadcast(&self, frame: &[u8]) -> SyncResult<()> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(SyncError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        let reached = self.hub.deliver(Some(self.id), frame);
        trace!(device = %self.device, bytes = frame.len(), reached, "loopback broadcast");
        Ok(())
    }

    fn receive_next(&self, timeout: Duration) -> SyncResult<Option<Vec<u8>>> {
        let inbox = self.inbox.lock().map_err(|_| SyncError::TransportClosed)?;
        match inbox.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SyncError::TransportClosed),
        }
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.hub.detach(self.id);
    }
}
