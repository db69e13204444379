use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use linkchain_ledger::Entry;
use linkchain_protocol::GossipCodec;

use crate::error::SyncResult;
use crate::transport::FrameTransport;

/// Publishes committed entries to peers.
///
/// Fire-and-forget: a failed send is logged and counted but never rolls back
/// the local commit. Peers that miss an entry will reject its successors as
/// forks until they catch up on their own.
pub struct Broadcaster {
    transport: Arc<dyn FrameTransport>,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Broadcaster {
    pub fn new(transport: Arc<dyn FrameTransport>) -> Self {
        Self {
            transport,
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Encode `entry` and broadcast it as one frame.
    pub fn publish(&self, entry: &Entry) -> SyncResult<()> {
        let result = GossipCodec::encode(entry)
            .map_err(Into::into)
            .and_then(|frame| self.transport.broadcast(&frame));

        match &result {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                trace!(index = entry.index(), device = self.transport.device(), "entry broadcast");
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(index = entry.index(), error = %e, "broadcast failed");
            }
        }
        result
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Start the `gossip-publisher` thread and return the queue feeding it.
    ///
    /// Entries are published in the order they were enqueued. The thread
    /// drains whatever is queued and exits once every [`Outbox`] clone has
    /// been dropped.
    pub fn spawn_publisher(self: Arc<Self>) -> io::Result<(Outbox, JoinHandle<()>)> {
        let (tx, rx) = mpsc::channel::<Entry>();
        let handle = thread::Builder::new()
            .name("gossip-publisher".into())
            .spawn(move || {
                for entry in rx {
                    self.publish(&entry).ok();
                }
                debug!(sent = self.sent(), failed = self.failed(), "publisher drained");
            })?;
        Ok((Outbox { tx }, handle))
    }
}

/// Ordered queue in front of a publisher thread.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Entry>,
}

impl Outbox {
    /// Queue `entry` for broadcast. Returns `false` if the publisher is gone.
    pub fn enqueue(&self, entry: &Entry) -> bool {
        self.tx.send(entry.clone()).is_ok()
    }
}
