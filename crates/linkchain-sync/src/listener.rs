use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use linkchain_ledger::{LedgerError, LedgerReader, LedgerWriter, RejectReason, TipRef};
use linkchain_protocol::{GossipCodec, ProtocolError};

use crate::error::SyncResult;
use crate::transport::FrameTransport;

/// How long one `receive_next` call may block before the shutdown flag is
/// checked again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What happened to one received frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Decoded and appended; the ledger tip is now this entry.
    Committed(TipRef),
    /// Decoded, but the ledger refused it.
    Rejected(RejectReason),
    /// Not a valid gossip frame; dropped.
    Malformed(ProtocolError),
}

/// Running counters of a [`GossipListener`].
#[derive(Debug, Default)]
pub struct ListenerStats {
    frames: AtomicU64,
    decoded: AtomicU64,
    committed: AtomicU64,
    rejected: AtomicU64,
    malformed: AtomicU64,
}

/// Point-in-time copy of [`ListenerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerCounts {
    pub frames: u64,
    pub decoded: u64,
    pub committed: u64,
    pub rejected: u64,
    pub malformed: u64,
}

impl ListenerStats {
    pub fn snapshot(&self) -> ListenerCounts {
        ListenerCounts {
            frames: self.frames.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &FrameOutcome) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            FrameOutcome::Committed(_) => &self.committed,
            FrameOutcome::Rejected(_) => &self.rejected,
            FrameOutcome::Malformed(_) => &self.malformed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if !matches!(outcome, FrameOutcome::Malformed(_)) {
            self.decoded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Receives entries mined by peers and offers them to the ledger.
///
/// The listener competes with local miners on equal terms: it calls the same
/// `try_append`, and whichever claim reaches the ledger first wins.
pub struct GossipListener<L> {
    ledger: Arc<L>,
    transport: Arc<dyn FrameTransport>,
    poll_interval: Duration,
    stats: Arc<ListenerStats>,
}

impl<L> GossipListener<L>
where
    L: LedgerReader + LedgerWriter + 'static,
{
    pub fn new(ledger: Arc<L>, transport: Arc<dyn FrameTransport>) -> Self {
        Self {
            ledger,
            transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stats: Arc::new(ListenerStats::default()),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Decode one frame and offer it to the ledger.
    ///
    /// Malformed frames and rejected entries are ordinary outcomes; only a
    /// ledger integrity failure is an error.
    pub fn handle_frame(&self, frame: &[u8]) -> SyncResult<FrameOutcome> {
        let outcome = match GossipCodec::decode(frame) {
            Err(e) => {
                debug!(bytes = frame.len(), error = %e, "dropping undecodable frame");
                FrameOutcome::Malformed(e)
            }
            Ok(candidate) => {
                let index = candidate.index();
                match self.ledger.try_append(candidate) {
                    Ok(tip) => {
                        info!(index = tip.index, digest = %tip.digest, "received entry");
                        FrameOutcome::Committed(tip)
                    }
                    Err(LedgerError::Rejected(reason)) => {
                        debug!(index, %reason, "received entry rejected");
                        FrameOutcome::Rejected(reason)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        self.stats.record(&outcome);
        Ok(outcome)
    }

    /// Receive and apply frames until `shutdown` is set.
    ///
    /// Returns early only on a non-transient transport failure or a ledger
    /// integrity failure.
    pub fn run(&self, shutdown: &AtomicBool) -> SyncResult<()> {
        info!(device = self.transport.device(), "gossip listener started");

        while !shutdown.load(Ordering::Acquire) {
            let frame = match self.transport.receive_next(self.poll_interval) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) if e.is_transient() => {
                    debug!(error = %e, "transient receive error");
                    continue;
                }
                Err(e) => {
                    warn!(device = self.transport.device(), error = %e, "gossip transport failed");
                    return Err(e);
                }
            };
            self.handle_frame(&frame)?;
        }

        let counts = self.stats.snapshot();
        info!(
            frames = counts.frames,
            committed = counts.committed,
            rejected = counts.rejected,
            malformed = counts.malformed,
            "gossip listener stopped"
        );
        Ok(())
    }

    /// Run the listener on its own thread.
    ///
    /// A fatal listener error also sets `shutdown`, stopping everything else
    /// that watches the same flag.
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> io::Result<JoinHandle<SyncResult<()>>> {
        thread::Builder::new()
            .name("gossip-listener".into())
            .spawn(move || {
                let result = self.run(&shutdown);
                if result.is_err() {
                    shutdown.store(true, Ordering::Release);
                }
                result
            })
    }
}
