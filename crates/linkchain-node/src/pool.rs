use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use linkchain_ledger::{
    mine_cancellable, Entry, LedgerError, LedgerReader, LedgerWriter, MineOutcome,
};
use linkchain_sync::{Broadcaster, Outbox};

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};

/// Running counters shared by every worker of a [`MinerPool`].
#[derive(Debug, Default)]
pub struct PoolStats {
    mined: AtomicU64,
    committed: AtomicU64,
    stale: AtomicU64,
    cancelled: AtomicU64,
}

/// Point-in-time copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounts {
    /// Searches that found a nonce.
    pub mined: u64,
    /// Mined entries the ledger accepted.
    pub committed: u64,
    /// Mined entries the ledger refused because the tip moved.
    pub stale: u64,
    /// Searches abandoned before finding a nonce.
    pub cancelled: u64,
}

impl PoolStats {
    pub fn snapshot(&self) -> PoolCounts {
        PoolCounts {
            mined: self.mined.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// A fixed set of mining threads competing for the next index, plus the
/// publisher thread that broadcasts their commits in chain order.
pub struct MinerPool {
    workers: Vec<JoinHandle<NodeResult<()>>>,
    publisher: JoinHandle<()>,
    stats: Arc<PoolStats>,
}

impl MinerPool {
    /// Start `config.num_miners` workers named `miner-{id}`.
    ///
    /// Workers run until `shutdown` is set, or until the tip reaches
    /// `config.max_height`, at which point they set `shutdown` themselves.
    /// Commits are queued for `broadcaster` while the ledger still holds the
    /// commit point.
    pub fn spawn<L>(
        ledger: Arc<L>,
        broadcaster: Arc<Broadcaster>,
        config: &NodeConfig,
        shutdown: Arc<AtomicBool>,
    ) -> NodeResult<Self>
    where
        L: LedgerReader + LedgerWriter + 'static,
    {
        let stats = Arc::new(PoolStats::default());
        let (outbox, publisher) = broadcaster.spawn_publisher()?;
        let mut workers = Vec::with_capacity(config.num_miners);

        for id in 0..config.num_miners {
            let miner = Miner {
                id,
                ledger: Arc::clone(&ledger),
                outbox: outbox.clone(),
                payload: config.payload_for(id),
                pause: config.pause(),
                max_height: config.max_height,
                shutdown: Arc::clone(&shutdown),
                stats: Arc::clone(&stats),
            };
            let spawned = thread::Builder::new()
                .name(format!("miner-{id}"))
                .spawn(move || miner.run());

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shutdown.store(true, Ordering::Release);
                    drop(outbox);
                    join_all(workers).ok();
                    publisher.join().ok();
                    return Err(e.into());
                }
            }
        }

        info!(miners = workers.len(), difficulty = %ledger.difficulty(), "miner pool started");
        Ok(Self {
            workers,
            publisher,
            stats,
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for every worker to exit, then for the publisher to flush their
    /// commits. Returns the first worker error.
    pub fn join(self) -> NodeResult<PoolCounts> {
        let workers = join_all(self.workers);
        self.publisher
            .join()
            .map_err(|_| NodeError::ThreadPanicked("gossip-publisher".into()))?;
        workers?;
        Ok(self.stats.snapshot())
    }
}

fn join_all(workers: Vec<JoinHandle<NodeResult<()>>>) -> NodeResult<()> {
    let mut first_error = None;
    for handle in workers {
        let name = handle.thread().name().unwrap_or("miner").to_string();
        let result = handle
            .join()
            .map_err(|_| NodeError::ThreadPanicked(name))
            .and_then(|r| r);
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

struct Miner<L> {
    id: usize,
    ledger: Arc<L>,
    outbox: Outbox,
    payload: String,
    pause: Duration,
    max_height: Option<u64>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<PoolStats>,
}

impl<L> Miner<L>
where
    L: LedgerReader + LedgerWriter,
{
    fn run(self) -> NodeResult<()> {
        debug!(miner = self.id, "miner started");
        let result = self.mine_until_shutdown();
        if let Err(e) = &result {
            error!(miner = self.id, error = %e, "miner stopped on ledger failure");
            self.shutdown.store(true, Ordering::Release);
        }
        result
    }

    fn mine_until_shutdown(&self) -> NodeResult<()> {
        while !self.shutdown.load(Ordering::Acquire) {
            // Unlocked read; `try_append` re-validates against the real tip.
            let tip = self.ledger.tip()?;
            if self.max_height.is_some_and(|max| tip.index >= max) {
                info!(miner = self.id, height = tip.index, "target height reached");
                self.shutdown.store(true, Ordering::Release);
                break;
            }

            let draft = Entry::draft(tip.index + 1, tip.digest, self.payload.as_str());
            let index = draft.index();
            let outcome = mine_cancellable(draft, self.ledger.difficulty(), || {
                self.shutdown.load(Ordering::Relaxed) || self.ledger.tip_index() >= index
            });

            match outcome {
                MineOutcome::Cancelled { stats } => {
                    self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                    trace!(miner = self.id, index, attempts = stats.attempts, "search cancelled");
                    continue;
                }
                MineOutcome::Found { entry, stats } => {
                    self.stats.mined.fetch_add(1, Ordering::Relaxed);
                    self.submit(entry, stats.attempts, stats.hash_rate())?;
                }
            }

            thread::sleep(self.pause);
        }
        Ok(())
    }

    fn submit(&self, entry: Entry, attempts: u64, hash_rate: f64) -> NodeResult<()> {
        let (index, nonce) = (entry.index(), entry.nonce());
        let queued = self.ledger.try_append_with(entry, &mut |committed| {
            if !self.outbox.enqueue(committed) {
                warn!(
                    miner = self.id,
                    index = committed.index(),
                    "publisher gone, entry not broadcast"
                );
            }
        });

        match queued {
            Ok(tip) => {
                self.stats.committed.fetch_add(1, Ordering::Relaxed);
                info!(
                    miner = self.id,
                    index = tip.index,
                    digest = %tip.digest,
                    nonce,
                    attempts,
                    hash_rate = hash_rate as u64,
                    "entry mined"
                );
                Ok(())
            }
            Err(LedgerError::Rejected(reason)) => {
                self.stats.stale.fetch_add(1, Ordering::Relaxed);
                debug!(miner = self.id, index, %reason, "mined entry discarded");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
