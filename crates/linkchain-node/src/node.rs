use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::info;

use linkchain_ledger::{InMemoryLedger, LedgerReader};
use linkchain_sync::{
    Broadcaster, FrameTransport, GossipListener, ListenerCounts, ListenerStats, LoopbackHub,
    RawSocketTransport, SyncResult,
};

use crate::config::{NodeConfig, TransportKind};
use crate::error::{NodeError, NodeResult};
use crate::pool::{MinerPool, PoolCounts, PoolStats};

/// Open the transport named by `config`.
///
/// `Loopback` attaches to a fresh private hub, so the node hears no peers.
pub fn open_transport(config: &NodeConfig) -> NodeResult<Arc<dyn FrameTransport>> {
    let transport: Arc<dyn FrameTransport> = match config.transport {
        TransportKind::Raw => Arc::new(RawSocketTransport::open(&config.device)?),
        TransportKind::Loopback => Arc::new(LoopbackHub::new().attach(config.device.as_str())),
    };
    Ok(transport)
}

/// One Linkchain participant: a ledger, a miner pool, a gossip listener and
/// a broadcaster, all sharing one transport.
pub struct Node;

impl Node {
    pub fn start(config: NodeConfig, transport: Arc<dyn FrameTransport>) -> NodeResult<NodeHandle> {
        config.validate()?;

        let ledger = Arc::new(InMemoryLedger::new(config.difficulty));
        let shutdown = Arc::new(AtomicBool::new(false));
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&transport)));

        let listener = GossipListener::new(Arc::clone(&ledger), Arc::clone(&transport));
        let listener_stats = listener.stats();
        let listener = listener.spawn(Arc::clone(&shutdown))?;

        let pool = match MinerPool::spawn(
            Arc::clone(&ledger),
            Arc::clone(&broadcaster),
            &config,
            Arc::clone(&shutdown),
        ) {
            Ok(pool) => pool,
            Err(e) => {
                shutdown.store(true, Ordering::Release);
                let _ = listener.join();
                return Err(e);
            }
        };

        info!(
            device = transport.device(),
            transport = %config.transport,
            miners = config.num_miners,
            difficulty = %config.difficulty,
            "node started"
        );

        Ok(NodeHandle {
            ledger,
            shutdown,
            broadcaster,
            pool_stats: pool.stats(),
            listener_stats,
            pool,
            listener,
        })
    }
}

/// Counters from a running or stopped node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeReport {
    pub height: u64,
    pub pool: PoolCounts,
    pub listener: ListenerCounts,
    pub broadcast_sent: u64,
    pub broadcast_failed: u64,
}

pub struct NodeHandle {
    ledger: Arc<InMemoryLedger>,
    shutdown: Arc<AtomicBool>,
    broadcaster: Arc<Broadcaster>,
    pool_stats: Arc<PoolStats>,
    listener_stats: Arc<ListenerStats>,
    pool: MinerPool,
    listener: JoinHandle<SyncResult<()>>,
}

impl NodeHandle {
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// Ask every thread to stop. Returns immediately; use [`wait`](Self::wait)
    /// to join them.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn report(&self) -> NodeReport {
        NodeReport {
            height: self.ledger.tip_index(),
            pool: self.pool_stats.snapshot(),
            listener: self.listener_stats.snapshot(),
            broadcast_sent: self.broadcaster.sent(),
            broadcast_failed: self.broadcaster.failed(),
        }
    }

    /// Block until the node stops, then join every thread.
    ///
    /// Without `max_height` or a call to [`shutdown`](Self::shutdown) this
    /// only returns once a thread fails. A listener failure takes precedence
    /// over a miner failure.
    pub fn wait(self) -> NodeResult<NodeReport> {
        let pool = self.pool.join();
        // Miners may have stopped on their own at `max_height`.
        self.shutdown.store(true, Ordering::Release);

        let listener = self
            .listener
            .join()
            .map_err(|_| NodeError::ThreadPanicked("gossip-listener".into()))?;
        listener?;
        pool?;

        let report = NodeReport {
            height: self.ledger.tip_index(),
            pool: self.pool_stats.snapshot(),
            listener: self.listener_stats.snapshot(),
            broadcast_sent: self.broadcaster.sent(),
            broadcast_failed: self.broadcaster.failed(),
        };
        info!(
            height = report.height,
            committed = report.pool.committed,
            received = report.listener.committed,
            "node stopped"
        );
        Ok(report)
    }
}
