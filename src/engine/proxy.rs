//! Accept loop, upstream connect, and the flow registry.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn, Instrument};

use super::flow;
use crate::config::ProxyConfig;
use crate::error::Result;
use crate::protocol::Direction;
use crate::transform::TransformChain;

/// Counters for the whole proxy.
#[derive(Debug, Default)]
pub struct ProxyStats {
    /// Client connections accepted.
    pub flows_accepted: AtomicU64,
    /// Flows currently live.
    pub flows_active: AtomicU64,
    /// Flows torn down.
    pub flows_closed: AtomicU64,
    /// Connections rejected at the concurrency limit.
    pub flows_rejected: AtomicU64,
    /// Upstream connects that failed.
    pub upstream_failed: AtomicU64,
    /// Frames re-encoded onto the opposite peer.
    pub frames_forwarded: AtomicU64,
    /// Frames dropped because the chain emptied them.
    pub frames_dropped: AtomicU64,
    /// Wire bytes enqueued toward the upstream.
    pub bytes_to_upstream: AtomicU64,
    /// Wire bytes enqueued toward the client.
    pub bytes_to_client: AtomicU64,
}

impl ProxyStats {
    pub(crate) fn record_forwarded(&self, direction: Direction, bytes: u64) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
        match direction {
            Direction::ClientToServer => &self.bytes_to_upstream,
            Direction::ServerToClient => &self.bytes_to_client,
        }
        .fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// A live flow as seen from the registry.
#[derive(Debug, Clone)]
pub struct FlowEntry {
    pub client_addr: SocketAddr,
    pub upstream_addr: SocketAddr,
    pub opened_at: Instant,
}

/// Registry of live flows, keyed by flow id.
pub type FlowTable = Arc<DashMap<u32, FlowEntry>>;

/// The intercepting proxy engine.
///
/// Owns the listener, the transform chain, and the flow registry. Each
/// accepted client gets a matched upstream connection and a fresh flow
/// id; the flow then runs as its own task.
pub struct Proxy {
    config: ProxyConfig,
    listener: TcpListener,
    chain: Arc<TransformChain>,
    flows: FlowTable,
    conn_semaphore: Arc<Semaphore>,
    next_flow_id: AtomicU32,
    stats: Arc<ProxyStats>,
}

impl Proxy {
    /// Bind the listening socket. Fatal on failure.
    ///
    /// The transform chain is installed here for the proxy's lifetime;
    /// it is not hot-swappable.
    pub async fn bind(config: ProxyConfig, chain: TransformChain) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;

        info!(
            listen_addr = %listener.local_addr()?,
            upstream = %config.upstream_addr(),
            transforms = chain.len(),
            "proxy bound"
        );

        Ok(Self {
            conn_semaphore: Arc::new(Semaphore::new(config.max_connections)),
            listener,
            chain: Arc::new(chain),
            flows: Arc::new(DashMap::new()),
            next_flow_id: AtomicU32::new(1),
            stats: Arc::new(ProxyStats::default()),
            config,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared view of the proxy counters.
    pub fn stats(&self) -> Arc<ProxyStats> {
        Arc::clone(&self.stats)
    }

    /// Shared view of the flow registry.
    pub fn flow_table(&self) -> FlowTable {
        Arc::clone(&self.flows)
    }

    /// Number of currently live flows.
    pub fn active_flows(&self) -> usize {
        self.flows.len()
    }

    /// Run the accept loop until a fatal listener error.
    ///
    /// Per-flow errors never escape their flow; transient accept errors
    /// are logged and the loop continues.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!("proxy started");

        loop {
            match self.listener.accept().await {
                Ok((client, peer_addr)) => {
                    let permit = match self.conn_semaphore.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            self.stats.flows_rejected.fetch_add(1, Ordering::Relaxed);
                            warn!(peer = %peer_addr, "connection rejected: flow limit reached");
                            continue;
                        }
                    };

                    let flow_id = self.next_flow_id.fetch_add(1, Ordering::Relaxed);
                    let proxy = Arc::clone(&self);

                    tokio::spawn(
                        async move {
                            proxy.handle_flow(flow_id, client, peer_addr).await;
                            drop(permit);
                        }
                        .instrument(tracing::info_span!("flow", id = flow_id, peer = %peer_addr)),
                    );
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                    // Avoid a tight loop on persistent accept failures.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Connect the upstream, register the flow, run it, unregister.
    async fn handle_flow(&self, flow_id: u32, client: TcpStream, peer_addr: SocketAddr) {
        self.stats.flows_accepted.fetch_add(1, Ordering::Relaxed);

        let upstream = match TcpStream::connect(self.config.upstream_addr()).await {
            Ok(stream) => stream,
            Err(e) => {
                // No flow is created; dropping the client closes it.
                self.stats.upstream_failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    upstream = %self.config.upstream_addr(),
                    error = %e,
                    "upstream connect failed"
                );
                return;
            }
        };

        let upstream_addr = match upstream.peer_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.stats.upstream_failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "upstream gone before flow start");
                return;
            }
        };

        self.flows.insert(
            flow_id,
            FlowEntry {
                client_addr: peer_addr,
                upstream_addr,
                opened_at: Instant::now(),
            },
        );
        self.stats.flows_active.fetch_add(1, Ordering::Relaxed);
        debug!(upstream = %upstream_addr, "flow open");

        flow::run_flow(
            flow_id,
            client,
            upstream,
            self.config.clone(),
            &self.chain,
            &self.stats,
        )
        .await;

        self.flows.remove(&flow_id);
        self.stats.flows_active.fetch_sub(1, Ordering::Relaxed);
        self.stats.flows_closed.fetch_add(1, Ordering::Relaxed);
        debug!("flow closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_forwarded_per_direction() {
        let stats = ProxyStats::default();

        stats.record_forwarded(Direction::ClientToServer, 10);
        stats.record_forwarded(Direction::ServerToClient, 3);
        stats.record_forwarded(Direction::ClientToServer, 7);

        assert_eq!(stats.frames_forwarded.load(Ordering::Relaxed), 3);
        assert_eq!(stats.bytes_to_upstream.load(Ordering::Relaxed), 17);
        assert_eq!(stats.bytes_to_client.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ProxyConfig {
            listen_host: "127.0.0.1".into(),
            listen_port: 0,
            ..Default::default()
        };
        let proxy = Proxy::bind(config, TransformChain::new()).await.unwrap();

        assert_ne!(proxy.local_addr().unwrap().port(), 0);
        assert_eq!(proxy.active_flows(), 0);
    }
}
