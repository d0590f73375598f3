//! Per-flow plumbing: one pump per direction feeding the opposite peer.
//!
//! A flow runs two pumps concurrently. Each pump owns the read half of
//! one socket and the writer handle of the opposite socket, and moves
//! bytes through the framed pipeline:
//!
//! ```text
//! socket read ─► FrameBuffer ─► transform chain ─► encode ─► opposite queue
//! ```
//!
//! The first pump to stop (EOF, decode error, I/O error) tears the whole
//! flow down: the other pump is dropped, both outbound queues drain, and
//! both sockets close. Half-close is not supported.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use super::proxy::ProxyStats;
use super::writer::{spawn_writer_task, OutboundFrame, WriterHandle, DEFAULT_QUEUE_CAPACITY};
use crate::config::ProxyConfig;
use crate::error::Result;
use crate::protocol::{Direction, FrameBuffer};
use crate::transform::TransformChain;

/// How long teardown waits for the outbound queues to flush before
/// cutting the sockets. Bounds the damage from a peer that half-closes
/// and then never reads.
const TEARDOWN_GRACE: Duration = Duration::from_secs(5);

/// Monotonic nanoseconds for frame capture timestamps.
fn monotonic_ns() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Run one flow to completion. Returns once both sockets are closed and
/// the outbound queues have drained.
pub(crate) async fn run_flow(
    flow_id: u32,
    client: TcpStream,
    upstream: TcpStream,
    config: ProxyConfig,
    chain: &TransformChain,
    stats: &ProxyStats,
) {
    let (client_read, client_write) = client.into_split();
    let (upstream_read, upstream_write) = upstream.into_split();

    let (to_upstream, upstream_writer) = spawn_writer_task(upstream_write, DEFAULT_QUEUE_CAPACITY);
    let (to_client, client_writer) = spawn_writer_task(client_write, DEFAULT_QUEUE_CAPACITY);

    let (direction, result) = tokio::select! {
        r = pump(
            client_read,
            Direction::ClientToServer,
            flow_id,
            to_upstream,
            &config,
            chain,
            stats,
        ) => (Direction::ClientToServer, r),
        r = pump(
            upstream_read,
            Direction::ServerToClient,
            flow_id,
            to_client,
            &config,
            chain,
            stats,
        ) => (Direction::ServerToClient, r),
    };

    match result {
        Ok(()) => debug!(%direction, "peer closed, tearing down flow"),
        Err(e) => warn!(%direction, error = %e, "flow error, tearing down"),
    }

    // Both writer handles are gone at this point; the writer tasks flush
    // whatever is queued, then drop the write halves, closing the sockets.
    let client_abort = client_writer.abort_handle();
    let upstream_abort = upstream_writer.abort_handle();
    let drained = tokio::time::timeout(TEARDOWN_GRACE, async {
        let _ = client_writer.await;
        let _ = upstream_writer.await;
    })
    .await;
    if drained.is_err() {
        warn!("teardown grace expired, cutting writers");
        client_abort.abort();
        upstream_abort.abort();
    }
}

/// Move bytes from one peer to the other until EOF or error.
///
/// Every complete frame is stamped, run through the chain, and, unless
/// the chain emptied it, re-encoded onto the opposite peer's queue. A
/// full queue pauses the read side until the opposite writer drains.
async fn pump<R>(
    mut reader: R,
    direction: Direction,
    flow_id: u32,
    out: WriterHandle,
    config: &ProxyConfig,
    chain: &TransformChain,
    stats: &ProxyStats,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameBuffer::with_max_frame_size(config.max_frame_size);
    let mut buf = vec![0u8; config.max_chunk];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        trace!(%direction, bytes = n, "read chunk");

        decoder.push(&buf[..n])?;
        while decoder.has_frame() {
            let mut frame = decoder.pop(monotonic_ns(), flow_id, direction);
            chain.apply(&mut frame);

            if frame.is_empty() {
                stats.record_dropped();
                continue;
            }

            let record = OutboundFrame::new(frame.payload.freeze());
            let size = record.size() as u64;
            out.send(record).await?;
            stats.record_forwarded(direction, size);
        }
    }
}
