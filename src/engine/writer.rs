//! Dedicated writer task per peer, draining the outbound queue.
//!
//! Each peer of a flow owns one writer task fed by an mpsc channel of
//! encoded records. The channel is the peer's outbound queue: frames are
//! written in send order, a full kernel buffer parks the task until the
//! socket is writable again, and a full channel parks the sending pump,
//! which is what paces a fast reader against a slow opposite writer.
//!
//! ```text
//! pump (c2s) ─► mpsc::Sender<OutboundFrame> ─► writer task ─► upstream socket
//! pump (s2c) ─► mpsc::Sender<OutboundFrame> ─► writer task ─► client socket
//! ```
//!
//! Batching: ready frames are gathered (up to [`MAX_BATCH_SIZE`]) and
//! written with a single vectored write; a short write restarts from the
//! unwritten remainder.

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{FramewireError, Result};
use crate::protocol::{encode_length, HEADER_SIZE};

/// Default capacity of a peer's outbound queue, in frames.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Maximum frames gathered into a single vectored write.
const MAX_BATCH_SIZE: usize = 64;

/// An encoded record queued for one peer.
#[derive(Debug)]
pub struct OutboundFrame {
    /// Pre-encoded length header (4 bytes, big-endian).
    header: [u8; HEADER_SIZE],
    /// Payload bytes.
    payload: Bytes,
}

impl OutboundFrame {
    /// Encode a payload into its wire record.
    #[inline]
    pub fn new(payload: Bytes) -> Self {
        debug_assert!(payload.len() <= u32::MAX as usize);
        Self {
            header: encode_length(payload.len() as u32),
            payload,
        }
    }

    /// Total wire size of this record (header + payload).
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Handle for enqueueing records onto a peer's outbound queue.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Enqueue a record, waiting if the queue is full.
    ///
    /// Errors if the writer task has exited (peer gone).
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| FramewireError::ConnectionClosed)
    }
}

/// Spawn the writer task for one peer.
///
/// Returns the queue handle and the task's join handle. The task exits
/// once every handle is dropped and the queue has drained, or on the
/// first fatal write error.
pub fn spawn_writer_task<W>(
    writer: W,
    queue_capacity: usize,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(queue_capacity);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

/// Main writer loop - receives records and writes them to the socket.
async fn writer_loop<W>(mut rx: mpsc::Receiver<OutboundFrame>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let first = match rx.recv().await {
            Some(frame) => frame,
            // Queue closed and drained: clean shutdown.
            None => return Ok(()),
        };

        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);

        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        write_batch(&mut writer, &batch).await?;
    }
}

/// Write a batch of records using scatter/gather I/O.
///
/// A short write leaves the remainder at the head of the batch and the
/// write resumes from there.
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if batch.is_empty() {
        return Ok(());
    }

    let mut slices: Vec<IoSlice<'_>> = Vec::with_capacity(batch.len() * 2);
    for frame in batch {
        slices.push(IoSlice::new(&frame.header));
        if !frame.payload.is_empty() {
            slices.push(IoSlice::new(&frame.payload));
        }
    }

    let total_size: usize = batch.iter().map(|f| f.size()).sum();
    let mut total_written = writer.write_vectored(&slices).await?;

    if total_written == 0 {
        return Err(FramewireError::Io(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            "write_vectored returned 0",
        )));
    }

    while total_written < total_size {
        let remaining = build_remaining_slices(batch, total_written);
        if remaining.is_empty() {
            break;
        }

        let written = writer.write_vectored(&remaining).await?;
        if written == 0 {
            return Err(FramewireError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// Build the IoSlice array for the bytes left after a partial write.
fn build_remaining_slices(batch: &[OutboundFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len() * 2);
    let mut skipped = 0;

    for frame in batch {
        let header_start = skipped;
        let header_end = skipped + HEADER_SIZE;

        if skip_bytes < header_end {
            let start_in_header = skip_bytes.saturating_sub(header_start);
            slices.push(IoSlice::new(&frame.header[start_in_header..]));
        }
        skipped = header_end;

        if !frame.payload.is_empty() {
            let payload_start = skipped;
            let payload_end = skipped + frame.payload.len();

            if skip_bytes < payload_end {
                let start_in_payload = skip_bytes.saturating_sub(payload_start);
                slices.push(IoSlice::new(&frame.payload[start_in_payload..]));
            }
            skipped = payload_end;
        }
    }

    slices
}
