//! Proxy engine - accept loop, per-flow pumps, and writer tasks.

mod flow;
mod proxy;
mod writer;

pub use proxy::{FlowEntry, FlowTable, Proxy, ProxyStats};
pub use writer::{spawn_writer_task, OutboundFrame, WriterHandle, DEFAULT_QUEUE_CAPACITY};
