//! # framewire
//!
//! Intercepting TCP proxy for length-prefixed frames.
//!
//! The proxy terminates client connections, opens a matched upstream
//! connection per client, and shuttles application frames in both
//! directions. Unlike a byte-level relay, it decodes each stream into
//! `[u32 BE length][payload]` frames as they complete, runs every frame
//! through an ordered transform chain that may mutate or drop the
//! payload, and re-encodes the result onto the opposite peer.
//!
//! ## Architecture
//!
//! ```text
//!          ┌────────────────────── flow ──────────────────────┐
//! client ──► read ─► decode ─► transform ─► encode ─► queue ──► upstream
//!        ◄── queue ◄─ encode ◄─ transform ◄─ decode ◄─ read ◄──
//! ```
//!
//! Each flow owns two such pipelines (one per direction), each with its
//! own decoder state. Within one direction, frame order on the wire is
//! preserved end to end; there is no ordering guarantee across flows or
//! between the two directions of one flow.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use framewire::protocol::Direction;
//! use framewire::transform::{TransformChain, UppercaseAscii};
//! use framewire::{Proxy, ProxyConfig};
//!
//! #[tokio::main]
//! async fn main() -> framewire::Result<()> {
//!     let chain =
//!         TransformChain::new().with(UppercaseAscii::for_direction(Direction::ClientToServer));
//!
//!     let proxy = Arc::new(Proxy::bind(ProxyConfig::default(), chain).await?);
//!     proxy.run().await
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod transform;

pub use config::ProxyConfig;
pub use engine::{Proxy, ProxyStats};
pub use error::{FramewireError, Result};
pub use transform::{Transform, TransformChain};
