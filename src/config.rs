//! Proxy configuration.

use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_MAX_FRAME_SIZE;

/// Default local TCP port to listen on.
pub const DEFAULT_LISTEN_PORT: u16 = 7777;

/// Default upstream TCP port.
pub const DEFAULT_UPSTREAM_PORT: u16 = 8888;

/// Default maximum bytes drawn from a single read (64 KB).
pub const DEFAULT_MAX_CHUNK: usize = 64 * 1024;

/// Default maximum concurrent flows.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

/// Settings for one proxy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Local address to bind.
    pub listen_host: String,
    /// Local TCP port. 0 = OS-assigned.
    pub listen_port: u16,
    /// Upstream address dialed for each new flow.
    pub upstream_host: String,
    /// Upstream TCP port.
    pub upstream_port: u16,
    /// Maximum bytes drawn from a single read; bounds one read's
    /// working-set size.
    pub max_chunk: usize,
    /// Cap on the declared payload length of a single frame.
    pub max_frame_size: u32,
    /// Maximum concurrent flows before new connections are rejected.
    pub max_connections: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            upstream_host: "127.0.0.1".to_string(),
            upstream_port: DEFAULT_UPSTREAM_PORT,
            max_chunk: DEFAULT_MAX_CHUNK,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ProxyConfig {
    /// `host:port` to bind the listener on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    /// `host:port` dialed for each new flow.
    pub fn upstream_addr(&self) -> String {
        format!("{}:{}", self.upstream_host, self.upstream_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:7777");
        assert_eq!(config.upstream_addr(), "127.0.0.1:8888");
        assert_eq!(config.max_chunk, 64 * 1024);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_addr_formatting() {
        let config = ProxyConfig {
            listen_host: "127.0.0.1".into(),
            listen_port: 0,
            upstream_host: "example.test".into(),
            upstream_port: 9999,
            ..Default::default()
        };
        assert_eq!(config.listen_addr(), "127.0.0.1:0");
        assert_eq!(config.upstream_addr(), "example.test:9999");
    }
}
