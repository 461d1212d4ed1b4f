//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default listening port
pub const DEFAULT_PORT: u16 = 8765;

/// Environment variable holding the bind host
pub const HOST_ENV: &str = "SIGNAL_RELAY_HOST";

/// Environment variable holding the bind port
pub const PORT_ENV: &str = "SIGNAL_RELAY_PORT";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Frames buffered per connection before further sends to it are dropped
    pub outbound_queue_capacity: usize,

    /// Largest accepted WebSocket message in bytes
    ///
    /// This is a transport limit: a larger frame fails the read and ends
    /// the connection, unlike protocol errors, which are only answered.
    pub max_message_size: usize,

    /// Interval between keepalive pings (None = never ping)
    pub ping_interval: Option<Duration>,

    /// Close connections that send nothing for this long (None = never)
    pub idle_timeout: Option<Duration>,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            outbound_queue_capacity: 64,
            max_message_size: 1024 * 1024, // 1MB
            ping_interval: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(90)),
            tcp_nodelay: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Build a config from `SIGNAL_RELAY_HOST` / `SIGNAL_RELAY_PORT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup function
    ///
    /// Unset variables fall back to `0.0.0.0` and [`DEFAULT_PORT`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup(HOST_ENV) {
            Some(host) => parse_host(host.trim())?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match lookup(PORT_ENV) {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("{PORT_ENV}={port:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self::with_addr(SocketAddr::new(host, port)))
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set per-connection outbound queue capacity (at least 1)
    pub fn outbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.outbound_queue_capacity = capacity.max(1);
        self
    }

    /// Set maximum message size
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set keepalive ping interval; zero disables pings
    pub fn ping_interval(mut self, interval: Option<Duration>) -> Self {
        self.ping_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Set idle timeout; zero disables it
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout.filter(|d| !d.is_zero());
        self
    }
}

fn parse_host(host: &str) -> Result<IpAddr> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    host.parse()
        .map_err(|e| Error::Config(format!("{HOST_ENV}={host:?}: {e}")))
}
