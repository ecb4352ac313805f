//! Settings of the default transport.
//!
//! A [`ClientConfig`] is read once, when a [`HyperClient`](crate::HyperClient)
//! is built; the client never changes afterwards. Per-call limits such as
//! [`Call::deadline`](crate::Call::deadline) are separate and apply on top.

use std::time::Duration;

/// Connection and timeout settings of a [`HyperClient`](crate::HyperClient).
///
/// The defaults suit a long-lived client talking to a handful of hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound for one exchange, from sending the request to the last
    /// byte of the buffered body. Elapsing yields [`Error::Timeout`](crate::Error::Timeout).
    pub timeout: Duration,
    /// Upper bound for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Idle connections kept per host; `0` disables reuse.
    pub pool_idle_per_host: usize,
    /// How long an unused pooled connection stays open.
    pub pool_idle_timeout: Duration,
    /// Advertise `h2` in ALPN. HTTP/1.1 is always offered.
    pub http2: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            http2: true,
        }
    }
}

impl ClientConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`], seeded with the defaults or an existing configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl From<ClientConfig> for ClientConfigBuilder {
    fn from(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ClientConfigBuilder {
    /// See [`ClientConfig::timeout`].
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// See [`ClientConfig::connect_timeout`].
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// See [`ClientConfig::pool_idle_per_host`].
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool_idle_per_host = count;
        self
    }

    /// See [`ClientConfig::pool_idle_timeout`].
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// `false` restricts the client to HTTP/1.1.
    #[must_use]
    pub const fn http2(mut self, enabled: bool) -> Self {
        self.config.http2 = enabled;
        self
    }

    /// Finish with the accumulated settings.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
