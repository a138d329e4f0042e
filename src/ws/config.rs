use std::time::Duration;

const DEFAULT_TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a WebSocket transport.
///
/// `url` is the bare host name (it doubles as the SNI name and the `Host`
/// header of the upgrade request); `endpoint` is the path on the server.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Config {
    /// Host name of the server, e.g. `ltnm.learncppthroughprojects.com`
    pub url: String,
    /// Path of the WebSocket endpoint, e.g. `/network-events`
    pub endpoint: String,
    /// TCP port on the server
    pub port: u16,
    /// Upper bound on the TCP connect phase. Later phases run without a
    /// per-operation timeout.
    pub tcp_connect_timeout: Duration,
}

impl Config {
    #[must_use]
    pub fn new(url: impl Into<String>, endpoint: impl Into<String>, port: u16) -> Self {
        Self {
            url: url.into(),
            endpoint: endpoint.into(),
            port,
            tcp_connect_timeout: DEFAULT_TCP_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_tcp_connect_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_connect_timeout = timeout;
        self
    }
}
