//! Monitor facade.
//!
//! Wires the real transport and the STOMP session together for the one job
//! this SDK exists for: streaming passenger events off the live service
//! into a caller-supplied sink. Reconnection stays with the caller — when
//! the session reaches a terminal state the monitor is done.

use std::env;
use std::path::PathBuf;

use crate::Result;
use crate::error::Error;
use crate::events::PassengerEvent;
use crate::stomp::{SessionState, StompClient, StompClientError};
use crate::ws::{self, WsTransport};

pub const SERVER_URL_VAR: &str = "LTNM_SERVER_URL";
pub const SERVER_PORT_VAR: &str = "LTNM_SERVER_PORT";
pub const USERNAME_VAR: &str = "LTNM_USERNAME";
pub const PASSWORD_VAR: &str = "LTNM_PASSWORD";

pub const DEFAULT_SERVER_URL: &str = "ltnm.learncppthroughprojects.com";
pub const DEFAULT_SERVER_PORT: u16 = 443;

/// Endpoint serving the STOMP broker.
pub const NETWORK_EVENTS_ENDPOINT: &str = "/network-events";
/// Destination publishing passenger events.
pub const PASSENGERS_DESTINATION: &str = "/passengers";

/// Everything needed to reach the live service.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub url: String,
    pub endpoint: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// PEM CA bundle used to verify the server certificate
    pub ca_bundle: PathBuf,
}

impl MonitorConfig {
    /// Configuration for the default live service with the given
    /// credentials. The CA bundle defaults to `cacert.pem` in the working
    /// directory.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_owned(),
            endpoint: NETWORK_EVENTS_ENDPOINT.to_owned(),
            port: DEFAULT_SERVER_PORT,
            username: username.into(),
            password: password.into(),
            ca_bundle: PathBuf::from("cacert.pem"),
        }
    }

    #[must_use]
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = path.into();
        self
    }

    /// Read the configuration from the `LTNM_*` environment variables.
    ///
    /// `LTNM_USERNAME` and `LTNM_PASSWORD` are required; the server
    /// coordinates fall back to the live-service defaults.
    pub fn from_env() -> Result<Self> {
        let username = env::var(USERNAME_VAR)
            .map_err(|_| Error::config(format!("{USERNAME_VAR} is not set")))?;
        let password = env::var(PASSWORD_VAR)
            .map_err(|_| Error::config(format!("{PASSWORD_VAR} is not set")))?;

        let mut config = Self::new(username, password);
        if let Ok(url) = env::var(SERVER_URL_VAR) {
            config.url = url;
        }
        if let Ok(port) = env::var(SERVER_PORT_VAR) {
            config.port = port
                .parse()
                .map_err(|_| Error::config(format!("{SERVER_PORT_VAR} is not a port number")))?;
        }
        Ok(config)
    }
}

/// A running monitor: one session subscribed to the passengers destination,
/// decoding each message into a [`PassengerEvent`] for the sink.
pub struct NetworkMonitor {
    client: StompClient<WsTransport>,
}

impl NetworkMonitor {
    /// Build the trust store and the transport, connect, and subscribe.
    ///
    /// `sink` runs on the session task, once per decoded event; events whose
    /// bodies fail to decode are dropped. Must be called from within a
    /// tokio runtime.
    pub fn start(
        config: MonitorConfig,
        mut sink: impl FnMut(PassengerEvent) + Send + 'static,
    ) -> Result<Self> {
        let tls = ws::tls::trust_store_from_pem(&config.ca_bundle)?;
        let transport = WsTransport::new(
            ws::Config::new(config.url.as_str(), config.endpoint.as_str(), config.port),
            tls,
        );
        let client = StompClient::new(config.url.as_str(), transport);

        let subscriber = client.clone();
        client.connect(
            &config.username,
            &config.password,
            move |ec| {
                if !ec.is_ok() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %ec, "monitor connect failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &ec;
                    return;
                }
                subscriber.subscribe(
                    PASSENGERS_DESTINATION,
                    |ec, id| {
                        #[cfg(feature = "tracing")]
                        tracing::info!(error = %ec, id = %id, "passenger subscription");
                        #[cfg(not(feature = "tracing"))]
                        let _ = (&ec, &id);
                    },
                    move |ec, body| {
                        if !ec.is_ok() {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(error = %ec, "passenger message error");
                            #[cfg(not(feature = "tracing"))]
                            let _ = &ec;
                            return;
                        }
                        match PassengerEvent::from_json(&body) {
                            Ok(event) => sink(event),
                            Err(e) => {
                                #[cfg(feature = "tracing")]
                                tracing::warn!(error = %e, body = %body, "undecodable passenger event");
                                #[cfg(not(feature = "tracing"))]
                                let _ = (&e, &body);
                            }
                        }
                    },
                );
            },
            |ec| {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %ec, "monitor session ended");
                #[cfg(not(feature = "tracing"))]
                let _ = &ec;
            },
        );

        Ok(Self { client })
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.client.state()
    }

    /// Close the session; `on_close` reports the outcome.
    pub fn stop(&self, on_close: impl FnOnce(StompClientError) + Send + 'static) {
        self.client.close(on_close);
    }

    /// The underlying session handle, e.g. for additional subscriptions.
    #[must_use]
    pub fn client(&self) -> &StompClient<WsTransport> {
        &self.client
    }
}
