//! Secure WebSocket transport.
//!
//! [`WsTransport`] owns the whole connect chain — DNS resolution, TCP with a
//! bounded timeout, TLS with SNI, WebSocket upgrade — and splits into a
//! sender and a receiver half once connected. The [`Transport`] trait is the
//! seam the session layer depends on, so tests can substitute a scripted
//! transport for the real one.

pub mod config;
pub mod error;
pub mod tls;
pub mod transport;

pub use config::Config;
pub use error::WsError;
pub use transport::{Transport, TransportRx, TransportTx, WsTransport};
