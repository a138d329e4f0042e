#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// WebSocket transport error, tagged by the connect phase or operation that
/// failed.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// DNS resolution of the server failed
    Resolve(std::io::Error),
    /// DNS resolution returned no usable address
    NoAddressFound(String),
    /// The TCP connection could not be established
    TcpConnect(std::io::Error),
    /// The TCP connect phase exceeded its bounded timeout
    ConnectTimeout(Duration),
    /// The configured host is not a valid TLS server name
    InvalidServerName(String),
    /// The TLS handshake failed
    TlsHandshake(std::io::Error),
    /// The WebSocket upgrade failed
    WsHandshake(tokio_tungstenite::tungstenite::Error),
    /// A trust store file could not be read
    TrustStore(std::io::Error),
    /// A trust store file contained no PEM certificates
    NoCertificatesFound(PathBuf),
    /// A PEM certificate was rejected by the TLS backend
    InvalidCertificate(rustls::Error),
    /// A write on the connected stream failed
    Send(tokio_tungstenite::tungstenite::Error),
    /// Reading from the connected stream failed
    Receive(tokio_tungstenite::tungstenite::Error),
    /// The close handshake failed
    Close(tokio_tungstenite::tungstenite::Error),
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(e) => write!(f, "failed to resolve server: {e}"),
            Self::NoAddressFound(authority) => {
                write!(f, "no address found for {authority}")
            }
            Self::TcpConnect(e) => write!(f, "TCP connect failed: {e}"),
            Self::ConnectTimeout(timeout) => {
                write!(f, "TCP connect timed out after {timeout:?}")
            }
            Self::InvalidServerName(name) => write!(f, "invalid TLS server name: {name}"),
            Self::TlsHandshake(e) => write!(f, "TLS handshake failed: {e}"),
            Self::WsHandshake(e) => write!(f, "WebSocket handshake failed: {e}"),
            Self::TrustStore(e) => write!(f, "failed to read trust store: {e}"),
            Self::NoCertificatesFound(path) => {
                write!(f, "no certificates found in {}", path.display())
            }
            Self::InvalidCertificate(e) => write!(f, "invalid trust store certificate: {e}"),
            Self::Send(e) => write!(f, "WebSocket write failed: {e}"),
            Self::Receive(e) => write!(f, "WebSocket read failed: {e}"),
            Self::Close(e) => write!(f, "WebSocket close failed: {e}"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Resolve(e)
            | Self::TcpConnect(e)
            | Self::TlsHandshake(e)
            | Self::TrustStore(e) => Some(e),
            Self::WsHandshake(e) | Self::Send(e) | Self::Receive(e) | Self::Close(e) => Some(e),
            Self::InvalidCertificate(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}
