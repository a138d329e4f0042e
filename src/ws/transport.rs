use std::future::Future;
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt as _, StreamExt as _};
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_tungstenite::tungstenite::Error as TungsteniteError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, client_async};

use super::config::Config;
use super::error::WsError;

type TlsWebSocket = WebSocketStream<TlsStream<TcpStream>>;

/// The transport seam the session layer is generic over.
///
/// `connect` consumes the transport and yields a sender and a receiver half,
/// mirroring the sink/stream split of the underlying WebSocket stream. The
/// session drives both halves from a single task.
pub trait Transport: Send + Sized + 'static {
    type Tx: TransportTx;
    type Rx: TransportRx;

    /// Run the full connect chain and split into the two halves.
    fn connect(self) -> impl Future<Output = Result<(Self::Tx, Self::Rx), WsError>> + Send;
}

/// Sender half of a connected transport.
///
/// Writes issued through one sender are serialized: a write queues behind
/// the one in flight and completion callbacks observe issue order.
pub trait TransportTx: Send + 'static {
    /// Write one complete text message.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), WsError>> + Send;

    /// Perform the closing handshake.
    fn close(&mut self) -> impl Future<Output = Result<(), WsError>> + Send;
}

/// Receiver half of a connected transport.
pub trait TransportRx: Send + 'static {
    /// The next text message, in wire-arrival order. `None` means the peer
    /// completed the close handshake or the stream ended.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, WsError>>> + Send;
}

/// TLS WebSocket transport.
///
/// Connecting walks the phases in order — resolve, TCP (bounded by the
/// configured timeout), TLS with SNI set to the configured host, WebSocket
/// upgrade against the configured endpoint — and reports the first failing
/// phase through the matching [`WsError`] variant.
pub struct WsTransport {
    config: Config,
    tls: Arc<ClientConfig>,
}

impl WsTransport {
    #[must_use]
    pub fn new(config: Config, tls: Arc<ClientConfig>) -> Self {
        Self { config, tls }
    }
}

impl Transport for WsTransport {
    type Tx = WsSender;
    type Rx = WsReceiver;

    async fn connect(self) -> Result<(WsSender, WsReceiver), WsError> {
        let authority = format!("{}:{}", self.config.url, self.config.port);

        let mut addrs = lookup_host(&authority).await.map_err(WsError::Resolve)?;
        let addr = addrs
            .next()
            .ok_or_else(|| WsError::NoAddressFound(authority.clone()))?;

        let tcp = match timeout(self.config.tcp_connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(WsError::TcpConnect(e)),
            Err(_) => return Err(WsError::ConnectTimeout(self.config.tcp_connect_timeout)),
        };

        let server_name = ServerName::try_from(self.config.url.clone())
            .map_err(|_| WsError::InvalidServerName(self.config.url.clone()))?;
        let connector = TlsConnector::from(Arc::clone(&self.tls));
        let tls = connector
            .connect(server_name, tcp)
            .await
            .map_err(WsError::TlsHandshake)?;

        let request = format!("wss://{}{}", self.config.url, self.config.endpoint);
        let (stream, _response) = client_async(request, tls)
            .await
            .map_err(WsError::WsHandshake)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.config.url, endpoint = %self.config.endpoint, "WebSocket connected");

        let (sink, stream) = stream.split();
        Ok((WsSender { sink }, WsReceiver { stream }))
    }
}

#[derive(Debug)]
pub struct WsSender {
    sink: SplitSink<TlsWebSocket, Message>,
}

impl TransportTx for WsSender {
    async fn send(&mut self, text: String) -> Result<(), WsError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(WsError::Send)
    }

    async fn close(&mut self) -> Result<(), WsError> {
        match self.sink.close().await {
            Ok(()) | Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(WsError::Close(e)),
        }
    }
}

#[derive(Debug)]
pub struct WsReceiver {
    stream: SplitStream<TlsWebSocket>,
}

impl TransportRx for WsReceiver {
    async fn recv(&mut self) -> Option<Result<String, WsError>> {
        while let Some(item) = self.stream.next().await {
            match item {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(_)) => return None,
                // Binary payloads and control frames are not part of the
                // text-mode protocol; skip them.
                Ok(_) => {}
                Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed) => {
                    return None;
                }
                Err(e) => return Some(Err(WsError::Receive(e))),
            }
        }
        None
    }
}
