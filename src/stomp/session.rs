use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};

use super::error::StompClientError;
use super::subscription::{MessageHandler, SubscribeHandler, Subscription, next_subscription_id};
use crate::frame::{StompCommand, StompFrame, StompHeader};
use crate::ws::transport::{Transport, TransportRx, TransportTx};

type ConnectHandler = Box<dyn FnOnce(StompClientError) + Send>;
type DisconnectHandler = Box<dyn FnOnce(StompClientError) + Send>;
type CloseHandler = Box<dyn FnOnce(StompClientError) + Send>;

/// Protocol state of one session.
///
/// `Failed`, `Closed` and `Disconnected` are terminal; once a session
/// reaches one of them every further operation fails synchronously through
/// its own callback.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected yet
    Idle,
    /// WebSocket connect chain in progress
    TransportConnecting,
    /// Transport is up, STOMP handshake in flight
    Authenticating,
    /// Authenticated; subscriptions and messages flow
    Connected,
    /// Caller-initiated close in progress
    Closing,
    /// Caller-initiated close completed
    Closed,
    /// The connect chain or the STOMP handshake failed
    Failed,
    /// The server errored or dropped the connection
    Disconnected,
}

impl SessionState {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed | Self::Disconnected)
    }
}

enum Command {
    Subscribe {
        id: String,
        destination: String,
        on_subscribe: SubscribeHandler,
        on_message: MessageHandler,
    },
    Close {
        on_close: CloseHandler,
    },
}

/// STOMP 1.2 client session over one transport.
///
/// The handle is cheap to clone and safe to use from any thread; all
/// callbacks run serialized on the session task. A session connects once
/// and runs to a terminal state — reconnecting means building a new
/// session with a new transport.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use ltnm_client_sdk::stomp::StompClient;
/// use ltnm_client_sdk::ws::{self, WsTransport};
///
/// # async fn example() -> anyhow::Result<()> {
/// let tls = ws::tls::trust_store_from_pem(Path::new("cacert.pem"))?;
/// let config = ws::Config::new("ltnm.learncppthroughprojects.com", "/network-events", 443);
/// let transport = WsTransport::new(config, tls);
///
/// let client = StompClient::new("ltnm.learncppthroughprojects.com", transport);
/// let subscriber = client.clone();
/// client.connect(
///     "username",
///     "password",
///     move |ec| {
///         assert!(ec.is_ok());
///         subscriber.subscribe(
///             "/passengers",
///             |ec, id| println!("subscribed ({ec}): {id}"),
///             |_, body| println!("{body}"),
///         );
///     },
///     |ec| eprintln!("session ended: {ec}"),
/// );
/// # Ok(())
/// # }
/// ```
pub struct StompClient<T: Transport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for StompClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<T: Transport> {
    /// Value of the `host` header of the connect frame
    host: String,
    /// Held until `connect` hands it to the session task
    transport: Mutex<Option<T>>,
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
}

impl<T: Transport> StompClient<T> {
    /// Create a session over `transport`. No connection is initiated.
    #[must_use]
    pub fn new(host: impl Into<String>, transport: T) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(ClientInner {
                host: host.into(),
                transport: Mutex::new(Some(transport)),
                state_tx,
                state_rx,
                cmd_tx,
                cmd_rx: Mutex::new(Some(cmd_rx)),
            }),
        }
    }

    /// Current protocol state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state_rx.borrow()
    }

    /// Connect the transport, then authenticate with the broker.
    ///
    /// `on_connect` fires once the session reaches `Connected`, or with the
    /// error of the first failing step. `on_disconnect` fires at most once,
    /// when the server errors or drops the connection; it is the last
    /// callback the session ever fires. A second `connect` on the same
    /// session reports `UndefinedError`.
    ///
    /// Must be called from within a tokio runtime: the session task is
    /// spawned onto it.
    pub fn connect(
        &self,
        username: &str,
        password: &str,
        on_connect: impl FnOnce(StompClientError) + Send + 'static,
        on_disconnect: impl FnOnce(StompClientError) + Send + 'static,
    ) {
        let transport = self
            .inner
            .transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let cmd_rx = self
            .inner
            .cmd_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let (Some(transport), Some(cmd_rx)) = (transport, cmd_rx) else {
            on_connect(StompClientError::UndefinedError);
            return;
        };

        let task = SessionTask {
            host: self.inner.host.clone(),
            username: username.to_owned(),
            password: password.to_owned(),
            state_tx: self.inner.state_tx.clone(),
            on_connect: Some(Box::new(on_connect)),
            on_disconnect: Some(Box::new(on_disconnect)),
            subscriptions: HashMap::new(),
            last_subscribed: None,
        };
        tokio::spawn(task.run(transport, cmd_rx));
    }

    /// Subscribe to a destination and return the subscription id.
    ///
    /// `on_subscribe` fires exactly once, on the broker's receipt or on the
    /// first message delivered to the subscription, whichever arrives
    /// first. `on_message` then fires per message, in wire-arrival order.
    /// Outside the `Connected` state the subscription fails synchronously
    /// and the returned id is empty.
    pub fn subscribe(
        &self,
        destination: &str,
        on_subscribe: impl FnOnce(StompClientError, String) + Send + 'static,
        on_message: impl FnMut(StompClientError, String) + Send + 'static,
    ) -> String {
        if !self.state().is_connected() {
            on_subscribe(StompClientError::CouldNotSendSubscribeFrame, String::new());
            return String::new();
        }
        let id = next_subscription_id();
        let command = Command::Subscribe {
            id: id.clone(),
            destination: destination.to_owned(),
            on_subscribe: Box::new(on_subscribe),
            on_message: Box::new(on_message),
        };
        if let Err(rejected) = self.inner.cmd_tx.send(command) {
            // The session task ended between the state check and the send.
            if let Command::Subscribe { on_subscribe, .. } = rejected.0 {
                on_subscribe(StompClientError::CouldNotSendSubscribeFrame, String::new());
            }
            return String::new();
        }
        id
    }

    /// Send a DISCONNECT frame and close the transport.
    ///
    /// `on_close` fires once with `Ok` on a clean close, otherwise with
    /// `CouldNotCloseWebSocketConnection`. Calling `close` outside the
    /// `Connected` state fails the same way. A close the caller asked for
    /// never fires `on_disconnect`.
    pub fn close(&self, on_close: impl FnOnce(StompClientError) + Send + 'static) {
        if !self.state().is_connected() {
            on_close(StompClientError::CouldNotCloseWebSocketConnection);
            return;
        }
        let command = Command::Close {
            on_close: Box::new(on_close),
        };
        if let Err(rejected) = self.inner.cmd_tx.send(command) {
            let Command::Close { on_close } = rejected.0 else {
                return;
            };
            on_close(StompClientError::CouldNotCloseWebSocketConnection);
        }
    }
}

/// The state owned by the session task. Everything the callbacks touch
/// lives here, so one task serializes them all.
struct SessionTask {
    host: String,
    username: String,
    password: String,
    state_tx: watch::Sender<SessionState>,
    on_connect: Option<ConnectHandler>,
    on_disconnect: Option<DisconnectHandler>,
    subscriptions: HashMap<String, Subscription>,
    /// Receives unparseable broker text, if anything is subscribed at all
    last_subscribed: Option<String>,
}

impl SessionTask {
    fn set_state(&self, state: SessionState) {
        let _ = self.state_tx.send(state);
    }

    fn fire_connect(&mut self, outcome: StompClientError) {
        if let Some(on_connect) = self.on_connect.take() {
            on_connect(outcome);
        }
    }

    fn fire_disconnect(&mut self, outcome: StompClientError) {
        if let Some(on_disconnect) = self.on_disconnect.take() {
            on_disconnect(outcome);
        }
    }

    async fn run<T: Transport>(
        mut self,
        transport: T,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    ) {
        self.set_state(SessionState::TransportConnecting);
        let (mut tx, mut rx) = match transport.connect().await {
            Ok(halves) => halves,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "transport connect failed");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                self.set_state(SessionState::Failed);
                self.fire_connect(StompClientError::CouldNotConnectToWebSocketServer);
                return;
            }
        };

        if self.authenticate(&mut tx, &mut rx).await.is_break() {
            return;
        }
        self.set_state(SessionState::Connected);
        self.fire_connect(StompClientError::Ok);

        loop {
            tokio::select! {
                incoming = rx.recv() => match incoming {
                    Some(Ok(text)) => {
                        if self.handle_text(text).is_break() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(error = %e, "transport read failed");
                        #[cfg(not(feature = "tracing"))]
                        let _ = &e;
                        self.set_state(SessionState::Disconnected);
                        self.fire_disconnect(StompClientError::WebSocketServerDisconnected);
                        return;
                    }
                    None => {
                        self.set_state(SessionState::Disconnected);
                        self.fire_disconnect(StompClientError::WebSocketServerDisconnected);
                        return;
                    }
                },
                command = cmd_rx.recv() => match command {
                    Some(Command::Subscribe { id, destination, on_subscribe, on_message }) => {
                        self.handle_subscribe(&mut tx, id, destination, on_subscribe, on_message)
                            .await;
                    }
                    Some(Command::Close { on_close }) => {
                        self.handle_close(&mut tx, on_close).await;
                        return;
                    }
                    None => {
                        // Every handle is gone; nobody is left to observe
                        // callbacks. Close the transport quietly.
                        let _ = tx.close().await;
                        self.set_state(SessionState::Closed);
                        return;
                    }
                },
            }
        }
    }

    /// Send the connect frame and wait for the broker's verdict.
    async fn authenticate(
        &mut self,
        tx: &mut impl TransportTx,
        rx: &mut impl TransportRx,
    ) -> ControlFlow<()> {
        self.set_state(SessionState::Authenticating);

        let wire = StompFrame::connect(&self.host, &self.username, &self.password)
            .and_then(|frame| frame.to_wire());
        let wire = match wire {
            Ok(wire) => wire,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "connect frame construction failed");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                self.set_state(SessionState::Failed);
                self.fire_connect(StompClientError::UnexpectedCouldNotCreateValidFrame);
                return ControlFlow::Break(());
            }
        };
        if tx.send(wire).await.is_err() {
            self.set_state(SessionState::Failed);
            self.fire_connect(StompClientError::CouldNotSendStompFrame);
            return ControlFlow::Break(());
        }

        let Some(Ok(text)) = rx.recv().await else {
            // The broker dropped us before answering the connect frame.
            self.set_state(SessionState::Failed);
            self.fire_disconnect(StompClientError::WebSocketServerDisconnected);
            return ControlFlow::Break(());
        };
        let frame = match StompFrame::parse(&text) {
            Ok(frame) => frame,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "unparseable broker reply to connect");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                self.set_state(SessionState::Failed);
                self.fire_connect(StompClientError::CouldNotParseMessageAsStompFrame);
                return ControlFlow::Break(());
            }
        };
        match frame.command() {
            StompCommand::Connected => ControlFlow::Continue(()),
            StompCommand::Error => {
                #[cfg(feature = "tracing")]
                tracing::warn!(body = %frame.body(), "broker rejected the connect frame");
                self.set_state(SessionState::Disconnected);
                self.fire_disconnect(StompClientError::WebSocketServerDisconnected);
                ControlFlow::Break(())
            }
            _ => {
                self.set_state(SessionState::Failed);
                self.fire_connect(StompClientError::UnexpectedMessageContentType);
                ControlFlow::Break(())
            }
        }
    }

    /// Dispatch one broker message received while connected.
    fn handle_text(&mut self, text: String) -> ControlFlow<()> {
        let frame = match StompFrame::parse(&text) {
            Ok(frame) => frame,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "unparseable broker message");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                if let Some(id) = &self.last_subscribed
                    && let Some(sub) = self.subscriptions.get_mut(id)
                {
                    (sub.on_message)(StompClientError::CouldNotParseMessageAsStompFrame, text);
                }
                return ControlFlow::Continue(());
            }
        };
        match frame.command() {
            StompCommand::Message => {
                let id = frame
                    .header(StompHeader::Subscription)
                    .unwrap_or_default()
                    .to_owned();
                match self.subscriptions.get_mut(&id) {
                    Some(sub) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(id = %id, destination = %sub.destination, "delivering message");
                        sub.confirm(&id);
                        (sub.on_message)(StompClientError::Ok, frame.into_body());
                    }
                    None => {
                        // A message for a subscription this session never
                        // registered. Skip it and keep the session alive.
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            subscription = %id,
                            error = %StompClientError::UnexpectedSubscriptionMismatch,
                            "dropping message"
                        );
                    }
                }
                ControlFlow::Continue(())
            }
            StompCommand::Receipt => {
                let receipt_id = frame.header(StompHeader::ReceiptId).unwrap_or_default();
                if let Some(sub) = self.subscriptions.get_mut(receipt_id) {
                    sub.confirm(receipt_id);
                } else {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(receipt_id = %receipt_id, "receipt for an unknown id");
                }
                ControlFlow::Continue(())
            }
            StompCommand::Error => {
                #[cfg(feature = "tracing")]
                tracing::warn!(body = %frame.body(), "broker error frame");
                self.set_state(SessionState::Disconnected);
                self.fire_disconnect(StompClientError::WebSocketServerDisconnected);
                ControlFlow::Break(())
            }
            _ => {
                self.set_state(SessionState::Disconnected);
                self.fire_disconnect(StompClientError::UnexpectedMessageContentType);
                ControlFlow::Break(())
            }
        }
    }

    async fn handle_subscribe(
        &mut self,
        tx: &mut impl TransportTx,
        id: String,
        destination: String,
        on_subscribe: SubscribeHandler,
        on_message: MessageHandler,
    ) {
        let wire = StompFrame::subscribe(&destination, &id).and_then(|frame| frame.to_wire());
        let wire = match wire {
            Ok(wire) => wire,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "subscribe frame construction failed");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                on_subscribe(
                    StompClientError::UnexpectedCouldNotCreateValidFrame,
                    String::new(),
                );
                return;
            }
        };
        if tx.send(wire).await.is_err() {
            on_subscribe(StompClientError::CouldNotSendSubscribeFrame, String::new());
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(id = %id, destination = %destination, "subscribed");
        self.last_subscribed = Some(id.clone());
        self.subscriptions.insert(
            id,
            Subscription {
                destination,
                on_subscribe: Some(on_subscribe),
                on_message,
            },
        );
    }

    async fn handle_close(&mut self, tx: &mut impl TransportTx, on_close: CloseHandler) {
        self.set_state(SessionState::Closing);
        if let Ok(wire) = StompFrame::disconnect().and_then(|frame| frame.to_wire()) {
            if let Err(e) = tx.send(wire).await {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, "DISCONNECT frame was not delivered");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
        }
        match tx.close().await {
            Ok(()) => {
                self.set_state(SessionState::Closed);
                on_close(StompClientError::Ok);
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "transport close failed");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                self.set_state(SessionState::Closed);
                on_close(StompClientError::CouldNotCloseWebSocketConnection);
            }
        }
        // on_disconnect stays silent for a close the caller asked for.
    }
}
