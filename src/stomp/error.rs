use std::error::Error as StdError;
use std::fmt;

/// Outcome codes delivered to session callbacks.
///
/// This is the closed set a user of [`StompClient`](super::StompClient)
/// ever observes; transport and codec errors are folded into it before they
/// reach a callback.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompClientError {
    Ok,
    UndefinedError,
    CouldNotCloseWebSocketConnection,
    CouldNotConnectToWebSocketServer,
    CouldNotParseMessageAsStompFrame,
    CouldNotSendStompFrame,
    CouldNotSendSubscribeFrame,
    UnexpectedCouldNotCreateValidFrame,
    UnexpectedMessageContentType,
    UnexpectedSubscriptionMismatch,
    WebSocketServerDisconnected,
}

impl StompClientError {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for StompClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Ok => "ok",
            Self::UndefinedError => "undefined error",
            Self::CouldNotCloseWebSocketConnection => "could not close the WebSocket connection",
            Self::CouldNotConnectToWebSocketServer => "could not connect to the WebSocket server",
            Self::CouldNotParseMessageAsStompFrame => "could not parse message as a STOMP frame",
            Self::CouldNotSendStompFrame => "could not send the STOMP connect frame",
            Self::CouldNotSendSubscribeFrame => "could not send the STOMP subscribe frame",
            Self::UnexpectedCouldNotCreateValidFrame => {
                "unexpected: could not create a valid STOMP frame"
            }
            Self::UnexpectedMessageContentType => "unexpected message content type",
            Self::UnexpectedSubscriptionMismatch => "unexpected subscription mismatch",
            Self::WebSocketServerDisconnected => "the server closed the connection",
        };
        f.write_str(message)
    }
}

impl StdError for StompClientError {}

impl From<StompClientError> for crate::error::Error {
    fn from(e: StompClientError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::Session, e)
    }
}
