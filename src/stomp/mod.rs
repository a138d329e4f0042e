//! STOMP client session layer.
//!
//! [`StompClient`] drives the STOMP 1.2 protocol over one transport:
//! authentication, subscription receipts, message fanout to per-subscription
//! handlers, and the mapping of broker failures onto the closed
//! [`StompClientError`] set. All callbacks of one session run on a single
//! session task, so they are serialized with respect to each other.

pub mod error;
pub mod session;
pub mod subscription;

pub use error::StompClientError;
pub use session::{SessionState, StompClient};
