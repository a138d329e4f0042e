use std::sync::atomic::{AtomicU64, Ordering};

use super::error::StompClientError;

/// One-shot handler confirming a subscription, called with the outcome and
/// the subscription id.
pub type SubscribeHandler = Box<dyn FnOnce(StompClientError, String) + Send>;

/// Per-message handler of a subscription, called with the outcome and the
/// frame body.
pub type MessageHandler = Box<dyn FnMut(StompClientError, String) + Send>;

// Subscription ids must stay unique across every concurrent session in the
// process, so the counter is a process-wide atomic.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_subscription_id() -> String {
    NEXT_SUBSCRIPTION_ID
        .fetch_add(1, Ordering::Relaxed)
        .to_string()
}

/// A registered subscription: its destination, its message handler and the
/// one-shot confirmation latch.
pub(crate) struct Subscription {
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub destination: String,
    pub on_subscribe: Option<SubscribeHandler>,
    pub on_message: MessageHandler,
}

impl Subscription {
    /// Fire the one-shot confirmation if it has not fired yet. Both a
    /// RECEIPT and the first delivered MESSAGE land here; whichever comes
    /// first wins.
    pub fn confirm(&mut self, id: &str) {
        if let Some(on_subscribe) = self.on_subscribe.take() {
            on_subscribe(StompClientError::Ok, id.to_owned());
        }
    }
}
