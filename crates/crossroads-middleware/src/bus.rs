//! In-process publish/subscribe transport.
//!
//! [`MessageBus`] carries [`TransportMessage`]s over a single
//! [`tokio::sync::broadcast`] channel so that every subscriber receives every
//! message without any single subscriber blocking the others.  It stands in
//! for a broker connection: the controller publishes commanded phases onto
//! it, and sensor traffic injected onto it is fed to the [`TopicRouter`]
//! by the [`Dispatcher`].
//!
//! [`TopicRouter`]: crate::router::TopicRouter
//! [`Dispatcher`]: crate::dispatcher::Dispatcher

use async_trait::async_trait;
use crossroads_types::{CrossroadError, TransportMessage};
use tokio::sync::broadcast;
use tracing::warn;

use crate::publisher::Publisher;
use crate::topic;

/// Default channel capacity (number of buffered messages before old ones are
/// dropped for slow subscribers).
pub const DEFAULT_CAPACITY: usize = 256;

/// Shared message bus. Clone it cheaply – all clones share the same
/// underlying broadcast channel.
#[derive(Clone, Debug)]
pub struct MessageBus {
    sender: broadcast::Sender<TransportMessage>,
}

impl MessageBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish `payload` under `topic`.
    ///
    /// Returns the number of subscribers that were handed the message.
    /// `Ok(0)` means nobody is listening, which is a normal condition.
    pub fn publish(
        &self,
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<usize, CrossroadError> {
        match self.sender.send(TransportMessage::new(topic, payload)) {
            Ok(n) => Ok(n),
            Err(broadcast::error::SendError(_)) => Ok(0),
        }
    }

    /// Subscribe to every message on the bus.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportMessage> {
        self.sender.subscribe()
    }

    /// Subscribe and return a [`TopicSubscriber`] that only yields messages
    /// whose topic matches `pattern` (wildcards allowed).
    pub fn subscribe_pattern(&self, pattern: impl Into<String>) -> TopicSubscriber {
        TopicSubscriber {
            pattern: pattern.into(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Publisher for MessageBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), CrossroadError> {
        MessageBus::publish(self, topic, payload).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Pattern-filtered subscriber
// ---------------------------------------------------------------------------

/// A subscriber that only delivers messages whose topic matches its pattern.
pub struct TopicSubscriber {
    pattern: String,
    receiver: broadcast::Receiver<TransportMessage>,
}

impl TopicSubscriber {
    /// Wait for the next matching message.
    ///
    /// Returns `None` when the bus is closed and no further messages will
    /// arrive.
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if topic::matches(&self.pattern, &message.topic) => {
                    return Some(message);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(pattern = %self.pattern, lagged_by = n, "TopicSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
