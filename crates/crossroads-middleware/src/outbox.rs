//! [`Outbox`] – fire-and-forget, order-preserving publishing.
//!
//! State changes are decided under a crossroad's lock, but publishing may
//! suspend on network I/O.  The controller therefore only *posts* messages to
//! an unbounded queue (a synchronous, non-suspending call) and a single pump
//! task drains the queue into the [`Publisher`], one message at a time, in
//! post order.  Publish failures are logged and never retried here.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::publisher::Publisher;

#[derive(Debug)]
struct Outgoing {
    topic: String,
    payload: String,
}

/// Sending half of the publish queue.  Clone freely.
#[derive(Clone, Debug)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl Outbox {
    /// Create the queue and spawn its pump on the current Tokio runtime.
    ///
    /// The pump exits once every `Outbox` clone has been dropped and the
    /// queue is drained.
    pub fn spawn(publisher: Arc<dyn Publisher>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(pump(rx, publisher));
        (Self { tx }, handle)
    }

    /// Queue `payload` for `topic`.  Never blocks.
    pub fn post(&self, topic: impl Into<String>, payload: impl Into<String>) {
        let outgoing = Outgoing {
            topic: topic.into(),
            payload: payload.into(),
        };
        if let Err(mpsc::error::SendError(lost)) = self.tx.send(outgoing) {
            warn!(topic = %lost.topic, "outbox pump has stopped; message dropped");
        }
    }
}

async fn pump(mut rx: mpsc::UnboundedReceiver<Outgoing>, publisher: Arc<dyn Publisher>) {
    while let Some(outgoing) = rx.recv().await {
        match publisher.publish(&outgoing.topic, &outgoing.payload).await {
            Ok(()) => debug!(topic = %outgoing.topic, payload = %outgoing.payload, "published"),
            Err(e) => warn!(topic = %outgoing.topic, error = %e, "publish failed; not retried"),
        }
    }
    debug!("outbox pump finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPublisher;

    #[tokio::test]
    async fn preserves_post_order() {
        let publisher = MemoryPublisher::new();
        let (outbox, pump) = Outbox::spawn(Arc::new(publisher.clone()));

        for i in 0..20 {
            outbox.post("seq", i.to_string());
        }
        drop(outbox);
        pump.await.unwrap();

        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(publisher.payloads_for("seq"), expected);
    }

    struct RejectFirst {
        inner: MemoryPublisher,
        rejected: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl Publisher for RejectFirst {
        async fn publish(
            &self,
            topic: &str,
            payload: &str,
        ) -> Result<(), crossroads_types::CrossroadError> {
            use std::sync::atomic::Ordering;
            if !self.rejected.swap(true, Ordering::SeqCst) {
                return Err(crossroads_types::CrossroadError::Transport("broker down".into()));
            }
            self.inner.publish(topic, payload).await
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_pump() {
        let publisher = MemoryPublisher::new();
        let rejecting = RejectFirst {
            inner: publisher.clone(),
            rejected: Default::default(),
        };
        let (outbox, pump) = Outbox::spawn(Arc::new(rejecting));

        outbox.post("t", "lost");
        outbox.post("t", "kept");
        drop(outbox);
        pump.await.unwrap();

        assert_eq!(publisher.payloads_for("t"), vec!["kept"]);
    }
}
