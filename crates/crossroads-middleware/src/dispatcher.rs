//! [`Dispatcher`] – feeds inbound bus traffic into a [`TopicRouter`].

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::MessageBus;
use crate::router::TopicRouter;

/// Background task that routes every message seen on a [`MessageBus`].
pub struct Dispatcher {
    handle: JoinHandle<()>,
}

impl Dispatcher {
    /// Subscribe to `bus` and spawn the routing loop on the current runtime.
    ///
    /// The bus subscription is taken before this returns, so messages
    /// published afterwards are never missed.
    pub fn spawn(bus: &MessageBus, router: TopicRouter) -> Self {
        let mut rx = bus.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => {
                        let delivered = router.route(&message.topic, &message.payload);
                        debug!(topic = %message.topic, delivered, "routed");
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "dispatcher lagged; inbound messages lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("dispatcher finished");
        });
        Self { handle }
    }

    /// Stop routing.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
