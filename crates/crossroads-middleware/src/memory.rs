//! In-memory [`Publisher`] for tests and dry runs.
//!
//! [`MemoryPublisher`] records every published message together with the
//! Tokio instant at which it was handed over.  Under a paused Tokio clock the
//! instants are exact, which makes cycle timing directly assertable.
//!
//! ## Limitations
//!
//! - Nothing leaves the process.
//! - The log grows without bound.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use crossroads_types::CrossroadError;
use tokio::time::Instant;

use crate::publisher::Publisher;

/// One recorded publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub at: Instant,
}

/// Publisher that keeps every message in memory.  Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    log: Arc<Mutex<Vec<Published>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything published so far, in publish order.
    pub fn messages(&self) -> Vec<Published> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Payloads published on `topic`, in order.
    pub fn payloads_for(&self, topic: &str) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.payload.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Make subsequent publishes fail with [`CrossroadError::Transport`].
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), CrossroadError> {
        if *self.fail.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(CrossroadError::Transport(format!(
                "memory publisher refused '{topic}'"
            )));
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Published {
                topic: topic.to_string(),
                payload: payload.to_string(),
                at: Instant::now(),
            });
        Ok(())
    }
}
