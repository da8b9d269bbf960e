//! The Publisher collaborator.
//!
//! The controller never talks to a broker directly.  It hands commanded
//! phases to a [`Publisher`], which owns the actual transport (the in-process
//! [`MessageBus`][crate::bus::MessageBus], or an MQTT client living outside
//! this workspace).
//!
//! Delivery guarantees (QoS, retries, reconnects) are the publisher's
//! business.  Callers treat a publish as fire-and-forget; see
//! [`Outbox`][crate::outbox::Outbox].

use std::sync::Arc;

use async_trait::async_trait;
use crossroads_types::CrossroadError;

/// Every outbound transport must implement this trait.
///
/// `publish` may suspend on network I/O.  It must not be called while
/// holding a crossroad's state lock.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Send `payload` on `topic`.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), CrossroadError>;
}

#[async_trait]
impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), CrossroadError> {
        (**self).publish(topic, payload).await
    }
}
