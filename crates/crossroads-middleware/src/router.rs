//! [`TopicRouter`] – pattern → handler dispatch table.
//!
//! Inbound transport messages are offered to [`TopicRouter::route`], which
//! evaluates every registered pattern with [`topic::matches`] and invokes each
//! matching handler once with the original topic and payload.  Messages that
//! match nothing are dropped; that is normal traffic, not an error.
//!
//! The table is shared: clones of a router see the same subscriptions, so the
//! dispatcher task and the controllers that subscribe can each hold one.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::topic;

/// Callback invoked with `(topic, payload)` for every matching message.
pub type Handler = Arc<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Clone, Default)]
pub struct TopicRouter {
    routes: Arc<RwLock<HashMap<String, Handler>>>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `pattern`.
    ///
    /// Subscribing again to the same pattern replaces the previous handler,
    /// so a message is never delivered twice through one pattern.  Returns
    /// `true` when an existing handler was replaced.
    pub fn subscribe<F>(&self, pattern: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        let pattern = pattern.into();
        debug!(%pattern, "subscribe");
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pattern, Arc::new(handler))
            .is_some()
    }

    /// Remove the handler for `pattern`.  No-op (returns `false`) if absent.
    pub fn unsubscribe(&self, pattern: &str) -> bool {
        debug!(%pattern, "unsubscribe");
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(pattern)
            .is_some()
    }

    /// Deliver a message to every handler whose pattern matches `topic`.
    ///
    /// Returns the number of handlers invoked.  Handlers run after the table
    /// lock is released, so they may subscribe or unsubscribe themselves.
    pub fn route(&self, topic: &str, payload: &str) -> usize {
        let matched: Vec<Handler> = {
            let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
            routes
                .iter()
                .filter(|(pattern, _)| {
                    let hit = topic::matches(pattern, topic);
                    trace!(%pattern, %topic, hit, "evaluate pattern");
                    hit
                })
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };

        if matched.is_empty() {
            trace!(%topic, "no subscriber; message dropped");
        }
        for handler in &matched {
            handler(topic, payload);
        }
        matched.len()
    }

    pub fn is_subscribed(&self, pattern: &str) -> bool {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(pattern)
    }

    /// Registered patterns, sorted for stable output.
    pub fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        patterns.sort();
        patterns
    }

    pub fn len(&self) -> usize {
        self.routes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicRouter")
            .field("patterns", &self.patterns())
            .finish()
    }
}
