//! [`HeadDiscovery`] – collects heads announcing themselves on
//! `traffic-light/<id>/new`.
//!
//! Discovery only remembers identifiers; placing a discovered head into a
//! crossroad is left to the caller.

use std::sync::{Arc, Mutex, PoisonError};

use crossroads_middleware::TopicRouter;
use crossroads_types::{topics, HeadId};
use tracing::{debug, info};

use crate::registry::CrossroadRegistry;

#[derive(Debug, Clone, Default)]
pub struct HeadDiscovery {
    found: Arc<Mutex<Vec<HeadId>>>,
}

impl HeadDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening for announcements on `router`.
    pub fn attach(&self, router: &TopicRouter) {
        let found = Arc::clone(&self.found);
        router.subscribe(topics::NEW_HEAD_PATTERN, move |topic, _payload| {
            match topics::parse_new_head(topic) {
                Some(head) => record(&found, head),
                None => debug!(topic, "ignoring malformed announcement"),
            }
        });
    }

    pub fn detach(&self, router: &TopicRouter) {
        router.unsubscribe(topics::NEW_HEAD_PATTERN);
    }

    /// Remember `head`.  Repeated announcements are collapsed.
    pub fn record(&self, head: HeadId) {
        record(&self.found, head);
    }

    /// Every head announced so far, in announcement order.
    pub fn found(&self) -> Vec<HeadId> {
        self.found
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Announced heads that are not yet part of any crossroad.
    pub fn unplaced(&self, registry: &CrossroadRegistry) -> Vec<HeadId> {
        self.found()
            .into_iter()
            .filter(|head| !registry.is_placed(head))
            .collect()
    }
}

fn record(found: &Mutex<Vec<HeadId>>, head: HeadId) {
    let mut found = found.lock().unwrap_or_else(PoisonError::into_inner);
    if !found.contains(&head) {
        info!(head = %head, "signal head announced");
        found.push(head);
    }
}
