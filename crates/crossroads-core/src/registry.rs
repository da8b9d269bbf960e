//! [`CrossroadRegistry`] – crossroad formation and lookup.
//!
//! The editor decides *which* heads belong together (proximity search over
//! the layout is its business); the registry enforces the structural rules
//! when it is told:
//!
//! * a crossroad holds at most two heads,
//! * a head belongs to at most one crossroad,
//! * a crossroad that loses its last head is discarded.
//!
//! Crossroads are keyed by a stable [`CrossroadId`], so removing one never
//! shifts the identity of another.

use std::collections::HashMap;

use crossroads_middleware::{Outbox, TopicRouter};
use crossroads_types::{CrossroadError, CrossroadId, CrossroadSnapshot, HeadId, SignalHead, Timing};
use tracing::info;

use crate::controller::CrossroadController;

#[derive(Debug)]
pub struct CrossroadRegistry {
    router: TopicRouter,
    outbox: Outbox,
    crossroads: HashMap<CrossroadId, CrossroadController>,
    /// Creation order, for stable listings.
    order: Vec<CrossroadId>,
    placement: HashMap<HeadId, CrossroadId>,
}

impl CrossroadRegistry {
    /// Crossroads created here subscribe through `router` and publish
    /// through `outbox`.
    pub fn new(router: TopicRouter, outbox: Outbox) -> Self {
        Self {
            router,
            outbox,
            crossroads: HashMap::new(),
            order: Vec::new(),
            placement: HashMap::new(),
        }
    }

    /// Place `head` in a new single-head crossroad.
    pub fn create_solo(&mut self, head: SignalHead) -> Result<CrossroadId, CrossroadError> {
        if self.placement.contains_key(&head.id) {
            return Err(CrossroadError::HeadAlreadyPlaced(head.id));
        }
        let id = CrossroadId::new();
        let controller = CrossroadController::new(id, self.router.clone(), self.outbox.clone());
        let head_id = head.id.clone();
        controller.add_head(head)?;

        self.crossroads.insert(id, controller);
        self.order.push(id);
        self.placement.insert(head_id.clone(), id);
        info!(crossroad = %id, head = %head_id, "crossroad created");
        Ok(id)
    }

    /// Add `head` to the crossroad that owns `existing`.
    ///
    /// # Errors
    ///
    /// * [`CrossroadError::UnknownHead`] – `existing` is not placed.
    /// * [`CrossroadError::HeadAlreadyPlaced`] – `head` is already placed.
    /// * [`CrossroadError::CrossroadFull`] – the crossroad has two heads.
    pub fn join(&mut self, existing: &HeadId, head: SignalHead) -> Result<CrossroadId, CrossroadError> {
        let id = *self
            .placement
            .get(existing)
            .ok_or_else(|| CrossroadError::UnknownHead(existing.clone()))?;
        if self.placement.contains_key(&head.id) {
            return Err(CrossroadError::HeadAlreadyPlaced(head.id));
        }
        let head_id = head.id.clone();
        self.controller(id)?.add_head(head)?;
        self.placement.insert(head_id, id);
        Ok(id)
    }

    /// Remove `head`, stopping its crossroad's cycle first.  A crossroad
    /// left without heads is discarded.
    pub fn remove(&mut self, head: &HeadId) -> Result<SignalHead, CrossroadError> {
        let id = self
            .placement
            .remove(head)
            .ok_or_else(|| CrossroadError::UnknownHead(head.clone()))?;
        let controller = self.controller(id)?.clone();
        let removed = controller
            .remove_head(head)
            .ok_or_else(|| CrossroadError::UnknownHead(head.clone()))?;

        if controller.is_empty() {
            self.crossroads.remove(&id);
            self.order.retain(|c| *c != id);
            info!(crossroad = %id, "crossroad discarded");
        }
        Ok(removed)
    }

    /// Assign per-head timings in pair order.
    pub fn configure(&self, crossroad: CrossroadId, timings: &[Timing]) -> Result<(), CrossroadError> {
        self.controller(crossroad)?.configure(timings)
    }

    pub fn start(&self, crossroad: CrossroadId) -> Result<(), CrossroadError> {
        self.controller(crossroad)?.start()
    }

    pub fn stop(&self, crossroad: CrossroadId) -> Result<(), CrossroadError> {
        self.controller(crossroad)?.stop();
        Ok(())
    }

    /// `false` for unknown crossroads.
    pub fn is_running(&self, crossroad: CrossroadId) -> bool {
        self.crossroads
            .get(&crossroad)
            .is_some_and(CrossroadController::is_running)
    }

    /// Stop every running cycle.
    pub fn stop_all(&self) {
        for controller in self.crossroads.values() {
            controller.stop();
        }
    }

    pub fn crossroad_of(&self, head: &HeadId) -> Option<CrossroadId> {
        self.placement.get(head).copied()
    }

    pub fn is_placed(&self, head: &HeadId) -> bool {
        self.placement.contains_key(head)
    }

    pub fn get(&self, crossroad: CrossroadId) -> Option<&CrossroadController> {
        self.crossroads.get(&crossroad)
    }

    pub fn snapshot(&self, crossroad: CrossroadId) -> Option<CrossroadSnapshot> {
        self.crossroads.get(&crossroad).map(CrossroadController::snapshot)
    }

    /// Snapshots of every crossroad in creation order.
    pub fn list(&self) -> Vec<CrossroadSnapshot> {
        self.order
            .iter()
            .filter_map(|id| self.snapshot(*id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.crossroads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crossroads.is_empty()
    }

    fn controller(&self, crossroad: CrossroadId) -> Result<&CrossroadController, CrossroadError> {
        self.crossroads
            .get(&crossroad)
            .ok_or(CrossroadError::UnknownCrossroad(crossroad))
    }
}
