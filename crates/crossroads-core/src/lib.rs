//! `crossroads-core` – signal cycling and crossroad formation.
//!
//! Decides what every signal head shows and when.  Transport concerns live
//! in `crossroads-middleware`; this crate only posts state changes to an
//! [`Outbox`][crossroads_middleware::Outbox] and reacts to messages handed
//! to it by a [`TopicRouter`][crossroads_middleware::TopicRouter].
//!
//! # Modules
//!
//! - [`cycle`] – [`CyclePhase`]: the four-state joint phase machine and its
//!   dwell table.
//! - [`controller`] – [`CrossroadController`]: timer-driven cycling of one
//!   pair, with sensor preemption.
//! - [`registry`] – [`CrossroadRegistry`]: pairing API (`create_solo`,
//!   `join`, `remove`) and per-crossroad lookup.
//! - [`discovery`] – [`HeadDiscovery`]: records heads announcing themselves
//!   on the bus.

pub mod controller;
pub mod cycle;
pub mod discovery;
pub mod registry;

pub use controller::{CrossroadController, MAX_HEADS};
pub use cycle::{CyclePhase, Side, PREEMPT_INTERVAL};
pub use discovery::HeadDiscovery;
pub use registry::CrossroadRegistry;
