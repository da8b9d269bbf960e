//! `crossroads-middleware` – topic routing and transport plumbing.
//!
//! Moves messages between the controller and the outside world without
//! caring what they mean.
//!
//! # Modules
//!
//! - [`topic`] – wildcard (`+`, `#`) topic matching.
//! - [`router`] – [`TopicRouter`]: pattern → handler table that dispatches
//!   each inbound message to every matching handler.
//! - [`bus`] – [`MessageBus`]: in-process broadcast transport.
//! - [`publisher`] – the [`Publisher`] trait every outbound transport
//!   implements.
//! - [`outbox`] – [`Outbox`]: fire-and-forget, order-preserving publishing.
//! - [`dispatcher`] – [`Dispatcher`]: task that feeds bus traffic to a router.
//! - [`memory`] – [`MemoryPublisher`]: recording publisher for tests.

pub mod bus;
pub mod dispatcher;
pub mod memory;
pub mod outbox;
pub mod publisher;
pub mod router;
pub mod topic;

pub use bus::{MessageBus, TopicSubscriber};
pub use dispatcher::Dispatcher;
pub use memory::{MemoryPublisher, Published};
pub use outbox::Outbox;
pub use publisher::Publisher;
pub use router::{Handler, TopicRouter};
