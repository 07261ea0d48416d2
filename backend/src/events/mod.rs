//! Domain-event dispatch.
//!
//! A registry maps event kinds to ordered handler lists, fixed at
//! construction. The unit of work drains aggregate outboxes through
//! [`dispatcher::EventHandlerRegistry::handle`] before the storage commit, so
//! handlers run inside the transaction and a failing handler rolls the whole
//! command back.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::{EventContext, EventHandler, EventHandlerRegistry};
