//! Event handler registry and dispatch loop.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::event::{DomainEvent, EventKind};
use crate::errors::ServiceResult;

/// Context supplied to every handler. Handlers that don't need the
/// transactional session simply ignore it.
pub struct EventContext<'a> {
    pub event: &'a DomainEvent,
    pub session: &'a mut SqliteConnection,
}

/// A side-effect handler for one or more event kinds.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, ctx: &mut EventContext<'_>) -> ServiceResult<()>;
}

/// Immutable mapping from event kind to an ordered list of handlers.
///
/// Handlers run sequentially in registration order, each awaited before the
/// next; there is deliberately no fan-out concurrency so that e.g. the audit
/// appender can run before the mailer for the same event.
pub struct EventHandlerRegistry {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl EventHandlerRegistry {
    pub fn builder() -> EventHandlerRegistryBuilder {
        EventHandlerRegistryBuilder {
            handlers: HashMap::new(),
        }
    }

    /// Dispatches one event to its registered handlers.
    ///
    /// An event kind with no registered handlers is logged and skipped; it
    /// never fails the transaction. A handler error propagates and fails the
    /// enclosing unit of work.
    pub async fn handle(
        &self,
        event: &DomainEvent,
        session: &mut SqliteConnection,
    ) -> ServiceResult<()> {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            tracing::error!(kind = %event.kind(), "no handler registered for event");
            return Ok(());
        };

        for handler in handlers {
            let mut ctx = EventContext {
                event,
                session: &mut *session,
            };
            handler.handle(&mut ctx).await?;
        }
        Ok(())
    }
}

pub struct EventHandlerRegistryBuilder {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl EventHandlerRegistryBuilder {
    /// Appends a handler to the ordered list for `kind`.
    pub fn on(mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.entry(kind).or_default().push(handler);
        self
    }

    pub fn build(self) -> EventHandlerRegistry {
        EventHandlerRegistry {
            handlers: self.handlers,
        }
    }
}
