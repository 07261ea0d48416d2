//! Unit of work: one storage transaction, one commit/rollback decision.
//!
//! A [`UnitOfWork`] owns a single sqlx transaction, tracks every aggregate it
//! has seen (loaded or newly added), and drains their event outboxes through
//! the handler registry before the storage commit. Handlers therefore execute
//! inside the transaction: a failing handler rolls the whole command back and
//! an event is never observed for a write that did not durably commit.

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::Aggregate;
use crate::errors::{ServiceError, ServiceResult};
use crate::events::EventHandlerRegistry;

/// Persistence seam between a unit of work and one aggregate type.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Aggregate: Aggregate;

    /// Inserts a new aggregate and fills in its generated identity.
    async fn insert(
        conn: &mut SqliteConnection,
        aggregate: &mut Self::Aggregate,
    ) -> ServiceResult<()>;

    /// Loads an aggregate by id, including soft-deleted rows; business rules
    /// decide what a removed aggregate may still do.
    async fn fetch(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> ServiceResult<Option<Self::Aggregate>>;

    /// Writes the aggregate's current state back to its row.
    async fn persist(
        conn: &mut SqliteConnection,
        aggregate: &Self::Aggregate,
    ) -> ServiceResult<()>;
}

/// Shared handle to a tracked aggregate.
pub type Tracked<A> = Arc<Mutex<A>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UowState {
    Idle,
    Active,
}

/// Scope token returned by [`UnitOfWork::autocommit`].
///
/// When a transaction was already active the token does not own the outcome
/// and [`UnitOfWork::finish`] becomes a pass-through, leaving commit/rollback
/// to the outer caller. The nesting behavior is thereby explicit rather than
/// hidden instance state.
#[must_use]
pub struct Autocommit {
    owns: bool,
}

pub struct UnitOfWork<R: Repository> {
    pool: SqlitePool,
    registry: Arc<EventHandlerRegistry>,
    state: UowState,
    tx: Option<Transaction<'static, Sqlite>>,
    seen: Vec<Tracked<R::Aggregate>>,
}

impl<R: Repository> UnitOfWork<R> {
    pub fn new(pool: SqlitePool, registry: Arc<EventHandlerRegistry>) -> Self {
        UnitOfWork {
            pool,
            registry,
            state: UowState::Idle,
            tx: None,
            seen: Vec::new(),
        }
    }

    /// Starts the transaction. Re-entrant begin is a programming error and
    /// fails with `DuplicateUnitOfWork`.
    pub async fn begin(&mut self) -> ServiceResult<()> {
        if self.state == UowState::Active {
            return Err(ServiceError::DuplicateUnitOfWork);
        }
        self.tx = Some(self.pool.begin().await?);
        self.state = UowState::Active;
        Ok(())
    }

    /// Opens a transaction scope that degrades to a no-op pass-through when
    /// one is already active.
    pub async fn autocommit(&mut self) -> ServiceResult<Autocommit> {
        if self.state == UowState::Active {
            return Ok(Autocommit { owns: false });
        }
        self.begin().await?;
        Ok(Autocommit { owns: true })
    }

    /// Closes an [`autocommit`](Self::autocommit) scope: commits on success,
    /// rolls back on failure, and re-raises the original error unchanged.
    pub async fn finish<T>(
        &mut self,
        scope: Autocommit,
        result: ServiceResult<T>,
    ) -> ServiceResult<T> {
        if !scope.owns {
            return result;
        }
        match result {
            Ok(value) => match self.commit().await {
                Ok(()) => Ok(value),
                Err(commit_error) => {
                    self.rollback_quietly().await;
                    Err(commit_error)
                }
            },
            Err(error) => {
                self.rollback_quietly().await;
                Err(error)
            }
        }
    }

    /// The active transactional session.
    pub fn session(&mut self) -> ServiceResult<&mut SqliteConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| ServiceError::system_fault("no active session"))
    }

    /// Inserts a new aggregate and tracks it. The generated identity is
    /// available on the returned handle immediately.
    pub async fn add(&mut self, mut aggregate: R::Aggregate) -> ServiceResult<Tracked<R::Aggregate>> {
        R::insert(self.session()?, &mut aggregate).await?;
        Ok(self.track(aggregate))
    }

    /// Loads and tracks an aggregate by id.
    pub async fn get(&mut self, id: i64) -> ServiceResult<Option<Tracked<R::Aggregate>>> {
        match R::fetch(self.session()?, id).await? {
            Some(aggregate) => Ok(Some(self.track(aggregate))),
            None => Ok(None),
        }
    }

    /// Registers an aggregate loaded outside [`get`](Self::get) so that its
    /// outbox drains at commit.
    pub fn track(&mut self, aggregate: R::Aggregate) -> Tracked<R::Aggregate> {
        let handle = Arc::new(Mutex::new(aggregate));
        self.seen.push(handle.clone());
        handle
    }

    /// Writes every tracked aggregate's pending state so subsequent reads in
    /// the same transaction observe it. Does not end the transaction.
    pub async fn flush(&mut self) -> ServiceResult<()> {
        let tx = self
            .tx
            .as_deref_mut()
            .ok_or_else(|| ServiceError::system_fault("flush without active session"))?;
        for handle in &self.seen {
            let aggregate = handle.lock().await;
            R::persist(&mut *tx, &aggregate).await?;
        }
        Ok(())
    }

    /// Drains every seen aggregate's outbox in first-seen order; within one
    /// aggregate, events dispatch in enqueue order.
    async fn handle_events(&mut self) -> ServiceResult<()> {
        let registry = self.registry.clone();
        let tx = self
            .tx
            .as_deref_mut()
            .ok_or_else(|| ServiceError::system_fault("event dispatch without active session"))?;
        for handle in &self.seen {
            let mut aggregate = handle.lock().await;
            while let Some(event) = aggregate.take_event() {
                tracing::debug!(
                    aggregate_id = aggregate.id(),
                    kind = %event.kind(),
                    "dispatching event"
                );
                registry.handle(&event, &mut *tx).await?;
            }
        }
        Ok(())
    }

    /// Flushes tracked state, dispatches pending events, then commits.
    pub async fn commit(&mut self) -> ServiceResult<()> {
        if self.state != UowState::Active {
            return Err(ServiceError::system_fault("commit without active transaction"));
        }
        self.flush().await?;
        self.handle_events().await?;
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ServiceError::system_fault("commit without active session"))?;
        tx.commit().await?;
        self.seen.clear();
        self.state = UowState::Idle;
        Ok(())
    }

    /// Discards all uncommitted writes together with any still-queued events.
    pub async fn rollback(&mut self) -> ServiceResult<()> {
        let tx = self.tx.take();
        self.seen.clear();
        self.state = UowState::Idle;
        if let Some(tx) = tx {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn rollback_quietly(&mut self) {
        if let Err(error) = self.rollback().await {
            tracing::error!(%error, "rollback failed");
        }
    }
}
