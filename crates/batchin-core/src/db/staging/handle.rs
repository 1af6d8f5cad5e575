use crate::{
    db::{
        dialect::Dialect,
        expr::Expr,
        session::{CancelToken, Session, Statement, StatementKind},
        staging::TableName,
    },
    error::CleanupError,
    obs::sink::{MetricsEvent, MetricsSink, record, with_metrics_sink},
};
use std::{fmt, ops::Deref};
use tracing::{debug, warn};

///
/// StagingState
///
/// Lifecycle of a cleanup handle.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StagingState {
    /// Nothing was staged (Simple, Chunk, or empty plans).
    Inert,

    /// A staging table exists and has not been dropped.
    Staged,

    /// The one-shot drop has been issued.
    Cleaned,
}

///
/// StagingCleanup
///
/// The only path to drop a staging table. `cleanup` issues `DROP TABLE`
/// exactly once; later calls are no-ops. A failed drop is not retried.
///
/// Dropping the handle without calling `cleanup` leaves the table to the
/// database's own session teardown.
///

#[must_use = "the staging table is only dropped when cleanup() is called"]
pub struct StagingCleanup<'s, S: Session + ?Sized> {
    target: Option<Target<'s, S>>,
    state: StagingState,
}

struct Target<'s, S: Session + ?Sized> {
    session: &'s S,
    dialect: Dialect,
    table: TableName,
    metrics: Option<&'static dyn MetricsSink>,
}

impl<'s, S: Session + ?Sized> StagingCleanup<'s, S> {
    pub(crate) const fn inert() -> Self {
        Self {
            target: None,
            state: StagingState::Inert,
        }
    }

    pub(crate) const fn staged(
        session: &'s S,
        dialect: Dialect,
        table: TableName,
        metrics: Option<&'static dyn MetricsSink>,
    ) -> Self {
        Self {
            target: Some(Target {
                session,
                dialect,
                table,
                metrics,
            }),
            state: StagingState::Staged,
        }
    }

    #[must_use]
    pub const fn state(&self) -> StagingState {
        self.state
    }

    #[must_use]
    pub fn table(&self) -> Option<&TableName> {
        self.target.as_ref().map(|target| &target.table)
    }

    /// Drop the staging table. Safe to call any number of times.
    pub fn cleanup(&mut self) -> Result<(), CleanupError> {
        if self.state != StagingState::Staged {
            return Ok(());
        }
        let Some(target) = self.target.as_ref() else {
            return Ok(());
        };

        // flip before issuing the statement so the drop is never repeated
        self.state = StagingState::Cleaned;

        with_metrics_sink(target.metrics, || {
            let drop = Statement::new(
                StatementKind::DropTable,
                target.dialect.drop_table(&target.table, false),
            );

            match target.session.execute(&drop, &CancelToken::new()) {
                Ok(_) => {
                    record(MetricsEvent::StagingDropped {
                        compensating: false,
                    });
                    debug!(table = %target.table, "dropped staging table");

                    Ok(())
                }
                Err(source) => {
                    record(MetricsEvent::CleanupFailed);

                    Err(CleanupError {
                        table: target.table.clone(),
                        source,
                    })
                }
            }
        })
    }
}

impl<S: Session + ?Sized> fmt::Debug for StagingCleanup<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingCleanup")
            .field("table", &self.table())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

///
/// AutoCleanup
///
/// A staged expression that drops its table when it goes out of scope.
/// Keep it alive until the outer query that uses it has finished.
///

#[must_use = "dropping the guard immediately drops the staging table"]
pub struct AutoCleanup<'s, S: Session + ?Sized> {
    expr: Expr,
    cleanup: StagingCleanup<'s, S>,
}

impl<'s, S: Session + ?Sized> AutoCleanup<'s, S> {
    pub(crate) fn new(expr: Expr, cleanup: StagingCleanup<'s, S>) -> Self {
        Self { expr, cleanup }
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub const fn state(&self) -> StagingState {
        self.cleanup.state()
    }

    /// Drop the staging table now and surface any failure.
    pub fn finish(mut self) -> Result<(), CleanupError> {
        self.cleanup.cleanup()
    }
}

impl<S: Session + ?Sized> fmt::Debug for AutoCleanup<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoCleanup")
            .field("expr", &self.expr)
            .field("cleanup", &self.cleanup)
            .finish()
    }
}

impl<S: Session + ?Sized> Deref for AutoCleanup<'_, S> {
    type Target = Expr;

    fn deref(&self) -> &Self::Target {
        &self.expr
    }
}

impl<S: Session + ?Sized> Drop for AutoCleanup<'_, S> {
    fn drop(&mut self) {
        if let Err(err) = self.cleanup.cleanup() {
            warn!(table = %err.table, error = %err, "automatic staging cleanup failed");
        }
    }
}
