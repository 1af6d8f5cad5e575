//! Module: db::staging
//! Responsibility: the full lifecycle of one session-scoped staging table.
//! Does not own: strategy selection or expression composition.
//! Boundary: the only code that issues statements against a `Session`.
//!
//! Steps are strictly sequential (create, insert batches, index). Any failure
//! after the name is generated triggers a compensating `DROP TABLE IF EXISTS`
//! whose outcome is folded into the returned error.

mod handle;
mod name;


use crate::{
    config::Config,
    db::{
        column::Column,
        dialect::Dialect,
        expr::{Expr, STAGING_COLUMN, SqlWriter},
        optimizer::emit,
        session::{CancelToken, Session, SessionError, Statement, StatementKind},
    },
    error::{CleanupError, OptimizeError, StagingError, StagingPhase},
    obs::sink::{MetricsEvent, MetricsSink, record},
    value::Value,
};
use tracing::{debug, warn};

// re-exports
pub use handle::{AutoCleanup, StagingCleanup, StagingState};
pub use name::{NAME_SUFFIX_LEN, TableName};

///
/// TempTableManager
///
/// Stages one value set for one session. Holds no state between calls;
/// every call generates its own table name.
///

pub(crate) struct TempTableManager<'a> {
    config: &'a Config,
    cancel: &'a CancelToken,
    metrics: Option<&'static dyn MetricsSink>,
}

impl<'a> TempTableManager<'a> {
    pub(crate) const fn new(
        config: &'a Config,
        cancel: &'a CancelToken,
        metrics: Option<&'static dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            cancel,
            metrics,
        }
    }

    /// Create, populate, and index a staging table, then emit the
    /// membership expression that probes it.
    pub(crate) fn execute<'s, S: Session + ?Sized>(
        &self,
        session: &'s S,
        column: &Column,
        values: &[Value],
        negated: bool,
    ) -> Result<(Expr, StagingCleanup<'s, S>), OptimizeError> {
        let dialect = session.dialect();
        let table = name::generate(&self.config.table_name_prefix);

        debug!(
            table = %table,
            column = %column,
            dialect = %dialect,
            values = values.len(),
            batch_size = self.config.insert_batch_size,
            "staging membership values"
        );

        if let Err(err) = self.populate(session, dialect, &table, column, values) {
            return Err(compensate(session, dialect, err));
        }

        let expr = emit::staged(column.clone(), table.clone(), negated);
        let cleanup = StagingCleanup::staged(session, dialect, table, self.metrics);

        Ok((expr, cleanup))
    }

    fn populate<S: Session + ?Sized>(
        &self,
        session: &S,
        dialect: Dialect,
        table: &TableName,
        column: &Column,
        values: &[Value],
    ) -> Result<(), StagingError> {
        // create
        let create = Statement::new(
            StatementKind::CreateTable,
            dialect.create_temp_table(table, STAGING_COLUMN, column.ty()),
        );
        self.run(session, &create).map_err(|source| {
            phase_error(table, StagingPhase::Create, source, |table, source| {
                StagingError::Create { table, source }
            })
        })?;
        record(MetricsEvent::StagingCreated);

        // insert
        let batch_size = self.config.insert_batch_size;
        let batches = values.len().div_ceil(batch_size);
        for (i, chunk) in values.chunks(batch_size).enumerate() {
            let insert = insert_statement(dialect, table, chunk);
            self.run(session, &insert).map_err(|source| {
                phase_error(table, StagingPhase::Insert, source, |table, source| {
                    StagingError::Insert {
                        table,
                        batch: i + 1,
                        batches,
                        source,
                    }
                })
            })?;
            record(MetricsEvent::BatchInserted {
                rows: chunk.len() as u64,
            });
        }

        // index
        if dialect.supports_index(column.ty()) {
            let index = Statement::new(
                StatementKind::CreateIndex,
                dialect.create_index(&table.index_name(), table, STAGING_COLUMN, column.ty()),
            );
            self.run(session, &index).map_err(|source| {
                phase_error(table, StagingPhase::Index, source, |table, source| {
                    StagingError::Index { table, source }
                })
            })?;
            record(MetricsEvent::StagingIndexed);
        } else {
            debug!(
                table = %table,
                ty = %column.ty(),
                "staging column type cannot be indexed; skipping index"
            );
        }

        Ok(())
    }

    fn run<S: Session + ?Sized>(
        &self,
        session: &S,
        statement: &Statement,
    ) -> Result<u64, SessionError> {
        self.cancel.check()?;

        session.execute(statement, self.cancel)
    }
}

// Cancellation wins over the phase-specific variant so callers can tell
// "gave up" from "the database refused".
fn phase_error(
    table: &TableName,
    phase: StagingPhase,
    source: SessionError,
    build: impl FnOnce(TableName, SessionError) -> StagingError,
) -> StagingError {
    if source.is_cancellation() {
        StagingError::Cancelled {
            table: table.clone(),
            phase,
            source,
        }
    } else {
        build(table.clone(), source)
    }
}

fn insert_statement(dialect: Dialect, table: &TableName, rows: &[Value]) -> Statement {
    let mut w = SqlWriter::new(dialect);

    w.push_str("INSERT INTO ");
    w.push_ident(table.as_str());
    w.push_str(" (");
    w.push_ident(STAGING_COLUMN);
    w.push_str(") VALUES ");
    for (i, value) in rows.iter().enumerate() {
        if i > 0 {
            w.push_str(", ");
        }
        w.push_str("(");
        w.push_param(value);
        w.push_str(")");
    }

    let fragment = w.finish();
    Statement::new(StatementKind::Insert, fragment.sql).with_params(fragment.params)
}

// Drop whatever was created. Runs with a fresh token so a fired
// cancellation does not also cancel the cleanup.
fn compensate<S: Session + ?Sized>(
    session: &S,
    dialect: Dialect,
    error: StagingError,
) -> OptimizeError {
    let table = error.table().clone();

    warn!(
        table = %table,
        phase = %error.phase(),
        error = %error,
        "staging failed; dropping staging table"
    );

    let drop = Statement::new(StatementKind::DropTable, dialect.drop_table(&table, true));
    match session.execute(&drop, &CancelToken::new()) {
        Ok(_) => {
            record(MetricsEvent::StagingDropped { compensating: true });

            OptimizeError::Staging { error }
        }
        Err(source) => {
            record(MetricsEvent::CleanupFailed);
            warn!(
                table = %table,
                error = %source,
                "compensating drop failed; staging table may still exist"
            );

            OptimizeError::Compound {
                error,
                cleanup: CleanupError { table, source },
            }
        }
    }
}
