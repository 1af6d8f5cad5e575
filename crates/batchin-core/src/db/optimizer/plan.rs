use crate::{
    config::{Config, Strategy},
    db::{
        column::Column,
        expr::Expr,
        optimizer::{chunk, emit, normalize::ValueSet, select::StrategyDecision},
        session::{CancelToken, Session},
        staging::{AutoCleanup, StagingCleanup, TempTableManager},
    },
    error::{OptimizeError, UsageError},
    obs::sink::{MetricsSink, with_metrics_sink},
    value::Value,
};
use std::fmt;

///
/// Plan
///
/// The decision for one membership test. A plan is a pure value until one
/// of the `execute*` methods runs; those consume it, so a plan can stage at
/// most one table.
///

#[derive(Clone)]
pub struct Plan {
    column: Column,
    values: ValueSet,
    negated: bool,
    decision: StrategyDecision,
    config: Config,
    cancel: CancelToken,
    metrics: Option<&'static dyn MetricsSink>,
}

impl Plan {
    pub(crate) fn new(
        column: Column,
        values: ValueSet,
        negated: bool,
        decision: StrategyDecision,
        config: Config,
        metrics: Option<&'static dyn MetricsSink>,
    ) -> Self {
        Self {
            column,
            values,
            negated,
            decision,
            config,
            cancel: CancelToken::new(),
            metrics,
        }
    }

    #[must_use]
    pub const fn column(&self) -> &Column {
        &self.column
    }

    /// Normalized values in first-occurrence order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        self.values.as_slice()
    }

    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    #[must_use]
    pub const fn decision(&self) -> StrategyDecision {
        self.decision
    }

    #[must_use]
    pub const fn strategy(&self) -> Option<Strategy> {
        self.decision.strategy()
    }

    /// Observe `token` during execution; staging stops before the next
    /// statement once it fires.
    #[must_use]
    pub fn cancel_on(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn explain(&self) -> PlanSummary {
        let len = self.values.len();
        let (groups, insert_batches) = match self.decision {
            StrategyDecision::Empty => (0, 0),
            StrategyDecision::Simple => (1, 0),
            StrategyDecision::Chunk { chunk_size } => (chunk::group_count(len, chunk_size), 0),
            StrategyDecision::TempTable { insert_batch_size } => {
                (0, len.div_ceil(insert_batch_size))
            }
        };

        PlanSummary {
            strategy: self.strategy(),
            negated: self.negated,
            values: len,
            groups,
            insert_batches,
        }
    }

    /// Build the expression without touching a database.
    ///
    /// Temp-table plans have nothing to reference until executed and
    /// return `UsageError::NotMaterialized`.
    pub fn to_expression(&self) -> Result<Expr, OptimizeError> {
        match self.decision {
            StrategyDecision::Empty => Ok(emit::constant(self.negated)),
            StrategyDecision::Simple => Ok(emit::in_list(
                self.column.clone(),
                self.values.as_slice().to_vec(),
                self.negated,
            )),
            StrategyDecision::Chunk { chunk_size } => Ok(chunk::plan_chunks(
                &self.column,
                self.values.as_slice(),
                chunk_size,
                self.negated,
            )),
            StrategyDecision::TempTable { .. } => Err(UsageError::NotMaterialized {
                column: self.column.to_string(),
            }
            .into()),
        }
    }

    /// Materialize the plan on `session`.
    ///
    /// Only temp-table plans perform I/O; the others return their expression
    /// with an inert cleanup handle. The expression is valid for queries on
    /// the same session until `cleanup` runs.
    pub fn execute<'s, S: Session + ?Sized>(
        self,
        session: &'s S,
    ) -> Result<(Expr, StagingCleanup<'s, S>), OptimizeError> {
        if !matches!(self.decision, StrategyDecision::TempTable { .. }) {
            return Ok((self.to_expression()?, StagingCleanup::inert()));
        }

        let manager = TempTableManager::new(&self.config, &self.cancel, self.metrics);
        with_metrics_sink(self.metrics, || {
            manager.execute(session, &self.column, self.values.as_slice(), self.negated)
        })
    }

    /// Like `execute`, but the staging table is dropped when the returned
    /// guard goes out of scope.
    pub fn execute_with_auto_cleanup<'s, S: Session + ?Sized>(
        self,
        session: &'s S,
    ) -> Result<AutoCleanup<'s, S>, OptimizeError> {
        let (expr, cleanup) = self.execute(session)?;

        Ok(AutoCleanup::new(expr, cleanup))
    }

    /// Run `f` with the materialized expression, then clean up.
    ///
    /// Returns `f`'s result, or the cleanup error if the drop fails. The
    /// table is also dropped when `f` panics.
    pub fn execute_scoped<S, T>(
        self,
        session: &S,
        f: impl FnOnce(&Expr) -> T,
    ) -> Result<T, OptimizeError>
    where
        S: Session + ?Sized,
    {
        let guard = self.execute_with_auto_cleanup(session)?;
        let out = f(guard.expr());
        guard.finish()?;

        Ok(out)
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("column", &self.column)
            .field("values", &self.values.len())
            .field("negated", &self.negated)
            .field("decision", &self.decision)
            .finish_non_exhaustive()
    }
}

///
/// PlanSummary
///
/// Diagnostic view of a plan: what runs and how many statements or groups
/// it implies.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanSummary {
    pub strategy: Option<Strategy>,
    pub negated: bool,
    pub values: usize,
    pub groups: usize,
    pub insert_batches: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.negated { "NOT IN" } else { "IN" };
        write!(f, "{op} over {} values: ", self.values)?;

        match self.strategy {
            None => write!(
                f,
                "constant {}",
                if self.negated { "TRUE" } else { "FALSE" }
            ),
            Some(Strategy::Simple) => f.write_str("simple list"),
            Some(Strategy::Chunk) => write!(f, "chunk ({} groups)", self.groups),
            Some(Strategy::TempTable) => {
                write!(f, "temp table ({} insert batches)", self.insert_batches)
            }
        }
    }
}
