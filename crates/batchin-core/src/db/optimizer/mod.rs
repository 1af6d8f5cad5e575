//! Module: db::optimizer
//! Responsibility: turn a column and a value list into a membership plan.
//! Does not own: statement execution (see `db::staging`).
//! Boundary: public entrypoints `optimize_in` / `optimize_not_in`.

pub mod chunk;
pub(crate) mod emit;
pub mod normalize;
mod plan;
pub mod select;

#[cfg(test)]
mod tests;

use crate::{
    config::Config,
    db::column::Column,
    error::{ConfigError, OptimizeError},
    obs::sink::{MetricsEvent, MetricsSink, record, with_metrics_sink},
    value::Value,
};
use tracing::debug;

// re-exports
pub use normalize::ValueSet;
pub use plan::{Plan, PlanSummary};
pub use select::{StrategyDecision, select};

///
/// Optimizer
///
/// Stateless facade over normalization and strategy selection.
/// Planning is pure; only `Plan::execute*` touches a session.
///

#[derive(Clone, Default)]
pub struct Optimizer {
    config: Config,
    metrics: Option<&'static dyn MetricsSink>,
}

impl Optimizer {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    /// Construct after validating every parameter of the configured strategy.
    pub fn try_new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self::new(config))
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Plan `column IN (values)`.
    pub fn optimize_in<I, V>(&self, column: &Column, values: I) -> Result<Plan, OptimizeError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.optimize(column, values, false)
    }

    /// Plan `column NOT IN (values)`.
    pub fn optimize_not_in<I, V>(&self, column: &Column, values: I) -> Result<Plan, OptimizeError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.optimize(column, values, true)
    }

    fn optimize<I, V>(
        &self,
        column: &Column,
        values: I,
        negated: bool,
    ) -> Result<Plan, OptimizeError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = ValueSet::normalize(column, values.into_iter().map(Into::into))?;
        let decision = select(&self.config, values.len())?;

        debug!(
            column = %column,
            negated,
            values = values.len(),
            decision = ?decision,
            "planned membership test"
        );
        with_metrics_sink(self.metrics, || {
            record(MetricsEvent::Planned {
                kind: decision.plan_kind(),
                values: values.len() as u64,
            });
        });

        Ok(Plan::new(
            column.clone(),
            values,
            negated,
            decision,
            self.config.clone(),
            self.metrics,
        ))
    }
}

impl std::fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
