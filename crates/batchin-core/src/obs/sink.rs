//! Metrics sink boundary.
//!
//! Optimizer and staging logic MUST NOT touch obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between execution logic
//! and the global metrics state.
use crate::obs::metrics;
use std::cell::Cell;

thread_local! {
    static SINK_OVERRIDE: Cell<Option<&'static dyn MetricsSink>> = const { Cell::new(None) };
}

///
/// PlanKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanKind {
    Constant,
    Simple,
    Chunk,
    TempTable,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Planned { kind: PlanKind, values: u64 },
    StagingCreated,
    BatchInserted { rows: u64 },
    StagingIndexed,
    StagingDropped { compensating: bool },
    CleanupFailed,
}

///
/// MetricsSink
///
/// Shared by reference across threads, so implementations must be `Sync`.
///

pub trait MetricsSink: Sync {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into the global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::Planned { kind, values } => {
                match kind {
                    PlanKind::Constant => {
                        m.ops.plan_constant = m.ops.plan_constant.saturating_add(1);
                    }
                    PlanKind::Simple => {
                        m.ops.plan_simple = m.ops.plan_simple.saturating_add(1);
                    }
                    PlanKind::Chunk => {
                        m.ops.plan_chunk = m.ops.plan_chunk.saturating_add(1);
                    }
                    PlanKind::TempTable => {
                        m.ops.plan_temp_table = m.ops.plan_temp_table.saturating_add(1);
                    }
                }
                m.ops.values_planned = m.ops.values_planned.saturating_add(values);
            }

            MetricsEvent::StagingCreated => {
                m.ops.tables_created = m.ops.tables_created.saturating_add(1);
            }

            MetricsEvent::BatchInserted { rows } => {
                m.ops.insert_batches = m.ops.insert_batches.saturating_add(1);
                m.ops.rows_staged = m.ops.rows_staged.saturating_add(rows);
            }

            MetricsEvent::StagingIndexed => {
                m.ops.tables_indexed = m.ops.tables_indexed.saturating_add(1);
            }

            MetricsEvent::StagingDropped { compensating } => {
                m.ops.tables_dropped = m.ops.tables_dropped.saturating_add(1);
                if compensating {
                    m.ops.compensating_drops = m.ops.compensating_drops.saturating_add(1);
                }
            }

            MetricsEvent::CleanupFailed => {
                m.ops.cleanup_failures = m.ops.cleanup_failures.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    match SINK_OVERRIDE.with(Cell::get) {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics counters on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
/// `None` leaves the current routing untouched.
pub(crate) fn with_metrics_sink<T>(
    sink: Option<&'static dyn MetricsSink>,
    f: impl FnOnce() -> T,
) -> T {
    struct Guard(Option<&'static dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| cell.set(self.0));
        }
    }

    let Some(sink) = sink else {
        return f();
    };

    let prev = SINK_OVERRIDE.with(|cell| cell.replace(Some(sink)));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
