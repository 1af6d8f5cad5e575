//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Logging goes through `tracing`; counters go through `sink`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState};
pub use sink::{MetricsEvent, MetricsSink, PlanKind, metrics_report, metrics_reset_all};
