//! Database-facing modules: collaborator seams (columns, dialects,
//! expressions, sessions), the optimizer, and the staging lifecycle.

pub mod column;
pub mod dialect;
pub mod expr;
pub mod optimizer;
pub mod session;
pub mod staging;

// re-exports
pub use column::{Column, ColumnType};
pub use dialect::Dialect;
pub use expr::{Condition, Expr, SqlFragment, SqlWriter};
pub use optimizer::{Optimizer, Plan, PlanSummary, StrategyDecision, ValueSet};
pub use session::{CancelToken, Session, SessionError, SessionErrorKind, Statement, StatementKind};
pub use staging::{AutoCleanup, StagingCleanup, StagingState, TableName};
