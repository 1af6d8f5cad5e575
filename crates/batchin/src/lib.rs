//! Batchin: membership tests (`IN` / `NOT IN`) over large value lists.
//!
//! This is the public meta-crate. Downstream users depend on **batchin** only.
//!
//! ## Crate layout
//! - `core`: values, columns, dialects, expressions, the optimizer, and the
//!   staging-table lifecycle.
//! - `error`: every error an entrypoint can return.
//! - `obs`: metrics sink seam and per-thread counters.
//!
//! The `prelude` module carries the vocabulary needed to plan and render a
//! membership test; session plumbing lives under `session`.

pub use batchin_core as core;
pub use batchin_core::{error, obs};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use batchin_core::MAX_IDENTIFIER_LEN;

//
// Session
// Everything a caller implements or passes to run a staged plan.
//

pub mod session {
    pub use crate::core::db::{
        dialect::Dialect,
        session::{CancelToken, Session, SessionError, SessionErrorKind, Statement, StatementKind},
        staging::{AutoCleanup, StagingCleanup, StagingState, TableName},
    };
}

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        config::{Config, Strategy},
        db::{
            column::{Column, ColumnType},
            dialect::Dialect,
            expr::{Condition as _, Expr, SqlFragment},
            optimizer::{Optimizer, Plan, PlanSummary, StrategyDecision},
        },
        error::OptimizeError,
        value::Value,
    };
}
