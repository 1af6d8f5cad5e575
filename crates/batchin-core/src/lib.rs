//! Core runtime for Batchin: values, columns, dialects, membership
//! expressions, the optimizer, and the staging-table lifecycle.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod obs;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum identifier length accepted for generated staging objects.
///
/// PostgreSQL truncates identifiers beyond 63 bytes; staying under that
/// keeps generated names stable on every supported dialect.
pub const MAX_IDENTIFIER_LEN: usize = 63;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sessions, or sinks are re-exported here.
///

pub mod prelude {
    pub use crate::{
        config::{Config, Strategy},
        db::{
            column::{Column, ColumnType},
            expr::{Condition, Expr},
            optimizer::{Optimizer, Plan},
        },
        value::Value,
    };
}
