//! Boolean expression seam shared with the surrounding query builder.
//!
//! The optimizer only ever produces `Expr` nodes; full statements are
//! assembled by the caller, which composes them through `Condition`.

use crate::{
    db::{column::Column, dialect::Dialect, staging::TableName},
    value::Value,
};
use std::fmt;

/// Column name of every staging table.
pub const STAGING_COLUMN: &str = "value";

///
/// SqlFragment
///
/// Rendered condition text and its positional parameters.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

///
/// SqlWriter
///
/// Dialect-aware accumulator. In inline mode values are written as
/// literals instead of placeholders (diagnostics only).
///

#[derive(Debug)]
pub struct SqlWriter {
    dialect: Dialect,
    inline: bool,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            inline: false,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Continue numbering after parameters the caller has already bound.
    #[must_use]
    pub fn with_bound_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    const fn inline(dialect: Dialect) -> Self {
        Self {
            dialect,
            inline: true,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub fn push_ident(&mut self, ident: &str) {
        self.dialect.push_ident(&mut self.sql, ident);
    }

    /// Table-qualified column; an empty table name renders the bare column.
    pub fn push_column(&mut self, column: &Column) {
        if !column.table().is_empty() {
            self.push_ident(column.table());
            self.sql.push('.');
        }
        self.push_ident(column.name());
    }

    pub fn push_param(&mut self, value: &Value) {
        if self.inline {
            self.sql.push_str(&value.to_string());
        } else {
            self.params.push(value.clone());
            self.dialect.push_placeholder(&mut self.sql, self.params.len());
        }
    }

    #[must_use]
    pub fn finish(self) -> SqlFragment {
        SqlFragment {
            sql: self.sql,
            params: self.params,
        }
    }
}

///
/// Condition
///
/// Anything that can be written as a boolean SQL condition.
///

pub trait Condition {
    fn write_sql(&self, w: &mut SqlWriter);

    fn to_sql(&self, dialect: Dialect) -> SqlFragment {
        let mut w = SqlWriter::new(dialect);
        self.write_sql(&mut w);

        w.finish()
    }
}

///
/// Expr
///
/// Membership-test expression tree produced by the optimizer.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Constant truth value (`1 = 1` / `1 = 0`).
    Const(bool),

    /// Literal membership list.
    InList {
        column: Column,
        values: Vec<Value>,
        negated: bool,
    },

    /// Membership against the single column of a staging table.
    InSubquery {
        column: Column,
        table: TableName,
        negated: bool,
    },

    And(Vec<Self>),
    Or(Vec<Self>),
}

impl Expr {
    /// Whether this node is a constant.
    #[must_use]
    pub const fn as_const(&self) -> Option<bool> {
        match self {
            Self::Const(v) => Some(*v),
            _ => None,
        }
    }

    /// Staging table referenced by this expression, if any.
    #[must_use]
    pub fn staging_table(&self) -> Option<&TableName> {
        match self {
            Self::InSubquery { table, .. } => Some(table),
            Self::And(children) | Self::Or(children) => {
                children.iter().find_map(Self::staging_table)
            }
            Self::Const(_) | Self::InList { .. } => None,
        }
    }

    fn write_group(w: &mut SqlWriter, children: &[Self], joiner: &str, empty: bool) {
        match children {
            [] => Self::Const(empty).write_sql(w),
            [only] => only.write_sql(w),
            _ => {
                w.push_str("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        w.push_str(joiner);
                    }
                    w.push_str("(");
                    child.write_sql(w);
                    w.push_str(")");
                }
                w.push_str(")");
            }
        }
    }
}

impl Condition for Expr {
    fn write_sql(&self, w: &mut SqlWriter) {
        match self {
            Self::Const(true) => w.push_str("1 = 1"),
            Self::Const(false) => w.push_str("1 = 0"),
            Self::InList {
                column,
                values,
                negated,
            } => {
                w.push_column(column);
                w.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        w.push_str(", ");
                    }
                    w.push_param(value);
                }
                w.push_str(")");
            }
            Self::InSubquery {
                column,
                table,
                negated,
            } => {
                w.push_column(column);
                w.push_str(if *negated {
                    " NOT IN (SELECT "
                } else {
                    " IN (SELECT "
                });
                w.push_ident(STAGING_COLUMN);
                w.push_str(" FROM ");
                w.push_ident(table.as_str());
                w.push_str(")");
            }
            Self::And(children) => Self::write_group(w, children, " AND ", true),
            Self::Or(children) => Self::write_group(w, children, " OR ", false),
        }
    }
}

// Inline ANSI rendering for logs and assertions.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = SqlWriter::inline(Dialect::Postgres);
        self.write_sql(&mut w);

        f.write_str(&w.finish().sql)
    }
}

///
/// TESTS
///
