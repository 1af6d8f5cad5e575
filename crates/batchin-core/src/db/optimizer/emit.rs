//! Expression emitter: structural constructors for every fragment the
//! optimizer hands back to the query builder. No decisions live here.

use crate::{
    db::{column::Column, expr::Expr, staging::TableName},
    value::Value,
};

/// Result of testing against an empty set: IN is false, NOT IN is true.
pub(crate) const fn constant(negated: bool) -> Expr {
    Expr::Const(negated)
}

pub(crate) const fn in_list(column: Column, values: Vec<Value>, negated: bool) -> Expr {
    Expr::InList {
        column,
        values,
        negated,
    }
}

/// Join group tests: OR for IN, AND for NOT IN (De Morgan).
/// A single group is returned as-is.
pub(crate) fn combine(mut groups: Vec<Expr>, negated: bool) -> Expr {
    if groups.len() == 1 {
        return groups.remove(0);
    }

    if negated {
        Expr::And(groups)
    } else {
        Expr::Or(groups)
    }
}

pub(crate) const fn staged(column: Column, table: TableName, negated: bool) -> Expr {
    Expr::InSubquery {
        column,
        table,
        negated,
    }
}
