#![allow(dead_code)]

use batchin::{
    prelude::*,
    session::{CancelToken, Session, SessionError, Statement, StatementKind},
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
};

///
/// MemorySession
///
/// Postgres-flavoured fake that keeps staged rows in memory so staged
/// expressions can be evaluated. Every attempted statement is logged.
///

#[derive(Default)]
pub struct MemorySession {
    tables: RefCell<BTreeMap<String, Vec<Value>>>,
    log: RefCell<Vec<Statement>>,
    fail: HashSet<(StatementKind, usize)>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` (1-based) statement of `kind` fail.
    pub fn fail_on(mut self, kind: StatementKind, nth: usize) -> Self {
        self.fail.insert((kind, nth));
        self
    }

    pub fn count(&self, kind: StatementKind) -> usize {
        self.log.borrow().iter().filter(|s| s.kind == kind).count()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.borrow().clone()
    }

    /// Tables that currently exist.
    pub fn live_tables(&self) -> Vec<String> {
        self.tables.borrow().keys().cloned().collect()
    }

    pub fn rows(&self, table: &str) -> Option<Vec<Value>> {
        self.tables.borrow().get(table).cloned()
    }

    /// Evaluate a membership expression for one candidate row value.
    pub fn eval(&self, expr: &Expr, candidate: &Value) -> bool {
        match expr {
            Expr::Const(v) => *v,
            Expr::InList {
                values, negated, ..
            } => values.contains(candidate) != *negated,
            Expr::InSubquery { table, negated, .. } => {
                let tables = self.tables.borrow();
                let rows = tables
                    .get(table.as_str())
                    .unwrap_or_else(|| panic!("staging table {table} is not live"));

                rows.contains(candidate) != *negated
            }
            Expr::And(children) => children.iter().all(|c| self.eval(c, candidate)),
            Expr::Or(children) => children.iter().any(|c| self.eval(c, candidate)),
        }
    }
}

fn first_ident(sql: &str) -> String {
    let start = sql.find('"').expect("quoted identifier") + 1;
    let len = sql[start..].find('"').expect("closing quote");

    sql[start..start + len].to_string()
}

impl Session for MemorySession {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&self, statement: &Statement, _cancel: &CancelToken) -> Result<u64, SessionError> {
        self.log.borrow_mut().push(statement.clone());
        let seen = self.count(statement.kind);
        if self.fail.contains(&(statement.kind, seen)) {
            return Err(SessionError::new(format!(
                "injected {} failure #{seen}",
                statement.kind
            )));
        }

        let mut tables = self.tables.borrow_mut();
        let table = first_ident(&statement.sql);

        match statement.kind {
            StatementKind::CreateTable => {
                if tables.insert(table.clone(), Vec::new()).is_some() {
                    return Err(SessionError::new(format!("relation {table} already exists")));
                }
                Ok(0)
            }
            StatementKind::Insert => {
                let rows = tables
                    .get_mut(&table)
                    .ok_or_else(|| SessionError::new(format!("relation {table} does not exist")))?;
                rows.extend(statement.params.iter().cloned());

                Ok(statement.params.len() as u64)
            }
            StatementKind::CreateIndex => Ok(0),
            StatementKind::DropTable => {
                let existed = tables.remove(&table).is_some();
                if !existed && !statement.sql.contains("IF EXISTS") {
                    return Err(SessionError::new(format!("table {table} does not exist")));
                }
                Ok(0)
            }
        }
    }
}

pub fn id() -> Column {
    Column::new("orders", "id", ColumnType::BigInt)
}
