//! In-memory session fake that records statements and injects failures.

use crate::db::{
    dialect::Dialect,
    session::{CancelToken, Session, SessionError, Statement, StatementKind},
};
use std::cell::RefCell;

///
/// Fault
///
/// Fail (or cancel) the `nth` (1-based) statement of `kind`.
///

#[derive(Clone, Debug)]
enum Fault {
    Fail { kind: StatementKind, nth: usize },
    Cancel {
        kind: StatementKind,
        nth: usize,
        token: CancelToken,
    },
}

///
/// RecordingSession
///

pub(crate) struct RecordingSession {
    dialect: Dialect,
    log: RefCell<Vec<Statement>>,
    faults: Vec<Fault>,
}

impl RecordingSession {
    pub(crate) const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            log: RefCell::new(Vec::new()),
            faults: Vec::new(),
        }
    }

    pub(crate) const fn postgres() -> Self {
        Self::new(Dialect::Postgres)
    }

    /// Make the `nth` statement of `kind` fail.
    pub(crate) fn fail_on(mut self, kind: StatementKind, nth: usize) -> Self {
        self.faults.push(Fault::Fail { kind, nth });
        self
    }

    /// Fire `token` once the `nth` statement of `kind` has succeeded.
    pub(crate) fn cancel_after(
        mut self,
        kind: StatementKind,
        nth: usize,
        token: CancelToken,
    ) -> Self {
        self.faults.push(Fault::Cancel { kind, nth, token });
        self
    }

    /// Every statement attempted so far, failed ones included.
    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.log.borrow().clone()
    }

    pub(crate) fn count(&self, kind: StatementKind) -> usize {
        self.log.borrow().iter().filter(|s| s.kind == kind).count()
    }

    pub(crate) fn kinds(&self) -> Vec<StatementKind> {
        self.log.borrow().iter().map(|s| s.kind).collect()
    }
}

impl Session for RecordingSession {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute(&self, statement: &Statement, _cancel: &CancelToken) -> Result<u64, SessionError> {
        self.log.borrow_mut().push(statement.clone());
        let seen = self.count(statement.kind);

        for fault in &self.faults {
            match fault {
                Fault::Fail { kind, nth } if *kind == statement.kind && *nth == seen => {
                    return Err(SessionError::new(format!("injected {kind} failure #{nth}")));
                }
                Fault::Cancel { kind, nth, token } if *kind == statement.kind && *nth == seen => {
                    token.cancel();
                }
                _ => {}
            }
        }

        Ok(statement.params.len() as u64)
    }
}
