//! Session seam: the single connection the caller lends to the optimizer.
//!
//! The optimizer never opens, pools, or commits connections. It only issues
//! DDL and batched DML through `Session::execute`.

use crate::{db::dialect::Dialect, value::Value};
use derive_more::Display;
use std::{
    error::Error,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use thiserror::Error as ThisError;

///
/// Session
///
/// One logical database session. Staging tables created through a session
/// are visible only to that session.
///
/// Methods take `&self` so the staging cleanup handle and the caller's outer
/// query can share the session; implementations wrapping a `&mut` client
/// use interior mutability.
///

pub trait Session {
    fn dialect(&self) -> Dialect;

    /// Execute one statement and return the affected row count.
    ///
    /// Implementations may poll `cancel` to abort long-running work; the
    /// optimizer also checks it before every statement.
    fn execute(&self, statement: &Statement, cancel: &CancelToken) -> Result<u64, SessionError>;
}

impl<S: Session + ?Sized> Session for &S {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&self, statement: &Statement, cancel: &CancelToken) -> Result<u64, SessionError> {
        (**self).execute(statement, cancel)
    }
}

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum StatementKind {
    CreateTable,
    Insert,
    CreateIndex,
    DropTable,
}

///
/// Statement
///
/// SQL text plus positional parameters, tagged with what it does so fakes
/// and instrumentation can classify it without parsing.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    #[must_use]
    pub const fn new(kind: StatementKind, sql: String) -> Self {
        Self {
            kind,
            sql,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }
}

///
/// CancelToken
///
/// Cooperative cancellation shared between the caller and the optimizer.
/// Cloning shares the flag; the deadline travels with each clone.
///

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.is_expired()
    }

    fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fail with a cancellation error if the token has fired.
    pub fn check(&self) -> Result<(), SessionError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(SessionError::cancelled());
        }
        if self.is_expired() {
            return Err(SessionError::timed_out());
        }

        Ok(())
    }
}

///
/// SessionErrorKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum SessionErrorKind {
    Statement,
    Cancelled,
    TimedOut,
}

///
/// SessionError
///
/// Failure reported by a session. Driver errors travel as `source`.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl SessionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: SessionErrorKind::Statement,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            kind: SessionErrorKind::Statement,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            kind: SessionErrorKind::Cancelled,
            message: "operation cancelled".to_string(),
            source: None,
        }
    }

    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            kind: SessionErrorKind::TimedOut,
            message: "operation timed out".to_string(),
            source: None,
        }
    }

    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(
            self.kind,
            SessionErrorKind::Cancelled | SessionErrorKind::TimedOut
        )
    }
}

///
/// TESTS
///
