use crate::{
    db::{column::ColumnType, session::SessionError, staging::TableName},
    value::ValueKind,
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// ErrorClass
///
/// Coarse classification used by callers that only need to know whether a
/// failure touched the database and whether server-side state may remain.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    Config,
    Usage,
    Staging,
    Cleanup,
}

///
/// OptimizeError
///
/// Top-level error for every optimizer entrypoint.
/// Staging failures always carry the outcome of the compensating drop.
///

#[derive(Debug, ThisError)]
pub enum OptimizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ValueSet(#[from] ValueSetError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A staging phase failed and the compensating drop succeeded.
    #[error("{error}; staging table was dropped")]
    Staging {
        #[source]
        error: StagingError,
    },

    /// A staging phase failed and the compensating drop failed too.
    #[error("{error}; {cleanup}")]
    Compound {
        #[source]
        error: StagingError,
        cleanup: CleanupError,
    },

    /// An explicit cleanup call failed.
    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

impl OptimizeError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) | Self::ValueSet(_) => ErrorClass::Config,
            Self::Usage(_) => ErrorClass::Usage,
            Self::Staging { .. } => ErrorClass::Staging,
            Self::Compound { .. } | Self::Cleanup(_) => ErrorClass::Cleanup,
        }
    }

    /// Name of a staging table that may still exist on the server.
    ///
    /// `Some` means the table must be purged out of band.
    #[must_use]
    pub const fn orphaned_table(&self) -> Option<&TableName> {
        match self {
            Self::Compound { cleanup, .. } | Self::Cleanup(cleanup) => Some(&cleanup.table),
            _ => None,
        }
    }

    /// Staging phase that failed, if this error came from staging.
    #[must_use]
    pub const fn staging_phase(&self) -> Option<StagingPhase> {
        match self {
            Self::Staging { error } | Self::Compound { error, .. } => Some(error.phase()),
            _ => None,
        }
    }
}

///
/// ConfigError
///
/// Invalid optimizer configuration. Always raised before any database access.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero when the chunk strategy is selected")]
    ChunkSizeZero,

    #[error(
        "insert_batch_size must be greater than zero when the temp table strategy is selected"
    )]
    InsertBatchSizeZero,

    #[error(
        "table name prefix '{prefix}' must start with a letter or '_' and contain only ASCII alphanumerics or '_'"
    )]
    InvalidPrefix { prefix: String },

    #[error("optimizer config could not be parsed: {message}")]
    Parse { message: String },

    #[error("table name prefix '{prefix}' is {len} bytes; at most {max} bytes are allowed")]
    PrefixTooLong {
        prefix: String,
        len: usize,
        max: usize,
    },
}

///
/// ValueSetError
///
/// Input values that cannot take part in a membership test.
/// `index` refers to the position in the caller's original slice.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ValueSetError {
    #[error(
        "value at index {index} ({value}) cannot be stored exactly in column '{column}' of type {ty}"
    )]
    Incompatible {
        index: usize,
        column: String,
        ty: ColumnType,
        value: String,
    },

    #[error("value at index {index} is {found}, but column '{column}' holds {expected} values")]
    KindMismatch {
        index: usize,
        column: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("value at index {index} is NaN, which never matches a membership test")]
    NotANumber { index: usize },

    #[error("value at index {index} is NULL; membership lists must not contain NULL")]
    Null { index: usize },
}

///
/// UsageError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum UsageError {
    #[error(
        "plan for '{column}' uses a staging table; call execute() to materialize it before building an expression"
    )]
    NotMaterialized { column: String },
}

///
/// StagingPhase
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum StagingPhase {
    #[display("create")]
    Create,

    #[display("insert")]
    Insert,

    #[display("index")]
    Index,
}

///
/// StagingError
///
/// A failed step while materializing a staging table.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum StagingError {
    #[error("staging of '{table}' was cancelled during {phase}: {source}")]
    Cancelled {
        table: TableName,
        phase: StagingPhase,
        source: SessionError,
    },

    #[error("failed to create staging table '{table}': {source}")]
    Create {
        table: TableName,
        source: SessionError,
    },

    #[error("failed to index staging table '{table}': {source}")]
    Index {
        table: TableName,
        source: SessionError,
    },

    #[error("insert batch {batch} of {batches} into staging table '{table}' failed: {source}")]
    Insert {
        table: TableName,
        batch: usize,
        batches: usize,
        source: SessionError,
    },
}

impl StagingError {
    #[must_use]
    pub const fn phase(&self) -> StagingPhase {
        match self {
            Self::Cancelled { phase, .. } => *phase,
            Self::Create { .. } => StagingPhase::Create,
            Self::Index { .. } => StagingPhase::Index,
            Self::Insert { .. } => StagingPhase::Insert,
        }
    }

    #[must_use]
    pub const fn table(&self) -> &TableName {
        match self {
            Self::Cancelled { table, .. }
            | Self::Create { table, .. }
            | Self::Index { table, .. }
            | Self::Insert { table, .. } => table,
        }
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

///
/// CleanupError
///
/// Dropping a staging table failed. The table may still exist.
///

#[derive(Debug, ThisError)]
#[error(
    "failed to drop staging table '{table}': {source}; the table may still exist and must be purged out of band"
)]
pub struct CleanupError {
    pub table: TableName,
    pub source: SessionError,
}
