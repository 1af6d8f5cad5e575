//! Optimizer configuration.
//!
//! `Config` is immutable once handed to an `Optimizer`. Validation is split:
//! `Config::validate` checks everything eagerly, while strategy selection
//! only checks the parameters of the strategy it actually picks.

use crate::{MAX_IDENTIFIER_LEN, db::staging::NAME_SUFFIX_LEN, error::ConfigError};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// CONSTANTS
///

pub const DEFAULT_THRESHOLD: usize = 1000;
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_TABLE_NAME_PREFIX: &str = "tmp_in_";

/// Suffix appended to the staging table name for its index.
pub(crate) const INDEX_NAME_SUFFIX: &str = "_idx";

///
/// Strategy
///
/// How a membership test above the threshold is executed.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One literal `IN (...)` list.
    Simple,

    /// Bounded `IN` groups joined with `OR` (or `NOT IN` groups joined with `AND`).
    Chunk,

    /// Values staged in a temporary table and probed through a subquery.
    #[default]
    TempTable,
}

///
/// Config
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub strategy: Strategy,
    pub threshold: usize,
    pub chunk_size: usize,
    pub insert_batch_size: usize,
    pub table_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            threshold: DEFAULT_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
            table_name_prefix: DEFAULT_TABLE_NAME_PREFIX.to_string(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub const fn with_insert_batch_size(mut self, insert_batch_size: usize) -> Self {
        self.insert_batch_size = insert_batch_size;
        self
    }

    #[must_use]
    pub fn with_table_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_name_prefix = prefix.into();
        self
    }

    /// Check every parameter the configured strategy could ever need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.strategy {
            Strategy::Simple => Ok(()),
            Strategy::Chunk => self.validate_chunk(),
            Strategy::TempTable => self.validate_temp_table(),
        }
    }

    pub(crate) const fn validate_chunk(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ChunkSizeZero);
        }

        Ok(())
    }

    pub(crate) fn validate_temp_table(&self) -> Result<(), ConfigError> {
        if self.insert_batch_size == 0 {
            return Err(ConfigError::InsertBatchSizeZero);
        }

        validate_prefix(&self.table_name_prefix)
    }
}

// Longest prefix that still leaves room for the generated suffix and index name.
const fn max_prefix_len() -> usize {
    MAX_IDENTIFIER_LEN - NAME_SUFFIX_LEN - INDEX_NAME_SUFFIX.len()
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    let mut chars = prefix.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_head || !valid_tail {
        return Err(ConfigError::InvalidPrefix {
            prefix: prefix.to_string(),
        });
    }

    let max = max_prefix_len();
    if prefix.len() > max {
        return Err(ConfigError::PrefixTooLong {
            prefix: prefix.to_string(),
            len: prefix.len(),
            max,
        });
    }

    Ok(())
}

///
/// TESTS
///
