use crate::{
    config::{Config, Strategy},
    error::ConfigError,
    obs::sink::PlanKind,
};

///
/// StrategyDecision
///
/// Outcome of strategy selection for one value-set size.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StrategyDecision {
    /// No values: the test folds to a constant and no strategy runs.
    Empty,

    Simple,

    Chunk {
        chunk_size: usize,
    },

    TempTable {
        insert_batch_size: usize,
    },
}

impl StrategyDecision {
    /// Strategy that will execute, or `None` for the constant case.
    #[must_use]
    pub const fn strategy(self) -> Option<Strategy> {
        match self {
            Self::Empty => None,
            Self::Simple => Some(Strategy::Simple),
            Self::Chunk { .. } => Some(Strategy::Chunk),
            Self::TempTable { .. } => Some(Strategy::TempTable),
        }
    }

    pub(crate) const fn plan_kind(self) -> PlanKind {
        match self {
            Self::Empty => PlanKind::Constant,
            Self::Simple => PlanKind::Simple,
            Self::Chunk { .. } => PlanKind::Chunk,
            Self::TempTable { .. } => PlanKind::TempTable,
        }
    }
}

/// Pick the execution strategy for `value_count` normalized values.
///
/// Sizes at or below the threshold always run as Simple, whatever strategy
/// is configured. Only the parameters of the chosen strategy are validated.
pub fn select(config: &Config, value_count: usize) -> Result<StrategyDecision, ConfigError> {
    if value_count == 0 {
        return Ok(StrategyDecision::Empty);
    }
    if value_count <= config.threshold {
        return Ok(StrategyDecision::Simple);
    }

    match config.strategy {
        Strategy::Simple => Ok(StrategyDecision::Simple),
        Strategy::Chunk => {
            config.validate_chunk()?;

            Ok(StrategyDecision::Chunk {
                chunk_size: config.chunk_size,
            })
        }
        Strategy::TempTable => {
            config.validate_temp_table()?;

            Ok(StrategyDecision::TempTable {
                insert_batch_size: config.insert_batch_size,
            })
        }
    }
}
