//! Difficulty-oracle capability consumed by the SPV validator

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Natural;

/// External relay tracking the two retarget epochs a proof may cite.
///
/// One blocking read per getter, no retry logic here; staleness is the
/// caller's concern. An unavailable relay must surface
/// `OracleUnavailable` - a validator never substitutes a default.
pub trait DifficultyOracle {
    fn current_epoch_difficulty(&self) -> Result<Natural>;
    fn previous_epoch_difficulty(&self) -> Result<Natural>;
}

/// Caller-supplied epoch pair, the plain in-memory oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochDifficulty {
    pub current: Natural,
    pub previous: Natural,
}

impl DifficultyOracle for EpochDifficulty {
    fn current_epoch_difficulty(&self) -> Result<Natural> {
        Ok(self.current)
    }

    fn previous_epoch_difficulty(&self) -> Result<Natural> {
        Ok(self.previous)
    }
}
