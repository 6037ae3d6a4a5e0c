use serde::{Deserialize, Serialize};

use crate::error::{AssignError, AssignResult};

/// Retry budget and entropy width for identifier assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    /// Maximum number of insert calls per payload, the first one included.
    pub max_attempts: u32,
    /// Random bytes appended to the digest input on each retry.
    pub entropy_bytes: usize,
    /// On a collision, return the existing key when it already holds the
    /// same payload instead of re-deriving.
    pub reuse_identical: bool,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            entropy_bytes: 8,
            reuse_identical: true,
        }
    }
}

impl AssignConfig {
    /// Reject budgets that could never insert anything or never vary the input.
    pub fn validate(&self) -> AssignResult<()> {
        if self.max_attempts == 0 {
            return Err(AssignError::Config("max_attempts must be at least 1".into()));
        }
        if self.entropy_bytes == 0 {
            return Err(AssignError::Config("entropy_bytes must be at least 1".into()));
        }
        Ok(())
    }
}
