use snip_store::StoreError;
use snip_types::ErrorKind;

/// Why a payload was refused before assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("payload is empty")]
    Empty,

    #[error("payload is {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("payload does not start with an allowed scheme")]
    UnsupportedScheme,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Errors from identifier assignment.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    /// Every attempt collided with an existing key.
    #[error("no free key found after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// The store failed with something other than a duplicate key.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The assignment configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AssignError {
    /// Category of this error. `Exhausted` stays distinct from backend faults.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Exhausted { .. } => ErrorKind::AssignmentExhausted,
            Self::Store(e) => e.kind(),
            Self::Config(_) => ErrorKind::Backend,
        }
    }
}

/// Result alias for assignment operations.
pub type AssignResult<T> = Result<T, AssignError>;
