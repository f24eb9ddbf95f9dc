use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

pub use crate::gateway::GatewayError;
pub use crate::store::PersistenceError;

/// Top-level error type for all store and service operations.
///
/// Validation errors carry per-field detail and are meant to be recovered at
/// the form boundary. `NotFound` and `DuplicateId` indicate a broken caller
/// contract and are logged as errors rather than shown to users. Gateway and
/// persistence failures always leave prior work-order state intact.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Work order {0} not found")]
    NotFound(Uuid),

    #[error("Work order {0} already exists")]
    DuplicateId(Uuid),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Discarded stale gateway response for work order {0}")]
    StaleResponse(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// True for failures a user can fix by correcting their input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_)
                | ServiceError::Gateway(_)
                | ServiceError::StaleResponse(_)
                | ServiceError::InvalidInput(_)
        )
    }
}
