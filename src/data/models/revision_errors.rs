use diesel::result::Error as DieselError;
use serde_json::Error as JsonError;
use thiserror::Error;
use validator::ValidationErrors;

// Every failure the revision engine and its store can report
#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(i32),
    #[error("No schedule for owner {owner_id} and item {item_id}")]
    NoScheduleForItem { owner_id: i32, item_id: i32 },
    #[error("Schedule already exists for owner {owner_id} and item {item_id}")]
    DuplicateSchedule { owner_id: i32, item_id: i32 },
    #[error("Unknown checkpoint: {0}")]
    InvalidCheckpoint(String),
    #[error("Effectiveness must be within [0, 1], got {0}")]
    InvalidEffectiveness(f64),
    #[error("Unknown difficulty: {0}")]
    InvalidDifficulty(String),
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Schedule {0} was modified concurrently, retries exhausted")]
    ConcurrentModification(i32),
    #[error("Database error")]
    DatabaseError(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    PoolError(String),
    #[error("Serialization error")]
    SerializationError(#[from] JsonError),
}

impl From<r2d2::Error> for RevisionError {
    fn from(err: r2d2::Error) -> Self {
        RevisionError::PoolError(err.to_string())
    }
}

impl From<ValidationErrors> for RevisionError {
    fn from(err: ValidationErrors) -> Self {
        RevisionError::ValidationError(err.to_string())
    }
}
