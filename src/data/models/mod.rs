pub mod request_models;
pub mod revision_errors;
pub mod schedule_models;
pub mod schedule_rows;

pub use request_models::{
    ApiResponse, CompleteRevisionRequest, DueParams, InitializeScheduleRequest, NowParams,
    OwnerOverdue, PauseRequest, QueueStateRequest, RescheduleRequest, ScheduleListParams,
};
pub use revision_errors::RevisionError;
pub use schedule_models::{
    AdaptiveState, Checkpoint, CheckpointKind, Difficulty, HistoryEntry, QueueState,
    RevisionMetrics, RevisionSchedule, ScheduleStatus, DEFAULT_EASE_FACTOR, FIXED_CHECKPOINTS,
    MAX_EASE_FACTOR, MIN_EASE_FACTOR,
};
pub use schedule_rows::ScheduleRow;
