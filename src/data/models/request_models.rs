use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for creating a schedule once an item is solved
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializeScheduleRequest {
    #[validate(range(min = 1))]
    pub owner_id: i32,
    #[validate(range(min = 1))]
    pub item_id: i32,
    pub difficulty: String, // easy | medium | hard
}

/// Request payload for recording one revision attempt
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRevisionRequest {
    pub checkpoint: String,
    pub effectiveness: f64,
    pub time_taken: Option<u32>,
    #[validate(range(min = 1, max = 5))]
    pub confidence_before: Option<u8>,
    #[validate(range(min = 1, max = 5))]
    pub confidence_after: Option<u8>,
    pub remembered: bool,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueueStateRequest {
    #[validate(range(min = -1000, max = 1000))]
    pub priority: i32,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseRequest {
    pub until: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub to: NaiveDateTime,
}

/// Query string for endpoints that evaluate against a point in time
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowParams {
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DueParams {
    pub now: Option<NaiveDateTime>,
    #[validate(range(min = 0, max = 365))]
    pub horizon_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleListParams {
    pub now: Option<NaiveDateTime>,
    pub status: Option<String>,
}

/// Overdue record count for one owner, read by the reminder subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOverdue {
    pub owner_id: i32,
    pub overdue_count: usize,
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}
