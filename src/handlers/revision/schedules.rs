use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::data::models::{
    ApiResponse, CheckpointKind, CompleteRevisionRequest, Difficulty, DueParams,
    InitializeScheduleRequest, NowParams, OwnerOverdue, PauseRequest, QueueStateRequest,
    RescheduleRequest, RevisionError, RevisionSchedule, ScheduleListParams, ScheduleStatus,
};
use crate::features::revision::resolver::ScheduleSummary;
use crate::features::revision::{NextDue, RankedRevision, RevisionAttempt, RevisionService};
use crate::utils;

pub async fn initialize_schedule(
    State(service): State<RevisionService>,
    Json(payload): Json<InitializeScheduleRequest>,
) -> Result<(StatusCode, Json<RevisionSchedule>), RevisionError> {
    payload.validate()?;
    let difficulty: Difficulty = payload.difficulty.parse()?;

    let schedule =
        service.initialize_schedule(payload.owner_id, payload.item_id, difficulty, utils::now())?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn get_schedule(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    Ok(Json(service.get_schedule(schedule_id)?))
}

pub async fn complete_revision(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
    Json(payload): Json<CompleteRevisionRequest>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    payload.validate()?;
    let checkpoint: CheckpointKind = payload.checkpoint.parse()?;

    let attempt = RevisionAttempt {
        checkpoint,
        effectiveness: payload.effectiveness,
        time_taken: payload.time_taken,
        confidence_before: payload.confidence_before,
        confidence_after: payload.confidence_after,
        remembered: payload.remembered,
        notes: payload.notes,
    };

    let schedule = service
        .complete_revision(schedule_id, attempt, utils::now())
        .inspect_err(|e| log::warn!("Completion on schedule {} rejected: {}", schedule_id, e))?;
    Ok(Json(schedule))
}

pub async fn get_next_due(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
    Query(params): Query<NowParams>,
) -> Result<Json<Option<NextDue>>, RevisionError> {
    let now = params.now.unwrap_or_else(utils::now);
    Ok(Json(service.get_next_due(schedule_id, now)?))
}

pub async fn list_due_for_owner(
    State(service): State<RevisionService>,
    Path(owner_id): Path<i32>,
    Query(params): Query<DueParams>,
) -> Result<Json<Vec<RankedRevision>>, RevisionError> {
    params.validate()?;
    let now = params.now.unwrap_or_else(utils::now);
    Ok(Json(service.list_due_for_owner(owner_id, now, params.horizon_days)?))
}

pub async fn list_schedules(
    State(service): State<RevisionService>,
    Path(owner_id): Path<i32>,
    Query(params): Query<ScheduleListParams>,
) -> Result<Json<Vec<ScheduleSummary>>, RevisionError> {
    let status = params
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<ScheduleStatus>()
                .map_err(|_| RevisionError::ValidationError(format!("unknown status '{}'", raw)))
        })
        .transpose()?;
    let now = params.now.unwrap_or_else(utils::now);
    Ok(Json(service.list_schedules(owner_id, status, now)?))
}

pub async fn set_queue_state(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
    Json(payload): Json<QueueStateRequest>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    payload.validate()?;
    Ok(Json(service.set_queue_state(
        schedule_id,
        payload.priority,
        payload.position,
        utils::now(),
    )?))
}

pub async fn clear_queue_state(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    Ok(Json(service.clear_queue_state(schedule_id, utils::now())?))
}

pub async fn pause_schedule(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
    Json(payload): Json<PauseRequest>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    Ok(Json(service.pause_schedule(schedule_id, payload.until, utils::now())?))
}

pub async fn resume_schedule(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    Ok(Json(service.resume_schedule(schedule_id, utils::now())?))
}

pub async fn reschedule(
    State(service): State<RevisionService>,
    Path(schedule_id): Path<i32>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<RevisionSchedule>, RevisionError> {
    Ok(Json(service.reschedule(schedule_id, payload.to, utils::now())?))
}

pub async fn deactivate_item(
    State(service): State<RevisionService>,
    Path((owner_id, item_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse>, RevisionError> {
    service.deactivate_item(owner_id, item_id, utils::now())?;
    log::info!("Deactivated schedule for owner {} item {}", owner_id, item_id);

    Ok(Json(ApiResponse {
        success: true,
        message: "Schedule deactivated".to_string(),
    }))
}

pub async fn overdue_summary(
    State(service): State<RevisionService>,
    Query(params): Query<NowParams>,
) -> Result<Json<Vec<OwnerOverdue>>, RevisionError> {
    let now = params.now.unwrap_or_else(utils::now);
    Ok(Json(service.overdue_summary(now)?))
}
