use chrono::NaiveDateTime;
use serde::Serialize;

use crate::data::models::{Checkpoint, CheckpointKind, RevisionSchedule, ScheduleStatus};
use crate::utils::days_between_ceil;

/// The single next actionable checkpoint of a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDue {
    pub checkpoint: CheckpointKind,
    pub scheduled_at: NaiveDateTime,
    pub is_overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_overdue: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until: Option<i64>,
}

impl NextDue {
    fn overdue(checkpoint: CheckpointKind, scheduled_at: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            checkpoint,
            scheduled_at,
            is_overdue: true,
            days_overdue: Some(days_between_ceil(scheduled_at, now)),
            days_until: None,
        }
    }

    fn upcoming(checkpoint: CheckpointKind, scheduled_at: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            checkpoint,
            scheduled_at,
            is_overdue: false,
            days_overdue: None,
            days_until: Some(days_between_ceil(now, scheduled_at)),
        }
    }
}

/// Resolves what the learner should revise next, as of `now`.
///
/// Overdue entries win, taken in list order (fixed checkpoints before the
/// adaptive one). Otherwise the earliest upcoming fixed checkpoint, and only
/// then the adaptive track. `None` means nothing is left to schedule.
pub fn next_due(schedule: &RevisionSchedule, now: NaiveDateTime) -> Option<NextDue> {
    let pending: Vec<(&Checkpoint, NaiveDateTime)> = schedule
        .checkpoints
        .iter()
        .filter(|c| c.is_pending())
        .filter_map(|c| c.scheduled_at.map(|at| (c, at)))
        .collect();

    if let Some((checkpoint, at)) = pending.iter().find(|(_, at)| *at <= now) {
        return Some(NextDue::overdue(checkpoint.kind, *at, now));
    }

    pending
        .iter()
        .min_by_key(|(checkpoint, at)| (!checkpoint.kind.is_fixed(), *at))
        .map(|(checkpoint, at)| NextDue::upcoming(checkpoint.kind, *at, now))
}

pub fn is_all_revisions_completed(schedule: &RevisionSchedule) -> bool {
    schedule.is_all_revisions_completed()
}

/// Read model for listings consumed by reminder and analytics code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub schedule_id: Option<i32>,
    pub item_id: i32,
    pub status: ScheduleStatus,
    pub all_revisions_completed: bool,
    pub total_revisions: u32,
    pub average_effectiveness: f64,
    pub next_due: Option<NextDue>,
}

pub fn summarize(schedule: &RevisionSchedule, now: NaiveDateTime) -> ScheduleSummary {
    ScheduleSummary {
        schedule_id: schedule.id,
        item_id: schedule.item_id,
        status: schedule.effective_status(now),
        all_revisions_completed: is_all_revisions_completed(schedule),
        total_revisions: schedule.metrics.total_revisions,
        average_effectiveness: schedule.metrics.average_effectiveness,
        next_due: next_due(schedule, now),
    }
}
