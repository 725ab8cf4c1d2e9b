use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::revision_errors::RevisionError;
use super::schedule_models::RevisionSchedule;
use crate::schema::revision_schedules;

/// A stored schedule. Nested state lives in JSON text columns; the scalar
/// columns exist for lookups and the version check.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = revision_schedules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScheduleRow {
    pub schedule_id: i32,
    pub owner_id: i32,
    pub item_id: i32,
    pub status: String,
    pub is_active: bool,
    pub next_due_at: NaiveDateTime,
    pub checkpoints: String,
    pub adaptive: String,
    pub history: String,
    pub metrics: String,
    pub queue: String,
    pub manually_rescheduled: bool,
    pub rescheduled_to: Option<NaiveDateTime>,
    pub pause_until: Option<NaiveDateTime>,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = revision_schedules)]
pub struct NewScheduleRow {
    pub owner_id: i32,
    pub item_id: i32,
    pub status: String,
    pub is_active: bool,
    pub next_due_at: NaiveDateTime,
    pub checkpoints: String,
    pub adaptive: String,
    pub history: String,
    pub metrics: String,
    pub queue: String,
    pub manually_rescheduled: bool,
    pub rescheduled_to: Option<NaiveDateTime>,
    pub pause_until: Option<NaiveDateTime>,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Everything a compare-and-swap write replaces. `None` clears the column.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = revision_schedules)]
#[diesel(treat_none_as_null = true)]
pub struct ScheduleChangeset {
    pub status: String,
    pub is_active: bool,
    pub next_due_at: NaiveDateTime,
    pub checkpoints: String,
    pub adaptive: String,
    pub history: String,
    pub metrics: String,
    pub queue: String,
    pub manually_rescheduled: bool,
    pub rescheduled_to: Option<NaiveDateTime>,
    pub pause_until: Option<NaiveDateTime>,
    pub version: i32,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<ScheduleRow> for RevisionSchedule {
    type Error = RevisionError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        Ok(RevisionSchedule {
            id: Some(row.schedule_id),
            owner_id: row.owner_id,
            item_id: row.item_id,
            checkpoints: serde_json::from_str(&row.checkpoints)?,
            adaptive: serde_json::from_str(&row.adaptive)?,
            history: serde_json::from_str(&row.history)?,
            metrics: serde_json::from_str(&row.metrics)?,
            queue: serde_json::from_str(&row.queue)?,
            status: row.status.parse()?,
            is_active: row.is_active,
            manually_rescheduled: row.manually_rescheduled,
            rescheduled_to: row.rescheduled_to,
            pause_until: row.pause_until,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl RevisionSchedule {
    fn next_due_column(&self) -> NaiveDateTime {
        self.next_pending_at()
            .unwrap_or(self.adaptive.next_review_due)
    }

    pub fn to_new_row(&self) -> Result<NewScheduleRow, RevisionError> {
        Ok(NewScheduleRow {
            owner_id: self.owner_id,
            item_id: self.item_id,
            status: self.status.as_str().to_string(),
            is_active: self.is_active,
            next_due_at: self.next_due_column(),
            checkpoints: serde_json::to_string(&self.checkpoints)?,
            adaptive: serde_json::to_string(&self.adaptive)?,
            history: serde_json::to_string(&self.history)?,
            metrics: serde_json::to_string(&self.metrics)?,
            queue: serde_json::to_string(&self.queue)?,
            manually_rescheduled: self.manually_rescheduled,
            rescheduled_to: self.rescheduled_to,
            pause_until: self.pause_until,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Changeset carrying the next version number
    pub fn to_changeset(&self) -> Result<ScheduleChangeset, RevisionError> {
        Ok(ScheduleChangeset {
            status: self.status.as_str().to_string(),
            is_active: self.is_active,
            next_due_at: self.next_due_column(),
            checkpoints: serde_json::to_string(&self.checkpoints)?,
            adaptive: serde_json::to_string(&self.adaptive)?,
            history: serde_json::to_string(&self.history)?,
            metrics: serde_json::to_string(&self.metrics)?,
            queue: serde_json::to_string(&self.queue)?,
            manually_rescheduled: self.manually_rescheduled,
            rescheduled_to: self.rescheduled_to,
            pause_until: self.pause_until,
            version: self.version + 1,
            updated_at: self.updated_at,
        })
    }
}
