use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::revision_errors::RevisionError;

/// Starting ease factor for every new schedule
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 3.0;

/// Fixed checkpoints in the order they are scanned
pub const FIXED_CHECKPOINTS: [CheckpointKind; 5] = [
    CheckpointKind::SameDay,
    CheckpointKind::Day3,
    CheckpointKind::Day7,
    CheckpointKind::Day14,
    CheckpointKind::Day30,
];

/// A named review slot. The five fixed kinds sit at a constant offset from
/// the schedule's creation; `Adaptive` floats with the ease factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckpointKind {
    SameDay,
    Day3,
    Day7,
    Day14,
    Day30,
    Adaptive,
}

impl CheckpointKind {
    pub fn offset_days(self) -> Option<i64> {
        match self {
            CheckpointKind::SameDay => Some(0),
            CheckpointKind::Day3 => Some(3),
            CheckpointKind::Day7 => Some(7),
            CheckpointKind::Day14 => Some(14),
            CheckpointKind::Day30 => Some(30),
            CheckpointKind::Adaptive => None,
        }
    }

    pub fn is_fixed(self) -> bool {
        self != CheckpointKind::Adaptive
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointKind::SameDay => "sameDay",
            CheckpointKind::Day3 => "day3",
            CheckpointKind::Day7 => "day7",
            CheckpointKind::Day14 => "day14",
            CheckpointKind::Day30 => "day30",
            CheckpointKind::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointKind {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sameDay" => Ok(CheckpointKind::SameDay),
            "day3" => Ok(CheckpointKind::Day3),
            "day7" => Ok(CheckpointKind::Day7),
            "day14" => Ok(CheckpointKind::Day14),
            "day30" => Ok(CheckpointKind::Day30),
            "adaptive" => Ok(CheckpointKind::Adaptive),
            other => Err(RevisionError::InvalidCheckpoint(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Scales the base adaptive interval: harder items come back sooner
    pub fn interval_multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 0.8,
            Difficulty::Hard => 0.6,
        }
    }
}

impl FromStr for Difficulty {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(RevisionError::InvalidDifficulty(s.to_string())),
        }
    }
}

/// Lifecycle status of a schedule.
///
/// Only `Active`, `Paused` and `Completed` are ever persisted. `Overdue` is a
/// derived view returned by [`RevisionSchedule::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Active,
    Paused,
    Completed,
    Overdue,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Paused => "paused",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Overdue => "overdue",
        }
    }
}

impl FromStr for ScheduleStatus {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ScheduleStatus::Active),
            "paused" => Ok(ScheduleStatus::Paused),
            "completed" => Ok(ScheduleStatus::Completed),
            "overdue" => Ok(ScheduleStatus::Overdue),
            other => Err(RevisionError::InconsistentState(format!(
                "unknown stored status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub kind: CheckpointKind,
    pub scheduled: bool,
    pub completed: bool,
    pub scheduled_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub effectiveness: Option<f64>,
}

impl Checkpoint {
    pub fn unscheduled(kind: CheckpointKind) -> Self {
        Self {
            kind,
            scheduled: false,
            completed: false,
            scheduled_at: None,
            completed_at: None,
            effectiveness: None,
        }
    }

    pub fn scheduled_for(kind: CheckpointKind, at: NaiveDateTime) -> Self {
        Self {
            scheduled: true,
            scheduled_at: Some(at),
            ..Self::unscheduled(kind)
        }
    }

    /// Scheduled but not yet done
    pub fn is_pending(&self) -> bool {
        self.scheduled && !self.completed
    }

    /// A fixed checkpoint that no longer blocks completion of the schedule
    pub fn is_settled(&self) -> bool {
        !self.scheduled || self.completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveState {
    /// Fractional days; `current_interval` never drops below one day
    pub base_interval: f64,
    pub current_interval: i64,
    pub next_review_due: NaiveDateTime,
    pub ease_factor: f64,
    pub interval_modifier: f64,
}

impl AdaptiveState {
    /// Whole-day interval a reset falls back to
    pub fn base_interval_days(&self) -> i64 {
        Self::whole_days(self.base_interval)
    }

    /// Rounds a fractional base interval up to at least one day
    pub fn whole_days(base_interval: f64) -> i64 {
        (base_interval.ceil() as i64).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub sequence_number: u32,
    pub checkpoint: CheckpointKind,
    pub scheduled_for: NaiveDateTime,
    pub completed_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<u32>, // minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_before: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_after: Option<u8>,
    pub remembered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub effectiveness_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetrics {
    pub total_revisions: u32,
    pub successful_revisions: u32,
    pub average_effectiveness: f64,
    pub forgetting_rate: f64,
    pub last_difficulty: Difficulty,
}

impl RevisionMetrics {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            total_revisions: 0,
            successful_revisions: 0,
            average_effectiveness: 0.0,
            forgetting_rate: 0.0,
            last_difficulty: difficulty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub in_queue: bool,
    pub priority: i32,
    pub position: Option<i32>,
}

/// Scheduling state for one (owner, item) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSchedule {
    pub id: Option<i32>,
    pub owner_id: i32,
    pub item_id: i32,
    pub checkpoints: Vec<Checkpoint>,
    pub adaptive: AdaptiveState,
    pub history: Vec<HistoryEntry>,
    pub metrics: RevisionMetrics,
    pub queue: QueueState,
    pub status: ScheduleStatus,
    pub is_active: bool,
    pub manually_rescheduled: bool,
    pub rescheduled_to: Option<NaiveDateTime>,
    pub pause_until: Option<NaiveDateTime>,
    #[serde(skip)]
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RevisionSchedule {
    pub fn checkpoint(&self, kind: CheckpointKind) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.kind == kind)
    }

    pub fn checkpoint_mut(&mut self, kind: CheckpointKind) -> Option<&mut Checkpoint> {
        self.checkpoints.iter_mut().find(|c| c.kind == kind)
    }

    pub fn fixed_checkpoints(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter().filter(|c| c.kind.is_fixed())
    }

    /// True when every fixed checkpoint is unscheduled or completed
    pub fn is_all_revisions_completed(&self) -> bool {
        self.fixed_checkpoints().all(Checkpoint::is_settled)
    }

    /// Where a fixed checkpoint lands if it gets enabled
    pub fn anchor_for(&self, kind: CheckpointKind) -> Option<NaiveDateTime> {
        kind.offset_days()
            .map(|days| self.created_at + Duration::days(days))
    }

    /// Drops the current adaptive entry and appends a fresh pending one.
    pub fn reinsert_adaptive(&mut self, at: NaiveDateTime) {
        self.checkpoints.retain(|c| c.kind != CheckpointKind::Adaptive);
        self.checkpoints
            .push(Checkpoint::scheduled_for(CheckpointKind::Adaptive, at));
    }

    /// Earliest scheduled time across all pending checkpoints
    pub fn next_pending_at(&self) -> Option<NaiveDateTime> {
        self.checkpoints
            .iter()
            .filter(|c| c.is_pending())
            .filter_map(|c| c.scheduled_at)
            .min()
    }

    /// Paused with no end date, or with an end date still in the future
    pub fn is_paused_at(&self, now: NaiveDateTime) -> bool {
        self.status == ScheduleStatus::Paused
            && self.pause_until.map_or(true, |until| until > now)
    }

    /// Status as of `now`: the stored value, with an expired pause read as
    /// active and an active schedule with something past due read as overdue.
    pub fn effective_status(&self, now: NaiveDateTime) -> ScheduleStatus {
        match self.status {
            ScheduleStatus::Paused if self.is_paused_at(now) => ScheduleStatus::Paused,
            ScheduleStatus::Completed => ScheduleStatus::Completed,
            _ => match self.next_pending_at() {
                Some(at) if at <= now => ScheduleStatus::Overdue,
                _ => ScheduleStatus::Active,
            },
        }
    }

    /// Status implied by the checkpoints, keeping a manual pause in place
    pub fn derived_status(&self) -> ScheduleStatus {
        if self.is_all_revisions_completed() {
            ScheduleStatus::Completed
        } else if self.status == ScheduleStatus::Paused {
            ScheduleStatus::Paused
        } else {
            ScheduleStatus::Active
        }
    }
}
