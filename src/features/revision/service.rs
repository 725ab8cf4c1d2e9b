use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

use crate::data::DbPool;
use crate::data::models::{
    Difficulty, OwnerOverdue, RevisionError, RevisionSchedule, ScheduleStatus,
};
use crate::data::repositories::ScheduleRepository;
use crate::features::revision::completion::{self, RevisionAttempt};
use crate::features::revision::prioritizer::{self, RankedRevision};
use crate::features::revision::resolver::{self, NextDue, ScheduleSummary};
use crate::features::revision::scheduler;

const SWEEP_PAGE_SIZE: i64 = 200;

/// Runs engine commands against the store.
///
/// The store owns the authoritative copy. Each mutation reads a snapshot,
/// applies a pure change to it and writes back with a version check; on a
/// lost race the whole read-modify-write is redone.
#[derive(Clone)]
pub struct RevisionService {
    pool: DbPool,
    max_write_retries: u32,
}

impl RevisionService {
    pub fn new(pool: DbPool, max_write_retries: u32) -> Self {
        Self {
            pool,
            max_write_retries,
        }
    }

    pub fn initialize_schedule(
        &self,
        owner_id: i32,
        item_id: i32,
        difficulty: Difficulty,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        let mut conn = self.pool.get()?;

        if ScheduleRepository::exists(&mut conn, owner_id, item_id)? {
            log::warn!(
                "Schedule already exists for owner {} item {}",
                owner_id,
                item_id
            );
            return Err(RevisionError::DuplicateSchedule { owner_id, item_id });
        }

        let schedule = scheduler::initialize(owner_id, item_id, difficulty, now);
        let stored = ScheduleRepository::insert(&mut conn, &schedule)?;
        log::info!(
            "Created schedule {:?} for owner {} item {}",
            stored.id,
            owner_id,
            item_id
        );
        Ok(stored)
    }

    pub fn get_schedule(&self, schedule_id: i32) -> Result<RevisionSchedule, RevisionError> {
        let mut conn = self.pool.get()?;
        ScheduleRepository::find_by_id(&mut conn, schedule_id)?
            .ok_or(RevisionError::ScheduleNotFound(schedule_id))
    }

    pub fn complete_revision(
        &self,
        schedule_id: i32,
        attempt: RevisionAttempt,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        self.mutate(schedule_id, |schedule| {
            completion::complete(schedule, attempt.clone(), now)
        })
    }

    pub fn get_next_due(
        &self,
        schedule_id: i32,
        now: NaiveDateTime,
    ) -> Result<Option<NextDue>, RevisionError> {
        let schedule = self.get_schedule(schedule_id)?;
        Ok(resolver::next_due(&schedule, now))
    }

    pub fn list_due_for_owner(
        &self,
        owner_id: i32,
        now: NaiveDateTime,
        horizon_days: Option<i64>,
    ) -> Result<Vec<RankedRevision>, RevisionError> {
        let horizon = horizon_days.map(Duration::days);
        let cutoff = now + horizon.unwrap_or_else(Duration::zero);

        let mut conn = self.pool.get()?;
        let schedules = ScheduleRepository::list_due_for_owner(&mut conn, owner_id, cutoff)?;
        Ok(prioritizer::build_queue(&schedules, now, horizon))
    }

    /// Owner's active schedules, optionally narrowed to one status. The
    /// filter matches the status each summary reports as of `now`, so an
    /// expired pause lists as active or overdue. Only `Completed` can be
    /// served straight from the stored status.
    pub fn list_schedules(
        &self,
        owner_id: i32,
        status: Option<ScheduleStatus>,
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduleSummary>, RevisionError> {
        let mut conn = self.pool.get()?;
        let schedules = match status {
            Some(ScheduleStatus::Completed) => ScheduleRepository::list_by_owner_and_status(
                &mut conn,
                owner_id,
                ScheduleStatus::Completed,
            )?,
            _ => ScheduleRepository::list_for_owner(&mut conn, owner_id)?,
        };

        Ok(schedules
            .iter()
            .filter(|s| s.is_active)
            .map(|s| resolver::summarize(s, now))
            .filter(|summary| status.is_none_or(|wanted| summary.status == wanted))
            .collect())
    }

    pub fn set_queue_state(
        &self,
        schedule_id: i32,
        priority: i32,
        position: Option<i32>,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        self.mutate(schedule_id, |mut schedule| {
            schedule.queue.in_queue = true;
            schedule.queue.priority = priority;
            schedule.queue.position = position;
            schedule.updated_at = now;
            Ok(schedule)
        })
    }

    pub fn clear_queue_state(
        &self,
        schedule_id: i32,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        self.mutate(schedule_id, |mut schedule| {
            schedule.queue.in_queue = false;
            schedule.queue.position = None;
            schedule.updated_at = now;
            Ok(schedule)
        })
    }

    pub fn pause_schedule(
        &self,
        schedule_id: i32,
        until: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        self.mutate(schedule_id, |mut schedule| {
            if schedule.status == ScheduleStatus::Completed {
                return Err(RevisionError::InconsistentState(
                    "a completed schedule cannot be paused".into(),
                ));
            }
            if let Some(until) = until.filter(|until| *until <= now) {
                return Err(RevisionError::ValidationError(format!(
                    "pause end {} is not in the future",
                    until
                )));
            }
            schedule.status = ScheduleStatus::Paused;
            schedule.pause_until = until;
            schedule.updated_at = now;
            Ok(schedule)
        })
    }

    pub fn resume_schedule(
        &self,
        schedule_id: i32,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        self.mutate(schedule_id, |mut schedule| {
            schedule.pause_until = None;
            schedule.status = ScheduleStatus::Active;
            schedule.status = schedule.derived_status();
            schedule.updated_at = now;
            Ok(schedule)
        })
    }

    /// Manual override of the adaptive track's next review
    pub fn reschedule(
        &self,
        schedule_id: i32,
        to: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        self.mutate(schedule_id, |mut schedule| {
            schedule.manually_rescheduled = true;
            schedule.rescheduled_to = Some(to);
            schedule.adaptive.next_review_due = to;
            schedule.reinsert_adaptive(to);
            schedule.updated_at = now;
            Ok(schedule)
        })
    }

    /// Soft-deactivates the schedule of a removed item; the record is kept
    pub fn deactivate_item(
        &self,
        owner_id: i32,
        item_id: i32,
        now: NaiveDateTime,
    ) -> Result<RevisionSchedule, RevisionError> {
        let schedule_id = {
            let mut conn = self.pool.get()?;
            ScheduleRepository::find_by_owner_and_item(&mut conn, owner_id, item_id)?
                .and_then(|s| s.id)
                .ok_or(RevisionError::NoScheduleForItem { owner_id, item_id })?
        };

        self.mutate(schedule_id, |mut schedule| {
            schedule.is_active = false;
            schedule.queue.in_queue = false;
            schedule.updated_at = now;
            Ok(schedule)
        })
    }

    /// Counts overdue active schedules per owner. Walks the table page by
    /// page and resolves each record on its own.
    pub fn overdue_summary(&self, now: NaiveDateTime) -> Result<Vec<OwnerOverdue>, RevisionError> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        let mut after_id = 0;

        loop {
            let page = {
                let mut conn = self.pool.get()?;
                ScheduleRepository::list_due_page(&mut conn, now, after_id, SWEEP_PAGE_SIZE)?
            };
            let Some(last_id) = page.last().and_then(|s| s.id) else {
                break;
            };

            for schedule in page.iter().filter(|s| !s.is_paused_at(now)) {
                if resolver::next_due(schedule, now).is_some_and(|due| due.is_overdue) {
                    *counts.entry(schedule.owner_id).or_default() += 1;
                }
            }

            after_id = last_id;
        }

        Ok(counts
            .into_iter()
            .map(|(owner_id, overdue_count)| OwnerOverdue {
                owner_id,
                overdue_count,
            })
            .collect())
    }

    /// Read, apply `change`, compare-and-swap; retried on version conflicts.
    fn mutate<F>(&self, schedule_id: i32, change: F) -> Result<RevisionSchedule, RevisionError>
    where
        F: Fn(RevisionSchedule) -> Result<RevisionSchedule, RevisionError>,
    {
        let mut conn = self.pool.get()?;
        let mut attempts = 0;

        loop {
            let current = ScheduleRepository::find_by_id(&mut conn, schedule_id)?
                .ok_or(RevisionError::ScheduleNotFound(schedule_id))?;
            let version = current.version;
            let updated = change(current)?;

            if ScheduleRepository::compare_and_swap(&mut conn, &updated)? {
                return Ok(RevisionSchedule {
                    version: version + 1,
                    ..updated
                });
            }

            attempts += 1;
            if attempts > self.max_write_retries {
                log::error!(
                    "Giving up on schedule {} after {} conflicting writes",
                    schedule_id,
                    attempts
                );
                return Err(RevisionError::ConcurrentModification(schedule_id));
            }
            log::warn!(
                "Version conflict on schedule {} (attempt {}), retrying",
                schedule_id,
                attempts
            );
        }
    }
}
