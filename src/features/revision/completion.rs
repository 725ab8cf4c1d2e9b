use chrono::NaiveDateTime;

use crate::data::models::{CheckpointKind, HistoryEntry, RevisionError, RevisionSchedule};
use crate::features::revision::adaptive;

/// One revision attempt as reported by the learner
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionAttempt {
    pub checkpoint: CheckpointKind,
    pub effectiveness: f64,
    pub time_taken: Option<u32>,
    pub confidence_before: Option<u8>,
    pub confidence_after: Option<u8>,
    pub remembered: bool,
    pub notes: Option<String>,
}

impl RevisionAttempt {
    #[cfg(test)]
    pub fn new(checkpoint: CheckpointKind, effectiveness: f64, remembered: bool) -> Self {
        Self {
            checkpoint,
            effectiveness,
            time_taken: None,
            confidence_before: None,
            confidence_after: None,
            remembered,
            notes: None,
        }
    }
}

/// Records an attempt against `schedule` and returns the updated snapshot.
///
/// All validation happens before anything is touched, so a failed call
/// leaves the caller's copy as it was. Not idempotent: every successful call
/// appends exactly one history entry.
pub fn complete(
    mut schedule: RevisionSchedule,
    attempt: RevisionAttempt,
    now: NaiveDateTime,
) -> Result<RevisionSchedule, RevisionError> {
    validate(&schedule, &attempt)?;

    let scheduled_for = if attempt.checkpoint.is_fixed() {
        let checkpoint = schedule
            .checkpoint_mut(attempt.checkpoint)
            .ok_or_else(|| missing(attempt.checkpoint))?;
        checkpoint.completed = true;
        checkpoint.completed_at = Some(now);
        checkpoint.effectiveness = Some(attempt.effectiveness);
        checkpoint.scheduled_at.unwrap_or(now)
    } else {
        now
    };

    schedule.history.push(HistoryEntry {
        sequence_number: schedule.history.len() as u32 + 1,
        checkpoint: attempt.checkpoint,
        scheduled_for,
        completed_at: now,
        time_taken: attempt.time_taken,
        confidence_before: attempt.confidence_before,
        confidence_after: attempt.confidence_after,
        remembered: attempt.remembered,
        notes: attempt.notes.clone(),
        effectiveness_score: attempt.effectiveness,
    });
    update_metrics(&mut schedule);

    adaptive::apply(&mut schedule, attempt.effectiveness, attempt.remembered, now)?;

    schedule.status = schedule.derived_status();
    schedule.updated_at = now;

    log::debug!(
        "Completed {} for owner {} item {} (revision #{})",
        attempt.checkpoint,
        schedule.owner_id,
        schedule.item_id,
        schedule.metrics.total_revisions
    );

    Ok(schedule)
}

fn validate(schedule: &RevisionSchedule, attempt: &RevisionAttempt) -> Result<(), RevisionError> {
    if !attempt.effectiveness.is_finite() || !(0.0..=1.0).contains(&attempt.effectiveness) {
        return Err(RevisionError::InvalidEffectiveness(attempt.effectiveness));
    }
    if !schedule.is_active {
        return Err(RevisionError::InconsistentState(
            "schedule has been deactivated".into(),
        ));
    }
    if attempt.checkpoint.is_fixed() {
        let checkpoint = schedule
            .checkpoint(attempt.checkpoint)
            .ok_or_else(|| missing(attempt.checkpoint))?;
        if !checkpoint.scheduled {
            return Err(RevisionError::InconsistentState(format!(
                "checkpoint {} was never scheduled",
                attempt.checkpoint
            )));
        }
        if checkpoint.completed {
            return Err(RevisionError::InconsistentState(format!(
                "checkpoint {} is already completed",
                attempt.checkpoint
            )));
        }
    }
    Ok(())
}

fn missing(kind: CheckpointKind) -> RevisionError {
    RevisionError::InconsistentState(format!("schedule has no {} checkpoint", kind))
}

fn update_metrics(schedule: &mut RevisionSchedule) {
    let total = schedule.history.len() as u32;
    let successful = schedule.history.iter().filter(|h| h.remembered).count() as u32;
    let sum: f64 = schedule.history.iter().map(|h| h.effectiveness_score).sum();

    let metrics = &mut schedule.metrics;
    metrics.total_revisions = total;
    metrics.successful_revisions = successful;
    metrics.average_effectiveness = if total == 0 { 0.0 } else { sum / total as f64 };
    metrics.forgetting_rate = if total == 0 {
        0.0
    } else {
        1.0 - successful as f64 / total as f64
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{Difficulty, ScheduleStatus, FIXED_CHECKPOINTS};
    use crate::features::revision::scheduler;
    use chrono::{Duration, NaiveDate};

    fn day0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_complete_same_day_mastered() {
        let now = day0();
        let schedule = scheduler::initialize(1, 1, Difficulty::Easy, now);

        let updated = complete(
            schedule,
            RevisionAttempt::new(CheckpointKind::SameDay, 0.95, true),
            now,
        )
        .unwrap();

        assert_eq!(updated.adaptive.ease_factor, 3.0);
        assert_eq!(updated.adaptive.current_interval, 3);
        assert_eq!(updated.adaptive.next_review_due, now + Duration::days(3));

        let same_day = updated.checkpoint(CheckpointKind::SameDay).unwrap();
        assert!(same_day.completed);
        assert_eq!(same_day.completed_at, Some(now));
        assert_eq!(same_day.effectiveness, Some(0.95));

        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].sequence_number, 1);
        assert_eq!(updated.history[0].scheduled_for, now);
        assert_eq!(updated.metrics.total_revisions, 1);
        assert_eq!(updated.metrics.successful_revisions, 1);
        assert_eq!(updated.status, ScheduleStatus::Active);
    }

    #[test]
    fn test_complete_forgotten_day3() {
        let now = day0();
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Medium, now);
        schedule.adaptive.current_interval = 5;
        schedule.adaptive.ease_factor = 2.0;

        let later = now + Duration::days(3);
        let updated = complete(
            schedule,
            RevisionAttempt::new(CheckpointKind::Day3, 0.4, false),
            later,
        )
        .unwrap();

        assert!((updated.adaptive.ease_factor - 1.6).abs() < 1e-9);
        assert_eq!(updated.adaptive.current_interval, 2);
        assert_eq!(updated.history[0].scheduled_for, now + Duration::days(3));
        assert_eq!(updated.metrics.successful_revisions, 0);
        assert_eq!(updated.metrics.forgetting_rate, 1.0);
    }

    #[test]
    fn test_rejects_out_of_range_effectiveness() {
        let schedule = scheduler::initialize(1, 1, Difficulty::Easy, day0());

        for bad in [-0.1, 1.01, f64::NAN] {
            let err = complete(
                schedule.clone(),
                RevisionAttempt::new(CheckpointKind::SameDay, bad, true),
                day0(),
            )
            .unwrap_err();
            assert!(matches!(err, RevisionError::InvalidEffectiveness(_)));
        }
    }

    #[test]
    fn test_rejects_unscheduled_and_repeated_checkpoints() {
        let now = day0();
        let schedule = scheduler::initialize(1, 1, Difficulty::Easy, now);

        let err = complete(
            schedule.clone(),
            RevisionAttempt::new(CheckpointKind::Day30, 0.8, true),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, RevisionError::InconsistentState(_)));

        let once = complete(
            schedule,
            RevisionAttempt::new(CheckpointKind::SameDay, 0.8, true),
            now,
        )
        .unwrap();
        let err = complete(
            once,
            RevisionAttempt::new(CheckpointKind::SameDay, 0.8, true),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, RevisionError::InconsistentState(_)));
    }

    #[test]
    fn test_adaptive_completions_accumulate_history() {
        let now = day0();
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Easy, now);

        let scores = [(0.9, true), (0.5, false), (0.7, true)];
        for (eff, remembered) in scores {
            schedule = complete(
                schedule,
                RevisionAttempt::new(CheckpointKind::Adaptive, eff, remembered),
                now,
            )
            .unwrap();
        }

        assert_eq!(schedule.history.len(), 3);
        assert_eq!(schedule.metrics.total_revisions, 3);
        assert_eq!(schedule.metrics.successful_revisions, 2);
        assert!((schedule.metrics.average_effectiveness - 0.7).abs() < 1e-9);
        let sequence: Vec<u32> = schedule.history.iter().map(|h| h.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
        assert!(schedule.history.iter().all(|h| h.scheduled_for == now));
    }

    #[test]
    fn test_long_mastered_streak_keeps_interval_bounded() {
        let now = day0();
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Easy, now);

        for _ in 0..50 {
            schedule = complete(
                schedule,
                RevisionAttempt::new(CheckpointKind::Adaptive, 1.0, true),
                now,
            )
            .unwrap();
        }

        assert_eq!(schedule.history.len(), 50);
        assert_eq!(schedule.adaptive.current_interval, adaptive::MAX_INTERVAL_DAYS);
        assert_eq!(
            schedule.checkpoint(CheckpointKind::Adaptive).unwrap().scheduled_at,
            Some(now + Duration::days(adaptive::MAX_INTERVAL_DAYS))
        );
    }

    #[test]
    fn test_all_fixed_completed_marks_schedule_completed() {
        let now = day0();
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Hard, now);

        // Low scores keep the adaptive interval short so day30 stays off
        for (i, kind) in [
            CheckpointKind::SameDay,
            CheckpointKind::Day3,
            CheckpointKind::Day7,
        ]
        .into_iter()
        .enumerate()
        {
            schedule = complete(schedule, RevisionAttempt::new(kind, 0.6, true), now).unwrap();
            assert_eq!(schedule.status, ScheduleStatus::Active, "after #{}", i + 1);
            assert!(!schedule.is_all_revisions_completed());
        }

        schedule = complete(
            schedule,
            RevisionAttempt::new(CheckpointKind::Day14, 0.6, true),
            now,
        )
        .unwrap();
        assert!(schedule.is_all_revisions_completed());
        assert_eq!(schedule.status, ScheduleStatus::Completed);
    }

    #[test]
    fn test_completing_every_fixed_checkpoint() {
        let now = day0();
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Hard, now);
        schedule.checkpoint_mut(CheckpointKind::Day30).unwrap().scheduled = true;
        schedule.checkpoint_mut(CheckpointKind::Day30).unwrap().scheduled_at =
            Some(now + Duration::days(30));

        for kind in FIXED_CHECKPOINTS {
            schedule = complete(schedule, RevisionAttempt::new(kind, 0.95, true), now).unwrap();
            assert_eq!(
                schedule.is_all_revisions_completed(),
                schedule.status == ScheduleStatus::Completed
            );
        }

        assert_eq!(schedule.status, ScheduleStatus::Completed);
        assert_eq!(schedule.history.len(), 5);
        for kind in FIXED_CHECKPOINTS {
            let checkpoint = schedule.checkpoint(kind).unwrap();
            assert!(checkpoint.completed);
            assert!(checkpoint.completed_at.is_some());
        }
    }

    #[test]
    fn test_completion_while_paused_keeps_pause() {
        let now = day0();
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Easy, now);
        schedule.status = ScheduleStatus::Paused;

        let updated = complete(
            schedule,
            RevisionAttempt::new(CheckpointKind::SameDay, 0.8, true),
            now,
        )
        .unwrap();
        assert_eq!(updated.status, ScheduleStatus::Paused);
    }

    #[test]
    fn test_deactivated_schedule_rejects_completion() {
        let mut schedule = scheduler::initialize(1, 1, Difficulty::Easy, day0());
        schedule.is_active = false;

        let err = complete(
            schedule,
            RevisionAttempt::new(CheckpointKind::Adaptive, 0.8, true),
            day0(),
        )
        .unwrap_err();
        assert!(matches!(err, RevisionError::InconsistentState(_)));
    }
}
