use chrono::{Duration, NaiveDateTime};

use crate::data::models::{
    AdaptiveState, Checkpoint, CheckpointKind, Difficulty, QueueState, RevisionMetrics,
    RevisionSchedule, ScheduleStatus, DEFAULT_EASE_FACTOR, FIXED_CHECKPOINTS,
};

/// Builds the first schedule for a freshly solved item.
///
/// `sameDay`, `day3` and `day7` are always scheduled; `day14` only for hard
/// items; `day30` is left for the adaptive engine to switch on later. The
/// adaptive track starts due immediately.
pub fn initialize(
    owner_id: i32,
    item_id: i32,
    difficulty: Difficulty,
    now: NaiveDateTime,
) -> RevisionSchedule {
    let mut checkpoints: Vec<Checkpoint> = FIXED_CHECKPOINTS
        .iter()
        .map(|&kind| {
            if enabled_at_creation(kind, difficulty) {
                let offset = kind.offset_days().unwrap_or(0);
                Checkpoint::scheduled_for(kind, now + Duration::days(offset))
            } else {
                Checkpoint::unscheduled(kind)
            }
        })
        .collect();
    checkpoints.push(Checkpoint::scheduled_for(CheckpointKind::Adaptive, now));

    let base_interval = difficulty.interval_multiplier();
    let adaptive = AdaptiveState {
        base_interval,
        current_interval: AdaptiveState::whole_days(base_interval),
        next_review_due: now,
        ease_factor: DEFAULT_EASE_FACTOR,
        interval_modifier: 1.0,
    };

    log::debug!(
        "Initialized schedule for owner {} item {} ({:?})",
        owner_id,
        item_id,
        difficulty
    );

    RevisionSchedule {
        id: None,
        owner_id,
        item_id,
        checkpoints,
        adaptive,
        history: Vec::new(),
        metrics: RevisionMetrics::new(difficulty),
        queue: QueueState::default(),
        status: ScheduleStatus::Active,
        is_active: true,
        manually_rescheduled: false,
        rescheduled_to: None,
        pause_until: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

fn enabled_at_creation(kind: CheckpointKind, difficulty: Difficulty) -> bool {
    match kind {
        CheckpointKind::SameDay | CheckpointKind::Day3 | CheckpointKind::Day7 => true,
        CheckpointKind::Day14 => difficulty == Difficulty::Hard,
        CheckpointKind::Day30 | CheckpointKind::Adaptive => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_hard_item_checkpoints() {
        let now = day0();
        let schedule = initialize(1, 2, Difficulty::Hard, now);

        let at = |kind| schedule.checkpoint(kind).unwrap().scheduled_at;
        assert_eq!(at(CheckpointKind::SameDay), Some(now));
        assert_eq!(at(CheckpointKind::Day3), Some(now + Duration::days(3)));
        assert_eq!(at(CheckpointKind::Day7), Some(now + Duration::days(7)));
        assert_eq!(at(CheckpointKind::Day14), Some(now + Duration::days(14)));

        let day30 = schedule.checkpoint(CheckpointKind::Day30).unwrap();
        assert!(!day30.scheduled);
        assert_eq!(day30.scheduled_at, None);
    }

    #[test]
    fn test_day14_only_for_hard_and_day30_never() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let schedule = initialize(1, 2, difficulty, day0());
            let day14 = schedule.checkpoint(CheckpointKind::Day14).unwrap();
            let day30 = schedule.checkpoint(CheckpointKind::Day30).unwrap();

            assert_eq!(day14.scheduled, difficulty == Difficulty::Hard);
            assert!(!day30.scheduled);
            assert!(schedule.checkpoints.iter().all(|c| !c.completed));
        }
    }

    #[test]
    fn test_adaptive_defaults() {
        let now = day0();
        let schedule = initialize(1, 2, Difficulty::Medium, now);

        assert_eq!(schedule.adaptive.base_interval, 0.8);
        assert_eq!(schedule.adaptive.current_interval, 1);
        assert_eq!(schedule.adaptive.next_review_due, now);
        assert_eq!(schedule.adaptive.ease_factor, 2.5);
        assert_eq!(schedule.metrics.last_difficulty, Difficulty::Medium);
        assert_eq!(schedule.metrics.total_revisions, 0);
        assert_eq!(schedule.status, ScheduleStatus::Active);

        let adaptive = schedule.checkpoint(CheckpointKind::Adaptive).unwrap();
        assert!(adaptive.is_pending());
        assert_eq!(adaptive.scheduled_at, Some(now));
    }
}
