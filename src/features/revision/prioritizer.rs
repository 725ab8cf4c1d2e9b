use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;

use crate::data::models::RevisionSchedule;
use crate::features::revision::resolver::{self, NextDue};

/// One entry of an owner's revision queue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRevision {
    pub schedule_id: Option<i32>,
    pub owner_id: i32,
    pub item_id: i32,
    pub next_due: NextDue,
    pub priority: i32,
    pub position: Option<i32>,
}

impl RankedRevision {
    fn days_overdue(&self) -> i64 {
        self.next_due.days_overdue.unwrap_or(0)
    }
}

/// Queue order: overdue first, most overdue first, then manual priority,
/// then whatever is due soonest.
pub fn compare(a: &RankedRevision, b: &RankedRevision) -> Ordering {
    b.next_due
        .is_overdue
        .cmp(&a.next_due.is_overdue)
        .then_with(|| b.days_overdue().cmp(&a.days_overdue()))
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.next_due.scheduled_at.cmp(&b.next_due.scheduled_at))
}

pub fn rank(mut entries: Vec<RankedRevision>) -> Vec<RankedRevision> {
    entries.sort_by(compare);
    entries
}

/// Resolves every schedule as of `now` and ranks what is overdue. With a
/// horizon, items coming due within that window are included too. Paused
/// and deactivated schedules are skipped.
pub fn build_queue(
    schedules: &[RevisionSchedule],
    now: NaiveDateTime,
    horizon: Option<Duration>,
) -> Vec<RankedRevision> {
    let cutoff = horizon.map(|h| now + h);

    let entries = schedules
        .iter()
        .filter(|s| s.is_active && !s.is_paused_at(now))
        .filter_map(|s| {
            let next_due = resolver::next_due(s, now)?;
            let wanted = next_due.is_overdue
                || cutoff.is_some_and(|limit| next_due.scheduled_at <= limit);
            wanted.then(|| RankedRevision {
                schedule_id: s.id,
                owner_id: s.owner_id,
                item_id: s.item_id,
                next_due,
                priority: s.queue.priority,
                position: s.queue.position,
            })
        })
        .collect();

    rank(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{CheckpointKind, Difficulty, ScheduleStatus};
    use crate::features::revision::scheduler;
    use chrono::NaiveDate;

    fn day0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn entry(item_id: i32, overdue: Option<i64>, until: Option<i64>, priority: i32) -> RankedRevision {
        let now = day0();
        let (scheduled_at, is_overdue) = match (overdue, until) {
            (Some(days), _) => (now - Duration::days(days), true),
            (None, Some(days)) => (now + Duration::days(days), false),
            (None, None) => (now, true),
        };
        RankedRevision {
            schedule_id: Some(item_id),
            owner_id: 1,
            item_id,
            next_due: NextDue {
                checkpoint: CheckpointKind::Adaptive,
                scheduled_at,
                is_overdue,
                days_overdue: overdue,
                days_until: until,
            },
            priority,
            position: None,
        }
    }

    #[test]
    fn test_rank_sort_key() {
        let ranked = rank(vec![
            entry(1, None, Some(2), 50),
            entry(2, Some(1), None, 0),
            entry(3, Some(4), None, 0),
            entry(4, Some(1), None, 10),
            entry(5, None, Some(1), 0),
            entry(6, None, Some(3), 0),
        ]);

        let order: Vec<i32> = ranked.iter().map(|r| r.item_id).collect();
        assert_eq!(order, vec![3, 4, 2, 1, 5, 6]);
    }

    #[test]
    fn test_build_queue_filters_paused_inactive_and_future() {
        let now = day0();
        let due = scheduler::initialize(1, 1, Difficulty::Easy, now);

        let mut paused = scheduler::initialize(1, 2, Difficulty::Easy, now);
        paused.status = ScheduleStatus::Paused;

        let mut pause_expired = scheduler::initialize(1, 3, Difficulty::Easy, now);
        pause_expired.status = ScheduleStatus::Paused;
        pause_expired.pause_until = Some(now - Duration::hours(1));

        let mut inactive = scheduler::initialize(1, 4, Difficulty::Easy, now);
        inactive.is_active = false;

        let future = scheduler::initialize(1, 5, Difficulty::Easy, now + Duration::days(2));

        let schedules = vec![due, paused, pause_expired, inactive, future];

        let overdue_only: Vec<i32> = build_queue(&schedules, now, None)
            .iter()
            .map(|r| r.item_id)
            .collect();
        assert_eq!(overdue_only, vec![1, 3]);

        let with_horizon: Vec<i32> = build_queue(&schedules, now, Some(Duration::days(3)))
            .iter()
            .map(|r| r.item_id)
            .collect();
        assert_eq!(with_horizon, vec![1, 3, 5]);
    }

    #[test]
    fn test_manual_priority_breaks_ties() {
        let now = day0();
        let low = scheduler::initialize(1, 1, Difficulty::Easy, now);
        let mut high = scheduler::initialize(1, 2, Difficulty::Easy, now);
        high.queue.priority = 7;

        let ranked = build_queue(&[low, high], now, None);
        assert_eq!(ranked[0].item_id, 2);
        assert_eq!(ranked[0].priority, 7);
    }
}
