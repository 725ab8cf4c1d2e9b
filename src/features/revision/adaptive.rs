//! Adaptive interval engine
//!
//! SM-2 flavoured: each completion moves the ease factor and the current
//! interval according to the first matching rule.
//!
//! | rule       | condition                                   | ease   | interval                 |
//! |------------|---------------------------------------------|--------|--------------------------|
//! | Mastered   | effectiveness >= 0.9 and remembered         | x 1.3  | ceil(interval * ease)    |
//! | Recalled   | 0.7 <= effectiveness < 0.9 and remembered   | x 1.1  | ceil(interval * ease)    |
//! | Struggled  | 0.5 <= effectiveness < 0.7, or forgotten    | x 0.8  | max(1, floor(interval/2))|
//! | Reset      | effectiveness < 0.5 and remembered          | = 2.5  | base interval            |
//!
//! The ease factor is clamped to [1.3, 3.0] as soon as it changes, so the
//! interval is always grown by a legal factor. Intervals never exceed
//! [`MAX_INTERVAL_DAYS`].

use chrono::{Duration, NaiveDateTime};

use crate::data::models::{
    AdaptiveState, Checkpoint, CheckpointKind, RevisionError, RevisionSchedule,
    DEFAULT_EASE_FACTOR, MAX_EASE_FACTOR, MIN_EASE_FACTOR,
};
use crate::utils::days_between_ceil;

/// Days until the next adaptive review beyond which `day14` is switched on
pub const DAY14_ENABLE_AFTER_DAYS: i64 = 10;
/// Days until the next adaptive review beyond which `day30` is switched on
pub const DAY30_ENABLE_AFTER_DAYS: i64 = 20;
/// Longest gap the adaptive track will schedule
pub const MAX_INTERVAL_DAYS: i64 = 365;

// Absorbs float noise such as 5 * 2.2 = 11.000000000000002
const INTERVAL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveRule {
    Mastered,
    Recalled,
    Struggled,
    Reset,
}

pub fn classify(effectiveness: f64, remembered: bool) -> AdaptiveRule {
    if remembered && effectiveness >= 0.9 {
        AdaptiveRule::Mastered
    } else if remembered && effectiveness >= 0.7 {
        AdaptiveRule::Recalled
    } else if !remembered || effectiveness >= 0.5 {
        AdaptiveRule::Struggled
    } else {
        AdaptiveRule::Reset
    }
}

/// New adaptive state after one outcome. Pure; does not touch checkpoints.
pub fn recalculate(
    state: &AdaptiveState,
    effectiveness: f64,
    remembered: bool,
    now: NaiveDateTime,
) -> Result<(AdaptiveRule, AdaptiveState), RevisionError> {
    let rule = classify(effectiveness, remembered);
    let mut next = state.clone();

    match rule {
        AdaptiveRule::Mastered | AdaptiveRule::Recalled => {
            let factor = if rule == AdaptiveRule::Mastered { 1.3 } else { 1.1 };
            next.ease_factor = clamp_ease(state.ease_factor * factor);
            let grown = (state.current_interval as f64 * next.ease_factor * state.interval_modifier)
                .min(MAX_INTERVAL_DAYS as f64);
            next.current_interval =
                ((grown - INTERVAL_EPSILON).ceil() as i64).clamp(1, MAX_INTERVAL_DAYS);
        }
        AdaptiveRule::Struggled => {
            next.ease_factor = clamp_ease(state.ease_factor * 0.8);
            next.current_interval = (state.current_interval / 2).clamp(1, MAX_INTERVAL_DAYS);
        }
        AdaptiveRule::Reset => {
            next.ease_factor = DEFAULT_EASE_FACTOR;
            next.current_interval = state.base_interval_days();
        }
    }

    next.next_review_due = now
        .checked_add_signed(Duration::days(next.current_interval))
        .ok_or_else(|| {
            RevisionError::InconsistentState(format!(
                "next review {} days after {} is out of range",
                next.current_interval, now
            ))
        })?;
    Ok((rule, next))
}

/// Applies an outcome to the schedule: updates the adaptive track,
/// re-inserts the adaptive checkpoint at its new date and switches on
/// `day14`/`day30` when the next review is far enough out.
pub fn apply(
    schedule: &mut RevisionSchedule,
    effectiveness: f64,
    remembered: bool,
    now: NaiveDateTime,
) -> Result<AdaptiveRule, RevisionError> {
    let (rule, adaptive) = recalculate(&schedule.adaptive, effectiveness, remembered, now)?;
    log::debug!(
        "Adaptive {:?}: ease {:.2} -> {:.2}, interval {}d -> {}d",
        rule,
        schedule.adaptive.ease_factor,
        adaptive.ease_factor,
        schedule.adaptive.current_interval,
        adaptive.current_interval
    );

    let due = adaptive.next_review_due;
    schedule.adaptive = adaptive;
    schedule.reinsert_adaptive(due);

    let days_until_next = days_between_ceil(now, due);
    if days_until_next > DAY14_ENABLE_AFTER_DAYS {
        enable_fixed(schedule, CheckpointKind::Day14, now);
    }
    if days_until_next > DAY30_ENABLE_AFTER_DAYS {
        enable_fixed(schedule, CheckpointKind::Day30, now);
    }

    Ok(rule)
}

/// One-way switch: never touches a checkpoint that is already scheduled.
/// A checkpoint whose anchor has already passed lands on `now` instead.
fn enable_fixed(schedule: &mut RevisionSchedule, kind: CheckpointKind, now: NaiveDateTime) {
    let Some(anchor) = schedule.anchor_for(kind).map(|anchor| anchor.max(now)) else {
        return;
    };
    match schedule.checkpoint_mut(kind) {
        Some(checkpoint) if checkpoint.scheduled => {}
        Some(checkpoint) => {
            checkpoint.scheduled = true;
            checkpoint.scheduled_at = Some(anchor);
            log::debug!("Enabled {} checkpoint at {}", kind, anchor);
        }
        None => schedule.checkpoints.push(Checkpoint::scheduled_for(kind, anchor)),
    }
}

fn clamp_ease(ease: f64) -> f64 {
    ease.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)
}
