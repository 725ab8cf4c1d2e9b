use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::data::models::{RevisionError, RevisionSchedule, ScheduleRow, ScheduleStatus};
use crate::schema::revision_schedules;

pub struct ScheduleRepository;

impl ScheduleRepository {
    /// Inserts a new schedule and reads it back with its assigned id
    pub fn insert(
        conn: &mut SqliteConnection,
        schedule: &RevisionSchedule,
    ) -> Result<RevisionSchedule, RevisionError> {
        let row = schedule.to_new_row()?;

        diesel::insert_into(revision_schedules::table)
            .values(&row)
            .execute(conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    RevisionError::DuplicateSchedule {
                        owner_id: schedule.owner_id,
                        item_id: schedule.item_id,
                    }
                }
                other => RevisionError::DatabaseError(other),
            })?;

        Self::find_by_owner_and_item(conn, schedule.owner_id, schedule.item_id)?.ok_or_else(|| {
            RevisionError::InconsistentState("inserted schedule could not be read back".into())
        })
    }

    pub fn find_by_id(
        conn: &mut SqliteConnection,
        schedule_id: i32,
    ) -> Result<Option<RevisionSchedule>, RevisionError> {
        revision_schedules::table
            .filter(revision_schedules::schedule_id.eq(schedule_id))
            .select(ScheduleRow::as_select())
            .first(conn)
            .optional()?
            .map(RevisionSchedule::try_from)
            .transpose()
    }

    pub fn find_by_owner_and_item(
        conn: &mut SqliteConnection,
        owner_id: i32,
        item_id: i32,
    ) -> Result<Option<RevisionSchedule>, RevisionError> {
        revision_schedules::table
            .filter(revision_schedules::owner_id.eq(owner_id))
            .filter(revision_schedules::item_id.eq(item_id))
            .select(ScheduleRow::as_select())
            .first(conn)
            .optional()?
            .map(RevisionSchedule::try_from)
            .transpose()
    }

    pub fn exists(
        conn: &mut SqliteConnection,
        owner_id: i32,
        item_id: i32,
    ) -> Result<bool, RevisionError> {
        use diesel::dsl::exists;
        use diesel::select;

        Ok(select(exists(
            revision_schedules::table
                .filter(revision_schedules::owner_id.eq(owner_id))
                .filter(revision_schedules::item_id.eq(item_id)),
        ))
        .get_result(conn)?)
    }

    pub fn list_for_owner(
        conn: &mut SqliteConnection,
        owner_id: i32,
    ) -> Result<Vec<RevisionSchedule>, RevisionError> {
        let rows = revision_schedules::table
            .filter(revision_schedules::owner_id.eq(owner_id))
            .order_by(revision_schedules::schedule_id.asc())
            .select(ScheduleRow::as_select())
            .load(conn)?;

        Self::decode_all(rows)
    }

    /// Active schedules of an owner with some checkpoint due before `horizon`
    pub fn list_due_for_owner(
        conn: &mut SqliteConnection,
        owner_id: i32,
        horizon: NaiveDateTime,
    ) -> Result<Vec<RevisionSchedule>, RevisionError> {
        let rows = revision_schedules::table
            .filter(revision_schedules::owner_id.eq(owner_id))
            .filter(revision_schedules::is_active.eq(true))
            .filter(revision_schedules::next_due_at.le(horizon))
            .order_by(revision_schedules::next_due_at.asc())
            .select(ScheduleRow::as_select())
            .load(conn)?;

        Self::decode_all(rows)
    }

    pub fn list_by_owner_and_status(
        conn: &mut SqliteConnection,
        owner_id: i32,
        status: ScheduleStatus,
    ) -> Result<Vec<RevisionSchedule>, RevisionError> {
        let rows = revision_schedules::table
            .filter(revision_schedules::owner_id.eq(owner_id))
            .filter(revision_schedules::status.eq(status.as_str()))
            .filter(revision_schedules::is_active.eq(true))
            .order_by(revision_schedules::schedule_id.asc())
            .select(ScheduleRow::as_select())
            .load(conn)?;

        Self::decode_all(rows)
    }

    /// One page of active schedules across all owners with something due
    /// before `horizon`, keyed after `after_id`
    pub fn list_due_page(
        conn: &mut SqliteConnection,
        horizon: NaiveDateTime,
        after_id: i32,
        limit: i64,
    ) -> Result<Vec<RevisionSchedule>, RevisionError> {
        let rows = revision_schedules::table
            .filter(revision_schedules::schedule_id.gt(after_id))
            .filter(revision_schedules::is_active.eq(true))
            .filter(revision_schedules::next_due_at.le(horizon))
            .order_by(revision_schedules::schedule_id.asc())
            .limit(limit)
            .select(ScheduleRow::as_select())
            .load(conn)?;

        Self::decode_all(rows)
    }

    /// Writes `schedule` only if the stored version still equals
    /// `schedule.version`. Returns false when another writer got there first.
    pub fn compare_and_swap(
        conn: &mut SqliteConnection,
        schedule: &RevisionSchedule,
    ) -> Result<bool, RevisionError> {
        let schedule_id = schedule.id.ok_or_else(|| {
            RevisionError::InconsistentState("cannot update a schedule that was never stored".into())
        })?;
        let changes = schedule.to_changeset()?;

        let updated = diesel::update(
            revision_schedules::table
                .filter(revision_schedules::schedule_id.eq(schedule_id))
                .filter(revision_schedules::version.eq(schedule.version)),
        )
        .set(&changes)
        .execute(conn)?;

        Ok(updated == 1)
    }

    fn decode_all(rows: Vec<ScheduleRow>) -> Result<Vec<RevisionSchedule>, RevisionError> {
        rows.into_iter().map(RevisionSchedule::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::Difficulty;
    use crate::data::test_pool;
    use crate::features::revision::scheduler;
    use chrono::{Duration, NaiveDate};

    fn day0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_insert_assigns_id_and_round_trips_state() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let schedule = scheduler::initialize(7, 42, Difficulty::Hard, day0());
        let stored = ScheduleRepository::insert(&mut conn, &schedule).unwrap();

        assert!(stored.id.is_some());
        assert_eq!(stored.checkpoints, schedule.checkpoints);
        assert_eq!(stored.adaptive, schedule.adaptive);
        assert_eq!(stored.version, 0);

        let by_id = ScheduleRepository::find_by_id(&mut conn, stored.id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(by_id, stored);
    }

    #[test]
    fn test_insert_rejects_duplicate_pair() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let schedule = scheduler::initialize(7, 42, Difficulty::Easy, day0());
        ScheduleRepository::insert(&mut conn, &schedule).unwrap();

        let err = ScheduleRepository::insert(&mut conn, &schedule).unwrap_err();
        assert!(matches!(
            err,
            RevisionError::DuplicateSchedule { owner_id: 7, item_id: 42 }
        ));
        assert!(ScheduleRepository::exists(&mut conn, 7, 42).unwrap());
        assert!(!ScheduleRepository::exists(&mut conn, 7, 43).unwrap());
    }

    #[test]
    fn test_compare_and_swap_detects_stale_version() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let stored = ScheduleRepository::insert(
            &mut conn,
            &scheduler::initialize(1, 1, Difficulty::Medium, day0()),
        )
        .unwrap();

        let mut first = stored.clone();
        first.queue.priority = 5;
        assert!(ScheduleRepository::compare_and_swap(&mut conn, &first).unwrap());

        let mut stale = stored.clone();
        stale.queue.priority = 9;
        assert!(!ScheduleRepository::compare_and_swap(&mut conn, &stale).unwrap());

        let current = ScheduleRepository::find_by_id(&mut conn, stored.id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(current.queue.priority, 5);
        assert_eq!(current.version, 1);
    }

    #[test]
    fn test_due_listing_respects_horizon_and_deactivation() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let now = day0();
        ScheduleRepository::insert(&mut conn, &scheduler::initialize(3, 1, Difficulty::Easy, now))
            .unwrap();
        let later = now + Duration::days(5);
        ScheduleRepository::insert(&mut conn, &scheduler::initialize(3, 2, Difficulty::Easy, later))
            .unwrap();
        let mut gone = scheduler::initialize(3, 3, Difficulty::Easy, now);
        gone.is_active = false;
        ScheduleRepository::insert(&mut conn, &gone).unwrap();

        let due = ScheduleRepository::list_due_for_owner(&mut conn, 3, now).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].item_id, 1);

        let within_week =
            ScheduleRepository::list_due_for_owner(&mut conn, 3, now + Duration::days(7)).unwrap();
        assert_eq!(within_week.len(), 2);

        let active =
            ScheduleRepository::list_by_owner_and_status(&mut conn, 3, ScheduleStatus::Active)
                .unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(ScheduleRepository::list_for_owner(&mut conn, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_due_page_walks_all_owners() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        for owner in 1..=3 {
            for item in 1..=2 {
                ScheduleRepository::insert(
                    &mut conn,
                    &scheduler::initialize(owner, item, Difficulty::Medium, day0()),
                )
                .unwrap();
            }
        }

        let first = ScheduleRepository::list_due_page(&mut conn, day0(), 0, 4).unwrap();
        assert_eq!(first.len(), 4);
        let last_id = first.last().unwrap().id.unwrap();
        let second = ScheduleRepository::list_due_page(&mut conn, day0(), last_id, 4).unwrap();
        assert_eq!(second.len(), 2);
    }
}
