use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::features::revision::RevisionService;

pub mod schedules;

pub fn revision_router(service: RevisionService) -> Router {
    Router::new()
        .route("/schedules", post(schedules::initialize_schedule))
        .route("/schedules/{schedule_id}", get(schedules::get_schedule))
        .route(
            "/schedules/{schedule_id}/complete",
            post(schedules::complete_revision),
        )
        .route(
            "/schedules/{schedule_id}/next-due",
            get(schedules::get_next_due),
        )
        .route(
            "/schedules/{schedule_id}/queue",
            put(schedules::set_queue_state).delete(schedules::clear_queue_state),
        )
        .route("/schedules/{schedule_id}/pause", post(schedules::pause_schedule))
        .route(
            "/schedules/{schedule_id}/resume",
            post(schedules::resume_schedule),
        )
        .route(
            "/schedules/{schedule_id}/reschedule",
            post(schedules::reschedule),
        )
        .route("/owners/{owner_id}/due", get(schedules::list_due_for_owner))
        .route("/owners/{owner_id}/schedules", get(schedules::list_schedules))
        .route(
            "/owners/{owner_id}/items/{item_id}/schedule",
            delete(schedules::deactivate_item),
        )
        .route("/overdue", get(schedules::overdue_summary))
        .with_state(service)
}
