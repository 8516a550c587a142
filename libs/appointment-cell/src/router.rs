// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::AppointmentCell;

pub fn appointment_routes(cell: Arc<AppointmentCell>, config: Arc<AppConfig>) -> Router {
    // Every appointment operation carries a caller identity; the service
    // layer decides patient-self versus staff access per operation.
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/patient/{patient_id}", get(handlers::list_patient_appointments))
        .route("/service/{service_id}/day", get(handlers::list_day_appointments))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route(
            "/{appointment_id}/calendar-event",
            post(handlers::create_calendar_event),
        )
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/no-show", post(handlers::mark_no_show))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(cell)
}
