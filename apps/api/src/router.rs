use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentCell;
use calendar_cell::{CalendarClient, CalendarPort};
use review_cell::router::review_routes;
use review_cell::ReviewCell;
use scheduling_cell::router::scheduling_routes;
use scheduling_cell::SchedulingCell;
use shared_config::AppConfig;
use shared_database::ClinicStore;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    // One store shared by every cell; the cells only ever see Arc clones.
    let store = Arc::new(ClinicStore::new());
    let calendar: Arc<dyn CalendarPort> = Arc::new(CalendarClient::new(&config));

    let scheduling = Arc::new(SchedulingCell::new(
        Arc::clone(&store),
        config.clinic.clone(),
    ));
    let appointments = Arc::new(AppointmentCell::new(
        Arc::clone(&store),
        config.clinic.clone(),
        calendar,
    ));
    let reviews = Arc::new(ReviewCell::new(Arc::clone(&store), config.clinic.clone()));

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/availability", scheduling_routes(scheduling))
        .nest("/appointments", appointment_routes(appointments, config.clone()))
        .nest("/reviews", review_routes(reviews, config.clone()))
}
