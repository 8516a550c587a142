// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::SchedulingCell;

/// Availability reads are public: patients browse open slots before they
/// authenticate.
pub fn scheduling_routes(cell: Arc<SchedulingCell>) -> Router {
    Router::new()
        .route("/{service_id}/day", get(handlers::get_day_availability))
        .route("/{service_id}/month", get(handlers::get_month_availability))
        .with_state(cell)
}
