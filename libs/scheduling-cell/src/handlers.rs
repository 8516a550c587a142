// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{DayAvailabilityResponse, MonthAvailabilityResponse, SchedulingError};
use crate::SchedulingCell;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

fn map_scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::ServiceNotFound => AppError::NotFound("Service not found".to_string()),
        SchedulingError::CapacityExceeded => {
            AppError::Conflict("Daily booking limit reached for this service".to_string())
        }
        SchedulingError::InvalidMonth(month) => {
            AppError::BadRequest(format!("Invalid calendar month: {}", month))
        }
    }
}

#[axum::debug_handler]
pub async fn get_day_availability(
    State(cell): State<Arc<SchedulingCell>>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = cell
        .availability
        .day_slots(service_id, query.date)
        .map_err(map_scheduling_error)?;

    Ok(Json(json!(DayAvailabilityResponse {
        service_id,
        date: query.date,
        slots,
    })))
}

#[axum::debug_handler]
pub async fn get_month_availability(
    State(cell): State<Arc<SchedulingCell>>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Value>, AppError> {
    let available_dates = cell
        .availability
        .month_availability(service_id, query.year, query.month)
        .map_err(map_scheduling_error)?;

    Ok(Json(json!(MonthAvailabilityResponse {
        service_id,
        year: query.year,
        month: query.month,
        available_dates,
    })))
}
