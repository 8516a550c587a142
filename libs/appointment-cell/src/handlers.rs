// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Caller;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, BookAppointmentRequest, CancelAppointmentRequest, CompleteAppointmentRequest,
};
use crate::AppointmentCell;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AppointmentError::ServiceNotFound => AppError::NotFound("Service not found".to_string()),
        AppointmentError::CapacityExceeded => {
            AppError::Conflict("Daily booking limit reached for this service".to_string())
        }
        AppointmentError::SlotTaken => {
            AppError::Conflict("This slot was just taken by another booking".to_string())
        }
        AppointmentError::InvalidStatusTransition(status) => AppError::Conflict(format!(
            "Appointment cannot be modified in current status: {}",
            status
        )),
        AppointmentError::Unauthorized => {
            AppError::Forbidden("You cannot act on this appointment".to_string())
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::ExternalServiceError(msg) => AppError::ExternalService(msg),
        AppointmentError::Internal(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .book(request, &caller)
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .get(appointment_id)
        .map_err(map_appointment_error)?;

    if !caller.is_staff() && caller.id != appointment.patient_id {
        return Err(AppError::Forbidden(
            "You cannot view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

/// Staff day sheet for one service.
#[axum::debug_handler]
pub async fn list_day_appointments(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = cell
        .booking
        .list_for_day(service_id, query.date, &caller)
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = cell
        .booking
        .list_for_patient(patient_id, &caller)
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .confirm(appointment_id, &caller)
        .await
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointment)))
}

/// Retry path for a confirmation whose calendar event never materialized.
#[axum::debug_handler]
pub async fn create_calendar_event(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .create_calendar_event(appointment_id, &caller)
        .await
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let completed = cell
        .booking
        .complete(appointment_id, request, &caller)
        .map_err(map_appointment_error)?;
    Ok(Json(json!(completed)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .cancel(appointment_id, request, &caller)
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn mark_no_show(
    State(cell): State<Arc<AppointmentCell>>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = cell
        .booking
        .mark_no_show(appointment_id, &caller)
        .map_err(map_appointment_error)?;
    Ok(Json(json!(appointment)))
}
