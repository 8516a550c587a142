// libs/appointment-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::clinic::{Appointment, AppointmentStatus, ConsultationType, CustomerType};

use scheduling_cell::models::SchedulingError;

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub consultation: ConsultationType,
    pub customer_type: Option<CustomerType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub treatment_report: String,
    pub attending_staff_id: Option<Uuid>,
    pub attending_staff_name: Option<String>,
    pub follow_up: Option<FollowUpRequest>,
}

/// Optional follow-up service suggested at completion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub service_id: Uuid,
    pub recommended_date: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

/// Completion returns the appointment plus the review token minted (or
/// reused) for it, which staff hand to the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedAppointment {
    pub appointment: Appointment,
    pub review_token: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Daily booking limit reached for this service")]
    CapacityExceeded,

    #[error("This slot was just taken")]
    SlotTaken,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Staff capability required")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SchedulingError> for AppointmentError {
    fn from(e: SchedulingError) -> Self {
        match e {
            SchedulingError::ServiceNotFound => AppointmentError::ServiceNotFound,
            SchedulingError::CapacityExceeded => AppointmentError::CapacityExceeded,
            SchedulingError::InvalidMonth(m) => {
                AppointmentError::ValidationError(format!("Invalid calendar month: {}", m))
            }
        }
    }
}
