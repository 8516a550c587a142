// libs/review-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::clinic::{Review, RewardCoupon};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Appointment is not completed")]
    NotCompleted,

    #[error("A review was already submitted for this appointment")]
    AlreadySubmitted,

    #[error("Review token is invalid")]
    InvalidToken,

    #[error("Review token has expired")]
    ExpiredToken,

    #[error("Review token was already used")]
    UsedToken,

    #[error("Coupon not found")]
    CouponNotFound,

    #[error("Coupon was already redeemed")]
    DuplicateRedemption,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// What the patient-facing review page needs to render the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewContext {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub service_id: Uuid,
    pub service_name: String,
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time_slot: String,
}

/// Outcome of resolving a token. A token consumed moments ago resolves to
/// `RecentlyUsedDuplicate` instead of an error so a re-rendered submission
/// page does not show a false failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TokenResolution {
    Valid { context: ReviewContext },
    RecentlyUsedDuplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: u8,
    pub comment: String,
    pub reviewer_name: String,
}

/// Outcome of a submission. `Duplicate` means the token was consumed within
/// the grace window; the original review stands and no coupon is minted twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Created {
        review: Review,
        coupon: Option<RewardCoupon>,
    },
    Duplicate {
        review: Review,
    },
}
