// libs/review-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Caller;
use shared_models::error::AppError;

use crate::models::{ReviewError, SubmitReviewRequest};
use crate::ReviewCell;

fn map_review_error(e: ReviewError) -> AppError {
    match e {
        ReviewError::AppointmentNotFound => AppError::NotFound("Appointment not found".to_string()),
        ReviewError::CouponNotFound => AppError::NotFound("Coupon not found".to_string()),
        ReviewError::InvalidToken => AppError::NotFound("Review token is invalid".to_string()),
        ReviewError::ExpiredToken => AppError::BadRequest("Review token has expired".to_string()),
        ReviewError::UsedToken => {
            AppError::Conflict("Review token was already used".to_string())
        }
        ReviewError::AlreadySubmitted => {
            AppError::Conflict("A review was already submitted for this appointment".to_string())
        }
        ReviewError::DuplicateRedemption => {
            AppError::Conflict("Coupon was already redeemed".to_string())
        }
        ReviewError::NotCompleted => {
            AppError::BadRequest("Appointment is not completed".to_string())
        }
        ReviewError::Unauthorized => {
            AppError::Forbidden("Staff capability required".to_string())
        }
        ReviewError::ValidationError(msg) => AppError::ValidationError(msg),
        ReviewError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Public: the token itself is the credential.
#[axum::debug_handler]
pub async fn resolve_token(
    State(cell): State<Arc<ReviewCell>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let resolution = cell.tokens.resolve(&token).map_err(map_review_error)?;
    Ok(Json(json!(resolution)))
}

/// Public: the token itself is the credential.
#[axum::debug_handler]
pub async fn submit_review(
    State(cell): State<Arc<ReviewCell>>,
    Path(token): Path<String>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = cell
        .reviews
        .submit(&token, request)
        .map_err(map_review_error)?;
    Ok(Json(json!(outcome)))
}

#[axum::debug_handler]
pub async fn redeem_coupon(
    State(cell): State<Arc<ReviewCell>>,
    Extension(caller): Extension<Caller>,
    Path(coupon_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let coupon = cell
        .coupons
        .redeem(coupon_id, &caller)
        .map_err(map_review_error)?;

    Ok(Json(json!({
        "success": true,
        "coupon": coupon,
    })))
}

#[axum::debug_handler]
pub async fn get_coupon_by_code(
    State(cell): State<Arc<ReviewCell>>,
    Extension(caller): Extension<Caller>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !caller.is_staff() {
        return Err(AppError::Forbidden("Staff capability required".to_string()));
    }

    let coupon = cell.coupons.find_by_code(&code).map_err(map_review_error)?;
    Ok(Json(json!(coupon)))
}
