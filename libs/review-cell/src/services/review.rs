// libs/review-cell/src/services/review.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::clinic::Review;

use crate::models::{ReviewError, SubmitOutcome, SubmitReviewRequest};
use crate::services::coupon::CouponService;

/// Token-gated review submission: consuming the token, recording the review
/// and minting the coupon commit together.
pub struct ReviewService {
    store: Arc<ClinicStore>,
    grace_minutes: i64,
}

impl ReviewService {
    pub fn new(store: Arc<ClinicStore>, grace_minutes: i64) -> Self {
        Self {
            store,
            grace_minutes,
        }
    }

    pub fn submit(
        &self,
        token: &str,
        request: SubmitReviewRequest,
    ) -> Result<SubmitOutcome, ReviewError> {
        self.submit_at(token, request, Utc::now())
    }

    pub fn submit_at(
        &self,
        token: &str,
        request: SubmitReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, ReviewError> {
        validate_request(&request)?;

        let stored = self
            .store
            .find_review_token(token)
            .ok_or(ReviewError::InvalidToken)?;
        let appointment = self
            .store
            .get_appointment(stored.appointment_id)
            .ok_or(ReviewError::AppointmentNotFound)?;

        let coupons = CouponService::new(Arc::clone(&self.store));

        // Coupon code generation can collide with a code minted between our
        // check and the commit; retry with a fresh code.
        for _ in 0..3 {
            let review = Review {
                id: Uuid::new_v4(),
                appointment_id: appointment.id,
                patient_id: appointment.patient_id,
                service_id: appointment.service_id,
                staff_id: stored.staff_id,
                token: token.to_string(),
                rating: request.rating,
                comment: request.comment.clone(),
                reviewer_name: request.reviewer_name.clone(),
                is_approved: false,
                is_public: true,
                created_at: now,
            };
            let coupon = coupons.mint_for_review(review.id, appointment.customer_type, now);

            let result = self.store.consume_token_and_record_review(
                token,
                |t| {
                    if t.is_used {
                        Err(StoreError::TokenUsed)
                    } else if now >= t.expires_at {
                        Err(StoreError::TokenExpired)
                    } else {
                        Ok(())
                    }
                },
                review.clone(),
                coupon.clone(),
            );

            match result {
                Ok(()) => {
                    info!(
                        "Review {} recorded for appointment {} (coupon: {})",
                        review.id,
                        appointment.id,
                        coupon.as_ref().map(|c| c.code.as_str()).unwrap_or("none")
                    );
                    return Ok(SubmitOutcome::Created { review, coupon });
                }
                Err(StoreError::TokenUsed) => return self.duplicate_outcome(token, now),
                Err(StoreError::TokenExpired) => return Err(ReviewError::ExpiredToken),
                Err(StoreError::NotFound) => return Err(ReviewError::InvalidToken),
                Err(StoreError::DuplicateCode) => {
                    warn!("Coupon code collision during submission, regenerating");
                    continue;
                }
                Err(e) => return Err(ReviewError::Internal(e.to_string())),
            }
        }

        Err(ReviewError::Internal(
            "could not generate a unique coupon code".to_string(),
        ))
    }

    /// A second submission racing or refreshing within the grace window is
    /// reported as a duplicate, not an error; outside it, the token is spent.
    fn duplicate_outcome(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, ReviewError> {
        match self.store.find_review_by_token(token) {
            Some(review) if now - review.created_at <= Duration::minutes(self.grace_minutes) => {
                Ok(SubmitOutcome::Duplicate { review })
            }
            _ => Err(ReviewError::UsedToken),
        }
    }
}

fn validate_request(request: &SubmitReviewRequest) -> Result<(), ReviewError> {
    if !(1..=5).contains(&request.rating) {
        return Err(ReviewError::ValidationError(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    if request.reviewer_name.trim().is_empty() {
        return Err(ReviewError::ValidationError(
            "Reviewer name is required".to_string(),
        ));
    }
    Ok(())
}
