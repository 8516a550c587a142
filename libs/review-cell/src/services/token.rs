// libs/review-cell/src/services/token.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::clinic::{AppointmentStatus, ReviewToken};

use crate::models::{ReviewContext, ReviewError, TokenResolution};

const TOKEN_LENGTH: usize = 32;

/// Mints and validates the single-use credentials gating review submission.
/// One token per completed appointment, expiring after the configured TTL.
pub struct ReviewTokenService {
    store: Arc<ClinicStore>,
    ttl_days: i64,
    grace_minutes: i64,
}

impl ReviewTokenService {
    pub fn new(store: Arc<ClinicStore>, ttl_days: i64) -> Self {
        Self {
            store,
            ttl_days,
            grace_minutes: 5,
        }
    }

    pub fn with_grace_minutes(mut self, grace_minutes: i64) -> Self {
        self.grace_minutes = grace_minutes;
        self
    }

    pub fn issue_or_reuse(&self, appointment_id: Uuid) -> Result<ReviewToken, ReviewError> {
        self.issue_or_reuse_at(appointment_id, Utc::now())
    }

    /// Issue a token for a completed appointment, or hand back the existing
    /// one. Unused and unexpired: returned unchanged. Expired: replaced with
    /// a fresh mint. Used: the review already happened.
    pub fn issue_or_reuse_at(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReviewToken, ReviewError> {
        let appointment = self
            .store
            .get_appointment(appointment_id)
            .ok_or(ReviewError::AppointmentNotFound)?;

        if appointment.status != AppointmentStatus::Completed {
            return Err(ReviewError::NotCompleted);
        }

        let staff_id = appointment
            .attending_staff
            .as_ref()
            .and_then(|s| s.staff_id());

        // Generated before taking the token-slot lock; uniqueness across
        // appointments is checked here, uniqueness per appointment is
        // guaranteed by the slot keying.
        let candidate = self.generate_token_string();
        let fresh = ReviewToken {
            token: candidate,
            appointment_id,
            service_id: appointment.service_id,
            staff_id,
            issued_at: now,
            expires_at: now + Duration::days(self.ttl_days),
            is_used: false,
        };

        self.store.with_token_slot(appointment_id, move |slot| {
            match slot {
                Some(existing) if existing.is_used => Err(ReviewError::AlreadySubmitted),
                Some(existing) if !existing.is_expired_at(now) => {
                    debug!("Reusing review token for appointment {}", appointment_id);
                    Ok(existing.clone())
                }
                _ => {
                    info!("Issuing review token for appointment {}", appointment_id);
                    *slot = Some(fresh.clone());
                    Ok(fresh)
                }
            }
        })
    }

    pub fn resolve(&self, token: &str) -> Result<TokenResolution, ReviewError> {
        self.resolve_at(token, Utc::now())
    }

    /// Validate a token for the submission page. A used token still resolves
    /// to the duplicate outcome while its review is inside the grace window.
    pub fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenResolution, ReviewError> {
        let stored = self
            .store
            .find_review_token(token)
            .ok_or(ReviewError::InvalidToken)?;

        if stored.is_used {
            return match self.store.find_review_by_token(token) {
                Some(review)
                    if now - review.created_at <= Duration::minutes(self.grace_minutes) =>
                {
                    Ok(TokenResolution::RecentlyUsedDuplicate)
                }
                _ => Err(ReviewError::UsedToken),
            };
        }

        if stored.is_expired_at(now) {
            return Err(ReviewError::ExpiredToken);
        }

        let appointment = self
            .store
            .get_appointment(stored.appointment_id)
            .ok_or(ReviewError::AppointmentNotFound)?;
        let service = self
            .store
            .get_service(appointment.service_id)
            .ok_or_else(|| ReviewError::Internal("service record missing".to_string()))?;
        let patient_name = self
            .store
            .get_patient(appointment.patient_id)
            .map(|p| p.full_name)
            .unwrap_or_default();

        Ok(TokenResolution::Valid {
            context: ReviewContext {
                appointment_id: appointment.id,
                patient_id: appointment.patient_id,
                patient_name,
                service_id: service.id,
                service_name: service.name,
                staff_id: stored.staff_id,
                date: appointment.date,
                time_slot: appointment.time_slot,
            },
        })
    }

    fn generate_token_string(&self) -> String {
        loop {
            let candidate: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(TOKEN_LENGTH)
                .map(char::from)
                .collect();
            if !self.store.review_token_exists(&candidate) {
                return candidate;
            }
        }
    }
}
