// libs/shared/database/src/store.rs
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use shared_models::clinic::{
    Appointment, Patient, QuotaRecord, Review, RewardCoupon, ReviewToken, Service,
    ServiceRecommendation,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("daily quota exhausted")]
    QuotaFull,

    #[error("time slot already booked")]
    SlotTaken,

    #[error("record not found")]
    NotFound,

    #[error("code already exists")]
    DuplicateCode,

    #[error("review token already used")]
    TokenUsed,

    #[error("review token expired")]
    TokenExpired,

    #[error("coupon already redeemed")]
    AlreadyRedeemed,
}

/// Shared store backing every cell. All tables sit behind their own lock and
/// the conditional operations below run entirely inside one critical section,
/// which is what makes admission control and status CAS safe under
/// horizontally-concurrent callers.
///
/// Locks are plain `std::sync` and are never held across an await point.
/// Compound operations take locks in a fixed order (tokens, reviews, coupons).
pub struct ClinicStore {
    services: RwLock<HashMap<Uuid, Service>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
    quotas: Mutex<HashMap<(Uuid, NaiveDate), QuotaRecord>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    // Keyed by appointment id: a review token is 1:1 with its appointment.
    review_tokens: Mutex<HashMap<Uuid, ReviewToken>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
    coupons: Mutex<HashMap<Uuid, RewardCoupon>>,
    recommendations: RwLock<HashMap<Uuid, ServiceRecommendation>>,
}

impl ClinicStore {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            patients: RwLock::new(HashMap::new()),
            quotas: Mutex::new(HashMap::new()),
            appointments: RwLock::new(HashMap::new()),
            review_tokens: Mutex::new(HashMap::new()),
            reviews: RwLock::new(HashMap::new()),
            coupons: Mutex::new(HashMap::new()),
            recommendations: RwLock::new(HashMap::new()),
        }
    }

    // ==========================================================================
    // REFERENCE DATA
    // ==========================================================================

    pub fn upsert_service(&self, service: Service) {
        self.services.write().unwrap().insert(service.id, service);
    }

    pub fn get_service(&self, service_id: Uuid) -> Option<Service> {
        self.services.read().unwrap().get(&service_id).cloned()
    }

    pub fn upsert_patient(&self, patient: Patient) {
        self.patients.write().unwrap().insert(patient.id, patient);
    }

    pub fn get_patient(&self, patient_id: Uuid) -> Option<Patient> {
        self.patients.read().unwrap().get(&patient_id).cloned()
    }

    // ==========================================================================
    // QUOTA LEDGER
    // ==========================================================================

    /// Conditionally increment the booking counter for (service, date),
    /// creating the record with count 1 when absent. The read-compare-write
    /// runs under one lock so N racing callers serialize here.
    pub fn try_reserve_quota(
        &self,
        service_id: Uuid,
        date: NaiveDate,
        max_quota: u32,
    ) -> Result<u32, StoreError> {
        let mut quotas = self.quotas.lock().unwrap();
        let record = quotas.entry((service_id, date)).or_insert(QuotaRecord {
            service_id,
            date,
            booked_count: 0,
            max_quota,
        });

        if record.is_full() {
            return Err(StoreError::QuotaFull);
        }

        record.booked_count += 1;
        Ok(record.booked_count)
    }

    /// Decrement the booking counter, floored at zero. A release for a day
    /// that never reserved is a no-op.
    pub fn release_quota(&self, service_id: Uuid, date: NaiveDate) -> u32 {
        let mut quotas = self.quotas.lock().unwrap();
        match quotas.get_mut(&(service_id, date)) {
            Some(record) => {
                record.booked_count = record.booked_count.saturating_sub(1);
                record.booked_count
            }
            None => 0,
        }
    }

    pub fn get_quota(&self, service_id: Uuid, date: NaiveDate) -> Option<QuotaRecord> {
        self.quotas
            .lock()
            .unwrap()
            .get(&(service_id, date))
            .cloned()
    }

    // ==========================================================================
    // APPOINTMENTS
    // ==========================================================================

    /// Insert a new appointment, enforcing uniqueness of
    /// (service, date, time slot) among non-cancelled appointments. The scan
    /// and the insert happen under the same write lock.
    pub fn insert_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut appointments = self.appointments.write().unwrap();

        let slot_taken = appointments.values().any(|existing| {
            existing.service_id == appointment.service_id
                && existing.date == appointment.date
                && existing.time_slot == appointment.time_slot
                && existing.occupies_slot()
        });
        if slot_taken {
            return Err(StoreError::SlotTaken);
        }

        debug!(
            "Storing appointment {} for {} slot {}",
            appointment.id, appointment.date, appointment.time_slot
        );
        appointments.insert(appointment.id, appointment);
        Ok(())
    }

    pub fn get_appointment(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.appointments
            .read()
            .unwrap()
            .get(&appointment_id)
            .cloned()
    }

    /// Run a mutation against one appointment under the write lock. Status
    /// guards inside the closure therefore have compare-and-swap semantics:
    /// two racing transitions observe each other's committed status.
    pub fn update_appointment<R>(
        &self,
        appointment_id: Uuid,
        f: impl FnOnce(&mut Appointment) -> R,
    ) -> Result<R, StoreError> {
        let mut appointments = self.appointments.write().unwrap();
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(StoreError::NotFound)?;
        Ok(f(appointment))
    }

    pub fn appointments_for_day(&self, service_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        self.appointments
            .read()
            .unwrap()
            .values()
            .filter(|a| a.service_id == service_id && a.date == date)
            .cloned()
            .collect()
    }

    pub fn appointments_for_patient(&self, patient_id: Uuid) -> Vec<Appointment> {
        let mut result: Vec<Appointment> = self
            .appointments
            .read()
            .unwrap()
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| (a.date, &a.time_slot).cmp(&(b.date, &b.time_slot)));
        result
    }

    // ==========================================================================
    // REVIEW TOKENS
    // ==========================================================================

    /// Mutate the single token slot of one appointment while holding the token
    /// table lock, making issue-or-reuse decisions atomic.
    pub fn with_token_slot<R>(
        &self,
        appointment_id: Uuid,
        f: impl FnOnce(&mut Option<ReviewToken>) -> R,
    ) -> R {
        let mut tokens = self.review_tokens.lock().unwrap();
        let mut slot = tokens.remove(&appointment_id);
        let result = f(&mut slot);
        if let Some(token) = slot {
            tokens.insert(appointment_id, token);
        }
        result
    }

    pub fn find_review_token(&self, token: &str) -> Option<ReviewToken> {
        self.review_tokens
            .lock()
            .unwrap()
            .values()
            .find(|t| t.token == token)
            .cloned()
    }

    pub fn review_token_exists(&self, token: &str) -> bool {
        self.review_tokens
            .lock()
            .unwrap()
            .values()
            .any(|t| t.token == token)
    }

    // ==========================================================================
    // REVIEWS & COUPONS
    // ==========================================================================

    /// Exactly-once review submission: re-validates and consumes the token,
    /// records the review, and mints the coupon inside one critical section.
    /// `validate` sees the current token state and decides whether to proceed.
    pub fn consume_token_and_record_review(
        &self,
        token: &str,
        validate: impl FnOnce(&ReviewToken) -> Result<(), StoreError>,
        review: Review,
        coupon: Option<RewardCoupon>,
    ) -> Result<(), StoreError> {
        let mut tokens = self.review_tokens.lock().unwrap();
        let mut reviews = self.reviews.write().unwrap();
        let mut coupons = self.coupons.lock().unwrap();

        let stored = tokens
            .values_mut()
            .find(|t| t.token == token)
            .ok_or(StoreError::NotFound)?;
        validate(stored)?;

        if let Some(ref coupon) = coupon {
            if coupons.values().any(|c| c.code == coupon.code) {
                return Err(StoreError::DuplicateCode);
            }
        }

        stored.is_used = true;
        reviews.insert(review.id, review);
        if let Some(coupon) = coupon {
            coupons.insert(coupon.id, coupon);
        }
        Ok(())
    }

    pub fn get_review(&self, review_id: Uuid) -> Option<Review> {
        self.reviews.read().unwrap().get(&review_id).cloned()
    }

    pub fn find_review_by_token(&self, token: &str) -> Option<Review> {
        self.reviews
            .read()
            .unwrap()
            .values()
            .find(|r| r.token == token)
            .cloned()
    }

    pub fn get_coupon(&self, coupon_id: Uuid) -> Option<RewardCoupon> {
        self.coupons.lock().unwrap().get(&coupon_id).cloned()
    }

    pub fn find_coupon_by_code(&self, code: &str) -> Option<RewardCoupon> {
        self.coupons
            .lock()
            .unwrap()
            .values()
            .find(|c| c.code == code)
            .cloned()
    }

    pub fn coupon_code_exists(&self, code: &str) -> bool {
        self.coupons.lock().unwrap().values().any(|c| c.code == code)
    }

    /// Flip `is_redeemed` exactly once; the check and the write share the lock.
    pub fn redeem_coupon(
        &self,
        coupon_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RewardCoupon, StoreError> {
        let mut coupons = self.coupons.lock().unwrap();
        let coupon = coupons.get_mut(&coupon_id).ok_or(StoreError::NotFound)?;

        if coupon.is_redeemed {
            return Err(StoreError::AlreadyRedeemed);
        }

        coupon.is_redeemed = true;
        coupon.redeemed_at = Some(now);
        Ok(coupon.clone())
    }

    // ==========================================================================
    // RECOMMENDATIONS
    // ==========================================================================

    pub fn insert_recommendation(&self, recommendation: ServiceRecommendation) {
        self.recommendations
            .write()
            .unwrap()
            .insert(recommendation.id, recommendation);
    }

    pub fn recommendations_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Vec<ServiceRecommendation> {
        self.recommendations
            .read()
            .unwrap()
            .values()
            .filter(|r| r.appointment_id == appointment_id)
            .cloned()
            .collect()
    }
}

impl Default for ClinicStore {
    fn default() -> Self {
        Self::new()
    }
}
