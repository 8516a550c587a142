// libs/scheduling-cell/src/services/quota.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};

use crate::models::SchedulingError;

/// Admission-control counter per (service, date). Reservation is a single
/// conditional increment in the store; a read-then-write here would let
/// racing bookings slip past the daily maximum.
pub struct QuotaLedger {
    store: Arc<ClinicStore>,
}

impl QuotaLedger {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Reserve one booking for (service, date). Returns the new booked count.
    /// The quota record is created on first reservation, copying the
    /// service's daily maximum at that point.
    pub fn try_reserve(
        &self,
        service_id: Uuid,
        date: NaiveDate,
    ) -> Result<u32, SchedulingError> {
        let service = self
            .store
            .get_service(service_id)
            .ok_or(SchedulingError::ServiceNotFound)?;

        match self
            .store
            .try_reserve_quota(service_id, date, service.daily_quota)
        {
            Ok(count) => {
                debug!(
                    "Reserved quota for service {} on {}: {}/{}",
                    service_id, date, count, service.daily_quota
                );
                Ok(count)
            }
            Err(StoreError::QuotaFull) => {
                info!(
                    "Quota exhausted for service {} on {} (max {})",
                    service_id, date, service.daily_quota
                );
                Err(SchedulingError::CapacityExceeded)
            }
            Err(_) => Err(SchedulingError::ServiceNotFound),
        }
    }

    /// Give back one reservation, e.g. when the owning appointment is
    /// cancelled before completion. Floored at zero.
    pub fn release(&self, service_id: Uuid, date: NaiveDate) -> u32 {
        let remaining = self.store.release_quota(service_id, date);
        debug!(
            "Released quota for service {} on {}: {} still booked",
            service_id, date, remaining
        );
        remaining
    }
}
