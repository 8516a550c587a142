// libs/scheduling-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::ClinicConfig;
use shared_database::ClinicStore;

use crate::models::{slot_grid, SchedulingError};

/// Derives bookable slots for a day and bookable days for a month.
///
/// All comparisons are on civil dates (year-month-day). Converting to an
/// instant and back shifts the visible day near midnight in non-UTC locales,
/// so no `DateTime` ever enters these calculations.
pub struct AvailabilityService {
    store: Arc<ClinicStore>,
    clinic: ClinicConfig,
}

impl AvailabilityService {
    pub fn new(store: Arc<ClinicStore>, clinic: ClinicConfig) -> Self {
        Self { store, clinic }
    }

    /// Free slot labels for (service, date), in grid order.
    pub fn day_slots(&self, service_id: Uuid, date: NaiveDate) -> Result<Vec<String>, SchedulingError> {
        self.day_slots_on(service_id, date, Utc::now().date_naive())
    }

    /// As `day_slots`, with "today" passed explicitly so callers and tests
    /// stay deterministic.
    pub fn day_slots_on(
        &self,
        service_id: Uuid,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<String>, SchedulingError> {
        let service = self
            .store
            .get_service(service_id)
            .ok_or(SchedulingError::ServiceNotFound)?;

        if date < today {
            return Ok(Vec::new());
        }
        if date.weekday() == self.clinic.closed_weekday {
            return Ok(Vec::new());
        }

        // Daily quota is a hard ceiling: a full day has zero slots no matter
        // which individual labels are still unoccupied.
        if let Some(quota) = self.store.get_quota(service_id, date) {
            if quota.is_full() {
                debug!(
                    "Service {} is fully booked on {} ({} of {})",
                    service_id, date, quota.booked_count, quota.max_quota
                );
                return Ok(Vec::new());
            }
        }

        let taken: HashSet<String> = self
            .store
            .appointments_for_day(service_id, date)
            .into_iter()
            .filter(|a| a.occupies_slot())
            .map(|a| a.time_slot)
            .collect();

        let slots = slot_grid(
            self.clinic.opening_time,
            self.clinic.closing_time,
            service.slot_duration_minutes,
        )
        .into_iter()
        .filter(|label| !taken.contains(label))
        .collect();

        Ok(slots)
    }

    /// Dates in (year, month) with at least one free slot, ascending.
    pub fn month_availability(
        &self,
        service_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<NaiveDate>, SchedulingError> {
        self.month_availability_on(service_id, year, month, Utc::now().date_naive())
    }

    pub fn month_availability_on(
        &self,
        service_id: Uuid,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SchedulingError> {
        if !(1..=12).contains(&month) {
            return Err(SchedulingError::InvalidMonth(month));
        }

        let mut available = Vec::new();
        for day in 1..=31 {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                break;
            };
            if !self.day_slots_on(service_id, date, today)?.is_empty() {
                available.push(date);
            }
        }

        debug!(
            "Service {} has {} bookable dates in {}-{:02}",
            service_id,
            available.len(),
            year,
            month
        );
        Ok(available)
    }
}
