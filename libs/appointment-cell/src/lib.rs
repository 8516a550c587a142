pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use calendar_cell::CalendarPort;
use shared_config::ClinicConfig;
use shared_database::ClinicStore;

use services::booking::BookingService;

/// Appointment cell wiring: booking plus the status lifecycle and its side
/// effects.
pub struct AppointmentCell {
    pub booking: BookingService,
}

impl AppointmentCell {
    pub fn new(
        store: Arc<ClinicStore>,
        clinic: ClinicConfig,
        calendar: Arc<dyn CalendarPort>,
    ) -> Self {
        Self {
            booking: BookingService::new(store, clinic, calendar),
        }
    }
}
