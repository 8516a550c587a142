use async_trait::async_trait;
use uuid::Uuid;

use shared_models::clinic::Appointment;

use crate::models::{CalendarError, CalendarEvent};

/// Narrow port to the external calendar/meeting integration. The appointment
/// lifecycle depends only on this contract; transport details stay behind it.
#[async_trait]
pub trait CalendarPort: Send + Sync {
    async fn create_event_with_meet_link(
        &self,
        appointment: &Appointment,
        acting_staff_id: Uuid,
    ) -> Result<CalendarEvent, CalendarError>;
}
