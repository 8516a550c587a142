// libs/calendar-cell/src/client.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::clinic::{Appointment, ConsultationType};

use crate::models::{CalendarError, CalendarEvent};
use crate::port::CalendarPort;

/// HTTP-backed implementation of the calendar port.
pub struct CalendarClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CreateEventResponse {
    event_id: String,
    meet_link: String,
}

impl CalendarClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.calendar_api_url.clone(),
            api_key: config.calendar_api_key.clone(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}

#[async_trait]
impl CalendarPort for CalendarClient {
    async fn create_event_with_meet_link(
        &self,
        appointment: &Appointment,
        acting_staff_id: Uuid,
    ) -> Result<CalendarEvent, CalendarError> {
        if !self.is_configured() {
            return Err(CalendarError::NotConfigured);
        }

        let attendee_email = match &appointment.consultation {
            ConsultationType::GoogleMeet { email } => Some(email.as_str()),
            _ => None,
        };

        let body = json!({
            "appointment_id": appointment.id,
            "date": appointment.date,
            "time_slot": appointment.time_slot,
            "attendee_email": attendee_email,
            "acting_staff_id": acting_staff_id,
            "request_meet_link": true,
        });

        let url = format!("{}/v1/events", self.base_url);
        debug!("Creating calendar event at {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Calendar API error ({}): {}", status, message);
            return Err(CalendarError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let event: CreateEventResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::MalformedResponse(e.to_string()))?;

        debug!(
            "Calendar event {} created for appointment {}",
            event.event_id, appointment.id
        );

        Ok(CalendarEvent {
            event_id: event.event_id,
            meet_link: event.meet_link,
        })
    }
}
