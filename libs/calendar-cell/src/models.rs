use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a successful calendar event creation: the provider-side event id
/// and the meeting link handed to the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub event_id: String,
    pub meet_link: String,
}

#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    #[error("calendar integration is not configured")]
    NotConfigured,

    #[error("calendar provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("calendar request failed: {0}")]
    Transport(String),

    #[error("calendar response was malformed: {0}")]
    MalformedResponse(String),
}
