pub mod client;
pub mod models;
pub mod port;

pub use client::CalendarClient;
pub use models::{CalendarError, CalendarEvent};
pub use port::CalendarPort;
