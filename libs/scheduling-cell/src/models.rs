// libs/scheduling-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Service not found")]
    ServiceNotFound,

    #[error("Daily booking limit reached for this service")]
    CapacityExceeded,

    #[error("Invalid calendar month: {0}")]
    InvalidMonth(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailabilityResponse {
    pub service_id: uuid::Uuid,
    pub date: NaiveDate,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthAvailabilityResponse {
    pub service_id: uuid::Uuid,
    pub year: i32,
    pub month: u32,
    pub available_dates: Vec<NaiveDate>,
}

/// Render a slot start time as the label patients see and appointments store,
/// e.g. "9:00 AM" or "1:30 PM".
pub fn slot_label(time: NaiveTime) -> String {
    let hour = time.hour();
    let (hour12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:{:02} {}", hour12, time.minute(), meridiem)
}

/// Full slot grid for one day: every start time from opening to closing,
/// stepped by the service's slot duration, where the slot still ends by
/// closing time.
pub fn slot_grid(opening: NaiveTime, closing: NaiveTime, step_minutes: u32) -> Vec<String> {
    if step_minutes == 0 {
        return Vec::new();
    }

    let open_min = opening.num_seconds_from_midnight() / 60;
    let close_min = closing.num_seconds_from_midnight() / 60;

    let mut slots = Vec::new();
    let mut start = open_min;
    while start + step_minutes <= close_min {
        let time = NaiveTime::from_hms_opt(start / 60, start % 60, 0)
            .expect("start stays within the day");
        slots.push(slot_label(time));
        start += step_minutes;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn labels_follow_clinic_convention() {
        assert_eq!(slot_label(t(9, 0)), "9:00 AM");
        assert_eq!(slot_label(t(12, 0)), "12:00 PM");
        assert_eq!(slot_label(t(13, 30)), "1:30 PM");
        assert_eq!(slot_label(t(0, 15)), "12:15 AM");
    }

    #[test]
    fn thirty_minute_grid_over_business_hours_has_sixteen_slots() {
        let grid = slot_grid(t(9, 0), t(17, 0), 30);
        assert_eq!(grid.len(), 16);
        assert_eq!(grid.first().unwrap(), "9:00 AM");
        assert_eq!(grid.last().unwrap(), "4:30 PM");
    }

    #[test]
    fn slot_must_end_by_closing_time() {
        // 45-minute slots in an 9:00-17:00 window: the 16:30 start would run past close.
        let grid = slot_grid(t(9, 0), t(17, 0), 45);
        assert_eq!(grid.last().unwrap(), "3:45 PM");
    }

    #[test]
    fn zero_duration_yields_no_slots() {
        assert!(slot_grid(t(9, 0), t(17, 0), 0).is_empty());
    }
}
