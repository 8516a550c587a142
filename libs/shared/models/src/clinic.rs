// libs/shared/models/src/clinic.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// REFERENCE DATA (read-only directory entities)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub slot_duration_minutes: u32,
    pub daily_quota: u32,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
}

// ==============================================================================
// QUOTA LEDGER
// ==============================================================================

/// Per (service, calendar date) booking counter. `max_quota` is copied from the
/// service at first use so later service edits never shrink an existing day
/// below its bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub booked_count: u32,
    pub max_quota: u32,
}

impl QuotaRecord {
    pub fn is_full(&self) -> bool {
        self.booked_count >= self.max_quota
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    // Civil date, never an instant. Comparing instants here shifts the visible
    // day near midnight in non-UTC locales.
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub balance_cents: i64,
    pub consultation: ConsultationType,
    pub customer_type: Option<CustomerType>,
    pub calendar_event_id: Option<String>,
    pub meet_link: Option<String>,
    pub treatment_report: Option<String>,
    pub cancellation_reason: Option<String>,
    pub attending_staff: Option<AttendingStaff>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether this appointment still holds its slot on the daily grid.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self.status, AppointmentStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// Consultation channel, each variant carrying only the contact fields it
/// needs. Required-field presence is validated at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsultationType {
    GoogleMeet { email: String },
    WhatsappCall { phone: String },
    InPerson { clinic_location: String },
    HomeVisit { address: HomeAddress },
}

impl ConsultationType {
    pub fn needs_meet_link(&self) -> bool {
        matches!(self, ConsultationType::GoogleMeet { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
}

/// Patient classification captured at booking time; drives the reward coupon
/// type minted after a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    PotentialCustomer,
    ExistingCustomer,
}

/// Who attended the visit: a known staff account or a free-text name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum AttendingStaff {
    StaffId(Uuid),
    Name(String),
}

impl AttendingStaff {
    pub fn staff_id(&self) -> Option<Uuid> {
        match self {
            AttendingStaff::StaffId(id) => Some(*id),
            AttendingStaff::Name(_) => None,
        }
    }
}

// ==============================================================================
// REVIEWS & REWARDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewToken {
    pub token: String,
    pub appointment_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
}

impl ReviewToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub token: String,
    pub rating: u8,
    pub comment: String,
    pub reviewer_name: String,
    pub is_approved: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    FreeStemcells,
    FreeItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardCoupon {
    pub id: Uuid,
    pub code: String,
    pub review_id: Uuid,
    pub coupon_type: CouponType,
    pub is_redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// FOLLOW-UP RECOMMENDATIONS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecommendation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub recommended_date: Option<NaiveDate>,
    pub staff_note: Option<String>,
    pub status: RecommendationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    Accepted,
    Declined,
}
