use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use review_cell::models::{ReviewError, SubmitOutcome, SubmitReviewRequest, TokenResolution};
use review_cell::services::coupon::CouponService;
use review_cell::services::review::ReviewService;
use review_cell::services::token::ReviewTokenService;
use shared_database::ClinicStore;
use shared_models::auth::Caller;
use shared_models::clinic::{
    Appointment, AppointmentStatus, AttendingStaff, ConsultationType, CouponType, CustomerType,
    Patient, PaymentStatus, Service,
};

const TTL_DAYS: i64 = 30;
const GRACE_MINUTES: i64 = 5;

struct Fixture {
    store: Arc<ClinicStore>,
    tokens: ReviewTokenService,
    reviews: ReviewService,
    service_id: Uuid,
    patient_id: Uuid,
}

fn fixture() -> Fixture {
    let store = Arc::new(ClinicStore::new());

    let service_id = Uuid::new_v4();
    store.upsert_service(Service {
        id: service_id,
        name: "Stem Cell Therapy".to_string(),
        slot_duration_minutes: 30,
        daily_quota: 8,
        price_cents: 90_000,
    });

    let patient_id = Uuid::new_v4();
    store.upsert_patient(Patient {
        id: patient_id,
        full_name: "Ana Reyes".to_string(),
        phone: Some("+63 900 000 0000".to_string()),
    });

    let tokens = ReviewTokenService::new(Arc::clone(&store), TTL_DAYS)
        .with_grace_minutes(GRACE_MINUTES);
    let reviews = ReviewService::new(Arc::clone(&store), GRACE_MINUTES);

    Fixture {
        store,
        tokens,
        reviews,
        service_id,
        patient_id,
    }
}

impl Fixture {
    fn insert_appointment(
        &self,
        status: AppointmentStatus,
        customer_type: Option<CustomerType>,
        slot: &str,
    ) -> Uuid {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: self.patient_id,
            service_id: self.service_id,
            date: NaiveDate::from_ymd_opt(2030, 6, 10).unwrap(),
            time_slot: slot.to_string(),
            status,
            payment_status: PaymentStatus::Paid,
            total_cents: 90_000,
            paid_cents: 90_000,
            balance_cents: 0,
            consultation: ConsultationType::InPerson {
                clinic_location: "Main Clinic".to_string(),
            },
            customer_type,
            calendar_event_id: None,
            meet_link: None,
            treatment_report: Some("Session completed without complications".to_string()),
            cancellation_reason: None,
            attending_staff: Some(AttendingStaff::StaffId(Uuid::new_v4())),
            completed_at: Some(now),
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        let id = appointment.id;
        self.store.insert_appointment(appointment).unwrap();
        id
    }

    fn completed_appointment(&self, customer_type: Option<CustomerType>, slot: &str) -> Uuid {
        self.insert_appointment(AppointmentStatus::Completed, customer_type, slot)
    }
}

fn review_request() -> SubmitReviewRequest {
    SubmitReviewRequest {
        rating: 5,
        comment: "Wonderful care".to_string(),
        reviewer_name: "Ana R.".to_string(),
    }
}

// ==============================================================================
// TOKEN ISSUANCE
// ==============================================================================

#[test]
fn issuing_twice_returns_the_identical_token() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "9:00 AM");

    let first = fx.tokens.issue_or_reuse(appointment_id).unwrap();
    let second = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    assert_eq!(first.token, second.token);
    assert_eq!(first.token.len(), 32);
}

#[test]
fn tokens_only_exist_for_completed_appointments() {
    let fx = fixture();
    let pending = fx.insert_appointment(AppointmentStatus::Pending, None, "9:00 AM");

    assert_matches!(
        fx.tokens.issue_or_reuse(pending),
        Err(ReviewError::NotCompleted)
    );
    assert_matches!(
        fx.tokens.issue_or_reuse(Uuid::new_v4()),
        Err(ReviewError::AppointmentNotFound)
    );
}

#[test]
fn an_expired_token_is_replaced_by_a_fresh_mint() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "9:00 AM");

    let issued_long_ago = Utc::now() - Duration::days(TTL_DAYS + 1);
    let stale = fx
        .tokens
        .issue_or_reuse_at(appointment_id, issued_long_ago)
        .unwrap();

    let fresh = fx.tokens.issue_or_reuse(appointment_id).unwrap();
    assert_ne!(stale.token, fresh.token);
    assert!(!fresh.is_expired_at(Utc::now()));
}

#[test]
fn a_used_token_reports_already_submitted() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "9:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    fx.reviews.submit(&token.token, review_request()).unwrap();

    assert_matches!(
        fx.tokens.issue_or_reuse(appointment_id),
        Err(ReviewError::AlreadySubmitted)
    );
}

// ==============================================================================
// TOKEN RESOLUTION
// ==============================================================================

#[test]
fn resolve_returns_the_review_context() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "10:30 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    let resolution = fx.tokens.resolve(&token.token).unwrap();
    assert_matches!(resolution, TokenResolution::Valid { context } => {
        assert_eq!(context.appointment_id, appointment_id);
        assert_eq!(context.service_name, "Stem Cell Therapy");
        assert_eq!(context.patient_name, "Ana Reyes");
        assert_eq!(context.time_slot, "10:30 AM");
    });
}

#[test]
fn resolve_distinguishes_invalid_expired_and_used() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "9:00 AM");

    assert_matches!(
        fx.tokens.resolve("no-such-token"),
        Err(ReviewError::InvalidToken)
    );

    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();
    let past_expiry = token.expires_at + Duration::hours(1);
    assert_matches!(
        fx.tokens.resolve_at(&token.token, past_expiry),
        Err(ReviewError::ExpiredToken)
    );
}

#[test]
fn a_just_used_token_resolves_as_recently_used_duplicate() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "9:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();
    let submitted_at = Utc::now();

    fx.reviews
        .submit_at(&token.token, review_request(), submitted_at)
        .unwrap();

    // Within the grace window: the page refresh case.
    let resolution = fx
        .tokens
        .resolve_at(&token.token, submitted_at + Duration::minutes(2))
        .unwrap();
    assert_matches!(resolution, TokenResolution::RecentlyUsedDuplicate);

    // Outside the window the token is simply spent.
    assert_matches!(
        fx.tokens
            .resolve_at(&token.token, submitted_at + Duration::minutes(GRACE_MINUTES + 1)),
        Err(ReviewError::UsedToken)
    );
}

// ==============================================================================
// SUBMISSION & COUPON TYPING
// ==============================================================================

#[test]
fn potential_customer_reviews_mint_a_stemcell_coupon() {
    let fx = fixture();
    let appointment_id =
        fx.completed_appointment(Some(CustomerType::PotentialCustomer), "9:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    let outcome = fx.reviews.submit(&token.token, review_request()).unwrap();
    assert_matches!(outcome, SubmitOutcome::Created { review, coupon: Some(coupon) } => {
        assert_eq!(coupon.coupon_type, CouponType::FreeStemcells);
        assert_eq!(coupon.review_id, review.id);
        assert!(coupon.code.starts_with("SC-"));
        assert!(!review.is_approved);
    });
}

#[test]
fn existing_customer_reviews_mint_a_free_item_coupon() {
    let fx = fixture();
    let appointment_id =
        fx.completed_appointment(Some(CustomerType::ExistingCustomer), "9:30 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    let outcome = fx.reviews.submit(&token.token, review_request()).unwrap();
    assert_matches!(outcome, SubmitOutcome::Created { coupon: Some(coupon), .. } => {
        assert_eq!(coupon.coupon_type, CouponType::FreeItem);
    });
}

#[test]
fn unclassified_patients_get_no_coupon() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "10:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    let outcome = fx.reviews.submit(&token.token, review_request()).unwrap();
    assert_matches!(outcome, SubmitOutcome::Created { coupon: None, .. });
}

#[test]
fn a_token_buys_exactly_one_review() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(Some(CustomerType::PotentialCustomer), "9:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();
    let submitted_at = Utc::now();

    let first = fx
        .reviews
        .submit_at(&token.token, review_request(), submitted_at)
        .unwrap();
    let first_review_id = match first {
        SubmitOutcome::Created { ref review, .. } => review.id,
        _ => panic!("first submission must create the review"),
    };

    // A refresh inside the grace window reports the duplicate, not a new review.
    let duplicate = fx
        .reviews
        .submit_at(
            &token.token,
            review_request(),
            submitted_at + Duration::minutes(1),
        )
        .unwrap();
    assert_matches!(duplicate, SubmitOutcome::Duplicate { review } => {
        assert_eq!(review.id, first_review_id);
    });

    // A stale replay outside the window is a hard error.
    assert_matches!(
        fx.reviews.submit_at(
            &token.token,
            review_request(),
            submitted_at + Duration::minutes(GRACE_MINUTES + 1),
        ),
        Err(ReviewError::UsedToken)
    );
}

#[test]
fn submission_validates_rating_and_name() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(None, "9:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();

    let mut bad_rating = review_request();
    bad_rating.rating = 6;
    assert_matches!(
        fx.reviews.submit(&token.token, bad_rating),
        Err(ReviewError::ValidationError(_))
    );

    let mut no_name = review_request();
    no_name.reviewer_name = "  ".to_string();
    assert_matches!(
        fx.reviews.submit(&token.token, no_name),
        Err(ReviewError::ValidationError(_))
    );
}

// ==============================================================================
// COUPON REDEMPTION
// ==============================================================================

#[test]
fn a_coupon_redeems_exactly_once() {
    let fx = fixture();
    let appointment_id = fx.completed_appointment(Some(CustomerType::PotentialCustomer), "9:00 AM");
    let token = fx.tokens.issue_or_reuse(appointment_id).unwrap();
    let outcome = fx.reviews.submit(&token.token, review_request()).unwrap();
    let coupon = match outcome {
        SubmitOutcome::Created { coupon: Some(c), .. } => c,
        _ => panic!("expected a coupon"),
    };

    let coupons = CouponService::new(Arc::clone(&fx.store));
    let staff = Caller::staff(Uuid::new_v4());

    let redeemed = coupons.redeem(coupon.id, &staff).unwrap();
    assert!(redeemed.is_redeemed);
    assert!(redeemed.redeemed_at.is_some());

    assert_matches!(
        coupons.redeem(coupon.id, &staff),
        Err(ReviewError::DuplicateRedemption)
    );
}

#[test]
fn redemption_requires_staff_capability() {
    let fx = fixture();
    let coupons = CouponService::new(Arc::clone(&fx.store));
    let patient = Caller::patient(Uuid::new_v4());

    assert_matches!(
        coupons.redeem(Uuid::new_v4(), &patient),
        Err(ReviewError::Unauthorized)
    );
}
