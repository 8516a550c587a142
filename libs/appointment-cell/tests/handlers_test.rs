// libs/appointment-cell/tests/handlers_test.rs
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentCell;
use calendar_cell::{CalendarError, CalendarEvent, CalendarPort};
use shared_config::{AppConfig, ClinicConfig};
use shared_database::ClinicStore;
use shared_models::clinic::{Appointment, Patient, Service};
use shared_utils::test_utils::{bearer, sign_test_token};

const SECRET: &str = "handler-test-secret";

struct StubCalendar;

#[async_trait]
impl CalendarPort for StubCalendar {
    async fn create_event_with_meet_link(
        &self,
        _appointment: &Appointment,
        _acting_staff_id: Uuid,
    ) -> Result<CalendarEvent, CalendarError> {
        Ok(CalendarEvent {
            event_id: "evt-1".to_string(),
            meet_link: "https://meet.google.com/abc-defg-hij".to_string(),
        })
    }
}

struct Fixture {
    router: axum::Router,
    service: Service,
    patient: Patient,
}

fn fixture() -> Fixture {
    let store = Arc::new(ClinicStore::new());
    let service = Service {
        id: Uuid::new_v4(),
        name: "Stem Cell Consultation".to_string(),
        slot_duration_minutes: 30,
        daily_quota: 4,
        price_cents: 150_000,
    };
    let patient = Patient {
        id: Uuid::new_v4(),
        full_name: "Ana Reyes".to_string(),
        phone: None,
    };
    store.upsert_service(service.clone());
    store.upsert_patient(patient.clone());

    let config = Arc::new(AppConfig {
        jwt_secret: SECRET.to_string(),
        calendar_api_url: String::new(),
        calendar_api_key: String::new(),
        clinic: ClinicConfig::default(),
    });
    let cell = Arc::new(AppointmentCell::new(
        store,
        config.clinic.clone(),
        Arc::new(StubCalendar),
    ));

    Fixture {
        router: appointment_routes(cell, config),
        service,
        patient,
    }
}

/// A future weekday the default clinic calendar accepts.
fn open_day() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(14);
    if date.weekday() == Weekday::Sun {
        date += Duration::days(1);
    }
    date
}

fn book_body(fx: &Fixture) -> Value {
    json!({
        "patient_id": fx.patient.id,
        "service_id": fx.service.id,
        "date": open_day(),
        "time_slot": "9:00 AM",
        "consultation": { "type": "in_person", "clinic_location": "Makati branch" },
        "customer_type": null,
    })
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn requests_without_a_bearer_token_are_rejected() {
    let fx = fixture();

    let request = post("/", None, book_body(&fx));
    let response = fx.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_staff_token_books_through_the_router() {
    let fx = fixture();
    let token = sign_test_token(Uuid::new_v4(), "staff", SECRET);

    let response = fx
        .router
        .clone()
        .oneshot(post("/", Some(&token), book_body(&fx)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let appointment: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(appointment["status"], "pending");
    assert_eq!(appointment["time_slot"], "9:00 AM");

    // The day sheet shows the booking.
    let uri = format!("/service/{}/day?date={}", fx.service.id, open_day());
    let response = fx
        .router
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let listed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn a_patient_token_cannot_drive_staff_transitions() {
    let fx = fixture();
    let staff = sign_test_token(Uuid::new_v4(), "staff", SECRET);
    let patient = sign_test_token(fx.patient.id, "patient", SECRET);

    let response = fx
        .router
        .clone()
        .oneshot(post("/", Some(&staff), book_body(&fx)))
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let appointment: Value = serde_json::from_slice(&bytes).unwrap();
    let id = appointment["id"].as_str().unwrap().to_string();

    let response = fx
        .router
        .oneshot(post(
            &format!("/{}/confirm", id),
            Some(&patient),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
