use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use scheduling_cell::models::SchedulingError;
use scheduling_cell::services::quota::QuotaLedger;
use shared_database::ClinicStore;
use shared_models::clinic::Service;

fn seed_service(store: &ClinicStore, daily_quota: u32) -> Uuid {
    let id = Uuid::new_v4();
    store.upsert_service(Service {
        id,
        name: "Physiotherapy".to_string(),
        slot_duration_minutes: 30,
        daily_quota,
        price_cents: 12_000,
    });
    id
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 10).unwrap()
}

#[test]
fn reservations_stop_exactly_at_the_daily_maximum() {
    let store = Arc::new(ClinicStore::new());
    let service_id = seed_service(&store, 3);
    let ledger = QuotaLedger::new(Arc::clone(&store));

    assert_eq!(ledger.try_reserve(service_id, day()), Ok(1));
    assert_eq!(ledger.try_reserve(service_id, day()), Ok(2));
    assert_eq!(ledger.try_reserve(service_id, day()), Ok(3));
    assert_matches!(
        ledger.try_reserve(service_id, day()),
        Err(SchedulingError::CapacityExceeded)
    );
}

#[test]
fn release_reopens_a_full_day() {
    let store = Arc::new(ClinicStore::new());
    let service_id = seed_service(&store, 1);
    let ledger = QuotaLedger::new(Arc::clone(&store));

    ledger.try_reserve(service_id, day()).unwrap();
    assert_matches!(
        ledger.try_reserve(service_id, day()),
        Err(SchedulingError::CapacityExceeded)
    );

    ledger.release(service_id, day());
    assert_eq!(ledger.try_reserve(service_id, day()), Ok(1));
}

#[test]
fn reserving_for_an_unknown_service_fails() {
    let store = Arc::new(ClinicStore::new());
    let ledger = QuotaLedger::new(store);

    assert_matches!(
        ledger.try_reserve(Uuid::new_v4(), day()),
        Err(SchedulingError::ServiceNotFound)
    );
}

#[test]
fn concurrent_reservations_admit_exactly_the_quota() {
    let store = Arc::new(ClinicStore::new());
    let service_id = seed_service(&store, 4);
    let ledger = Arc::new(QuotaLedger::new(Arc::clone(&store)));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || ledger.try_reserve(service_id, day()).is_ok())
        })
        .collect();

    let successes = handles.into_iter().map(|h| h.join().unwrap()).filter(|&ok| ok).count();

    assert_eq!(successes, 4);
    assert_eq!(store.get_quota(service_id, day()).unwrap().booked_count, 4);
}
