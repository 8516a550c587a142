// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use calendar_cell::CalendarPort;
use review_cell::services::token::ReviewTokenService;
use scheduling_cell::models::slot_grid;
use scheduling_cell::services::quota::QuotaLedger;
use shared_config::ClinicConfig;
use shared_database::{ClinicStore, StoreError};
use shared_models::auth::Caller;
use shared_models::clinic::{
    Appointment, AppointmentStatus, AttendingStaff, ConsultationType, PaymentStatus,
    RecommendationStatus, ServiceRecommendation,
};

use crate::models::{
    AppointmentError, BookAppointmentRequest, CancelAppointmentRequest,
    CompleteAppointmentRequest, CompletedAppointment,
};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Owns appointment creation and every status transition with its side
/// effects. Transitions re-check the current status under the store's write
/// lock, so two racing calls cannot both pass the same guard.
pub struct BookingService {
    store: Arc<ClinicStore>,
    quota: QuotaLedger,
    lifecycle: AppointmentLifecycleService,
    tokens: ReviewTokenService,
    calendar: Arc<dyn CalendarPort>,
    clinic: ClinicConfig,
}

impl BookingService {
    pub fn new(
        store: Arc<ClinicStore>,
        clinic: ClinicConfig,
        calendar: Arc<dyn CalendarPort>,
    ) -> Self {
        let quota = QuotaLedger::new(Arc::clone(&store));
        let tokens = ReviewTokenService::new(Arc::clone(&store), clinic.review_token_ttl_days)
            .with_grace_minutes(clinic.duplicate_submission_grace_minutes);

        Self {
            quota,
            lifecycle: AppointmentLifecycleService::new(),
            tokens,
            calendar,
            store,
            clinic,
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    pub fn book(
        &self,
        request: BookAppointmentRequest,
        caller: &Caller,
    ) -> Result<Appointment, AppointmentError> {
        self.book_on(request, caller, Utc::now().date_naive())
    }

    /// Admission-controlled booking. The quota reservation is the atomic
    /// gate; the slot-uniqueness check rides on the appointment insert. A
    /// reservation whose insert loses the slot race is released again.
    pub fn book_on(
        &self,
        request: BookAppointmentRequest,
        caller: &Caller,
        today: NaiveDate,
    ) -> Result<Appointment, AppointmentError> {
        // Patients book for themselves; staff book on behalf of anyone.
        if !caller.is_staff() && caller.id != request.patient_id {
            return Err(AppointmentError::Unauthorized);
        }

        let service = self
            .store
            .get_service(request.service_id)
            .ok_or(AppointmentError::ServiceNotFound)?;
        let patient = self
            .store
            .get_patient(request.patient_id)
            .ok_or(AppointmentError::PatientNotFound)?;

        validate_consultation(&request.consultation)?;
        self.validate_booking_date(request.date, today)?;

        let grid = slot_grid(
            self.clinic.opening_time,
            self.clinic.closing_time,
            service.slot_duration_minutes,
        );
        if !grid.contains(&request.time_slot) {
            return Err(AppointmentError::ValidationError(format!(
                "'{}' is not a bookable slot for this service",
                request.time_slot
            )));
        }

        self.quota.try_reserve(request.service_id, request.date)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            service_id: service.id,
            date: request.date,
            time_slot: request.time_slot,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            total_cents: service.price_cents,
            paid_cents: 0,
            balance_cents: service.price_cents,
            consultation: request.consultation,
            customer_type: request.customer_type,
            calendar_event_id: None,
            meet_link: None,
            treatment_report: None,
            cancellation_reason: None,
            attending_staff: None,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_appointment(appointment.clone()) {
            Ok(()) => {
                info!(
                    "Appointment {} booked for patient {} on {} at {}",
                    appointment.id, patient.id, appointment.date, appointment.time_slot
                );
                Ok(appointment)
            }
            Err(StoreError::SlotTaken) => {
                // Give the reservation back before reporting the race.
                self.quota.release(service.id, request.date);
                debug!(
                    "Slot {} on {} for service {} lost to a concurrent booking",
                    appointment.time_slot, appointment.date, service.id
                );
                Err(AppointmentError::SlotTaken)
            }
            Err(e) => Err(AppointmentError::Internal(e.to_string())),
        }
    }

    fn validate_booking_date(
        &self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<(), AppointmentError> {
        if date < today {
            return Err(AppointmentError::ValidationError(
                "Appointments cannot be booked for past dates".to_string(),
            ));
        }
        if date.weekday() == self.clinic.closed_weekday {
            return Err(AppointmentError::ValidationError(format!(
                "The clinic is closed on {}",
                self.clinic.closed_weekday
            )));
        }
        Ok(())
    }

    // ==========================================================================
    // STATUS TRANSITIONS
    // ==========================================================================

    /// Confirm a pending appointment. The calendar event with its meet link
    /// is best-effort and runs after the status commit, outside any lock:
    /// the confirmation stands even when the calendar provider is down.
    pub async fn confirm(
        &self,
        appointment_id: Uuid,
        caller: &Caller,
    ) -> Result<Appointment, AppointmentError> {
        require_staff(caller)?;

        let confirmed =
            self.apply_transition(appointment_id, AppointmentStatus::Confirmed, |_| {})?;

        if confirmed.consultation.needs_meet_link() && confirmed.meet_link.is_none() {
            match self
                .calendar
                .create_event_with_meet_link(&confirmed, caller.id)
                .await
            {
                Ok(event) => {
                    return self.attach_calendar_event(appointment_id, event.event_id, event.meet_link);
                }
                Err(e) => {
                    // Advisory side effect: staff retry later through the
                    // dedicated calendar-event operation.
                    warn!(
                        "Calendar event creation failed for appointment {}: {}",
                        appointment_id, e
                    );
                }
            }
        }

        Ok(confirmed)
    }

    /// Staff retry path for a confirmation that never got its meeting link.
    /// No-op success when a link already exists.
    pub async fn create_calendar_event(
        &self,
        appointment_id: Uuid,
        caller: &Caller,
    ) -> Result<Appointment, AppointmentError> {
        require_staff(caller)?;

        let appointment = self.get(appointment_id)?;

        if appointment.meet_link.is_some() {
            debug!(
                "Appointment {} already has a meet link, skipping",
                appointment_id
            );
            return Ok(appointment);
        }
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(AppointmentError::ValidationError(
                "Calendar events are only created for confirmed appointments".to_string(),
            ));
        }
        if !appointment.consultation.needs_meet_link() {
            return Err(AppointmentError::ValidationError(
                "This consultation type does not use a meeting link".to_string(),
            ));
        }

        let event = self
            .calendar
            .create_event_with_meet_link(&appointment, caller.id)
            .await
            .map_err(|e| AppointmentError::ExternalServiceError(e.to_string()))?;

        self.attach_calendar_event(appointment_id, event.event_id, event.meet_link)
    }

    /// Complete a visit: requires the treatment report and who attended.
    /// Side effects run after the status commit, in order: the optional
    /// follow-up recommendation, then the review token.
    pub fn complete(
        &self,
        appointment_id: Uuid,
        request: CompleteAppointmentRequest,
        caller: &Caller,
    ) -> Result<CompletedAppointment, AppointmentError> {
        require_staff(caller)?;

        if request.treatment_report.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "A treatment report is required to complete an appointment".to_string(),
            ));
        }
        let attending = match (request.attending_staff_id, &request.attending_staff_name) {
            (Some(id), _) => AttendingStaff::StaffId(id),
            (None, Some(name)) if !name.trim().is_empty() => {
                AttendingStaff::Name(name.trim().to_string())
            }
            _ => {
                return Err(AppointmentError::ValidationError(
                    "An attending staff member is required".to_string(),
                ))
            }
        };
        // Checked before the transition commits: a bad follow-up must not
        // leave the appointment Completed with no review token.
        if let Some(ref follow_up) = request.follow_up {
            if self.store.get_service(follow_up.service_id).is_none() {
                return Err(AppointmentError::ServiceNotFound);
            }
        }

        let completed =
            self.apply_transition(appointment_id, AppointmentStatus::Completed, |a| {
                a.treatment_report = Some(request.treatment_report.trim().to_string());
                a.attending_staff = Some(attending);
                a.completed_at = Some(Utc::now());
            })?;

        if let Some(follow_up) = request.follow_up {
            self.store.insert_recommendation(ServiceRecommendation {
                id: Uuid::new_v4(),
                appointment_id,
                patient_id: completed.patient_id,
                service_id: follow_up.service_id,
                recommended_date: follow_up.recommended_date,
                staff_note: follow_up.note,
                status: RecommendationStatus::Pending,
                created_at: Utc::now(),
            });
            info!("Follow-up recommendation recorded for appointment {}", appointment_id);
        }

        let token = self
            .tokens
            .issue_or_reuse(appointment_id)
            .map_err(|e| AppointmentError::Internal(e.to_string()))?;

        info!("Appointment {} completed by {}", appointment_id, caller.id);
        Ok(CompletedAppointment {
            appointment: completed,
            review_token: token.token,
        })
    }

    /// Cancel a pending or confirmed appointment and give its quota
    /// reservation back, so cancelled bookings stop counting against the day.
    pub fn cancel(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        caller: &Caller,
    ) -> Result<Appointment, AppointmentError> {
        require_staff(caller)?;

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "A cancellation reason is required".to_string(),
            ));
        }

        let cancelled =
            self.apply_transition(appointment_id, AppointmentStatus::Cancelled, |a| {
                a.cancellation_reason = Some(request.reason.trim().to_string());
                a.cancelled_at = Some(Utc::now());
            })?;

        // The CAS above admits exactly one cancellation, so this releases once.
        self.quota.release(cancelled.service_id, cancelled.date);

        info!(
            "Appointment {} cancelled by {}: {}",
            appointment_id,
            caller.id,
            cancelled.cancellation_reason.as_deref().unwrap_or_default()
        );
        Ok(cancelled)
    }

    /// The no-show day has already passed, so the quota reservation stays.
    pub fn mark_no_show(
        &self,
        appointment_id: Uuid,
        caller: &Caller,
    ) -> Result<Appointment, AppointmentError> {
        require_staff(caller)?;
        let updated = self.apply_transition(appointment_id, AppointmentStatus::NoShow, |_| {})?;
        info!("Appointment {} marked as no-show", appointment_id);
        Ok(updated)
    }

    // ==========================================================================
    // READS
    // ==========================================================================

    pub fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get_appointment(appointment_id)
            .ok_or(AppointmentError::NotFound)
    }

    /// Staff day sheet: every appointment for (service, date), in grid order.
    pub fn list_for_day(
        &self,
        service_id: Uuid,
        date: NaiveDate,
        caller: &Caller,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        require_staff(caller)?;
        let service = self
            .store
            .get_service(service_id)
            .ok_or(AppointmentError::ServiceNotFound)?;

        let grid = slot_grid(
            self.clinic.opening_time,
            self.clinic.closing_time,
            service.slot_duration_minutes,
        );
        let position = |slot: &str| grid.iter().position(|label| label == slot);

        let mut result = self.store.appointments_for_day(service_id, date);
        result.sort_by_key(|a| position(&a.time_slot).unwrap_or(usize::MAX));
        Ok(result)
    }

    pub fn list_for_patient(
        &self,
        patient_id: Uuid,
        caller: &Caller,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !caller.is_staff() && caller.id != patient_id {
            return Err(AppointmentError::Unauthorized);
        }
        Ok(self.store.appointments_for_patient(patient_id))
    }

    // ==========================================================================
    // INTERNALS
    // ==========================================================================

    /// Validate-and-apply under the appointment write lock; the guard and the
    /// write are one critical section.
    fn apply_transition(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        mutate: impl FnOnce(&mut Appointment),
    ) -> Result<Appointment, AppointmentError> {
        self.store
            .update_appointment(appointment_id, |appointment| {
                self.lifecycle
                    .validate_transition(appointment.status, new_status)?;
                mutate(appointment);
                appointment.status = new_status;
                appointment.updated_at = Utc::now();
                Ok(appointment.clone())
            })
            .map_err(|_| AppointmentError::NotFound)?
    }

    /// The link-missing check and this write are separate critical sections,
    /// so the slot is re-checked under the lock: whichever racing retry
    /// commits first wins, the other's event is discarded.
    fn attach_calendar_event(
        &self,
        appointment_id: Uuid,
        event_id: String,
        meet_link: String,
    ) -> Result<Appointment, AppointmentError> {
        self.store
            .update_appointment(appointment_id, |appointment| {
                if appointment.meet_link.is_none() {
                    appointment.calendar_event_id = Some(event_id);
                    appointment.meet_link = Some(meet_link);
                    appointment.updated_at = Utc::now();
                }
                appointment.clone()
            })
            .map_err(|_| AppointmentError::NotFound)
    }
}

fn require_staff(caller: &Caller) -> Result<(), AppointmentError> {
    if caller.is_staff() {
        Ok(())
    } else {
        Err(AppointmentError::Unauthorized)
    }
}

fn validate_consultation(consultation: &ConsultationType) -> Result<(), AppointmentError> {
    let missing = |what: &str| {
        Err(AppointmentError::ValidationError(format!(
            "{} is required for this consultation type",
            what
        )))
    };

    match consultation {
        ConsultationType::GoogleMeet { email } => {
            if email.trim().is_empty() || !email.contains('@') {
                return missing("A valid email address");
            }
        }
        ConsultationType::WhatsappCall { phone } => {
            if phone.trim().is_empty() {
                return missing("A phone number");
            }
        }
        ConsultationType::InPerson { clinic_location } => {
            if clinic_location.trim().is_empty() {
                return missing("A clinic location");
            }
        }
        ConsultationType::HomeVisit { address } => {
            if address.line1.trim().is_empty()
                || address.city.trim().is_empty()
                || address.postal_code.trim().is_empty()
            {
                return missing("A complete home address");
            }
        }
    }
    Ok(())
}
