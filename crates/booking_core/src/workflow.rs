//! crates/booking_core/src/workflow.rs
//!
//! The booking workflow controller: the one real state machine in the client.
//! It owns the [`BookingStore`], turns user selections into API calls, and
//! reconciles the local lists only after the server has confirmed a mutation.
//! Illegal transitions (confirming without a chosen type, double-submitting,
//! selecting a taken slot) are rejected here with user-facing errors instead of
//! being left to the presentation layer.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};

use crate::domain::{Appointment, SharedDocument, Slot, SLOT_DURATION_MINUTES};
use crate::ports::{BookingApi, NewAppointment, PortError};
use crate::store::{BookingStore, LoadStatus};

/// How many slots the slot list shows per page.
pub const SLOTS_PER_PAGE: usize = 8;

/// The life cycle of a single booking attempt.
///
/// `Booked` is transient: a successful submission passes through it and lands
/// back on `NoSelection` once the store has been refreshed. `SubmitFailed`
/// keeps the selection so the user can retry or close the modal.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    NoSelection,
    SlotSelected {
        slot: Slot,
    },
    TypeChosen {
        slot: Slot,
        appointment_type_id: i64,
    },
    Submitting {
        slot: Slot,
        appointment_type_id: i64,
    },
    Booked,
    SubmitFailed {
        slot: Slot,
        appointment_type_id: i64,
        message: String,
    },
}

/// Which modal, if any, is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    None,
    Booking,
    Profile,
}

/// The answer to the yes/no gate shown before cancelling an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The user answered no; nothing was sent.
    Dismissed,
}

/// User-facing rejections raised by the workflow controller.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Ce créneau n'est plus disponible.")]
    SlotTaken,
    #[error("Ce créneau n'existe plus. Veuillez actualiser la liste.")]
    StaleSlot(i64),
    #[error("Sélectionnez un créneau et un motif de rendez-vous !")]
    NoSlotSelected,
    #[error("Type de rendez-vous invalide.")]
    UnknownAppointmentType(i64),
    #[error("Une réservation est déjà en cours d'envoi.")]
    SubmissionInFlight,
    #[error("Rendez-vous introuvable.")]
    UnknownAppointment(i64),
    #[error("{}", .0.user_message())]
    Api(#[from] PortError),
}

/// Owns the store and the selection state machine.
pub struct BookingWorkflow {
    api: Arc<dyn BookingApi>,
    store: BookingStore,
    phase: Phase,
    modal: Modal,
    page: usize,
}

impl BookingWorkflow {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self {
            store: BookingStore::new(api.clone()),
            api,
            phase: Phase::NoSelection,
            modal: Modal::None,
            page: 0,
        }
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    //=====================================================================================
    // Refresh
    //=====================================================================================

    /// Refreshes the slot list, then re-checks the current selection against
    /// the new snapshot: availability can change between fetch and user action.
    pub async fn refresh_slots(&mut self, range: Option<(NaiveDate, NaiveDate)>) -> LoadStatus {
        let status = self.store.load_slots(range).await;
        self.revalidate_selection();
        self.clamp_page();
        status
    }

    pub async fn refresh_appointments(&mut self) -> LoadStatus {
        self.store.load_appointments().await
    }

    pub async fn refresh_appointment_types(&mut self) -> LoadStatus {
        self.store.load_appointment_types().await
    }

    /// Drops the selection when the selected slot vanished from the snapshot
    /// or was taken by someone else since the last fetch.
    fn revalidate_selection(&mut self) {
        let selected_id = match &self.phase {
            Phase::SlotSelected { slot }
            | Phase::TypeChosen { slot, .. }
            | Phase::SubmitFailed { slot, .. } => slot.id,
            Phase::NoSelection | Phase::Submitting { .. } | Phase::Booked => return,
        };
        match self.store.slot(selected_id) {
            Some(slot) if !slot.taken => {}
            _ => {
                warn!(slot_id = selected_id, "selected slot no longer available, clearing selection");
                self.phase = Phase::NoSelection;
                if self.modal == Modal::Booking {
                    self.modal = Modal::None;
                }
            }
        }
    }

    //=====================================================================================
    // Selection
    //=====================================================================================

    /// Selects an available slot and opens the booking modal.
    ///
    /// Rejected when the slot is taken or no longer exists in the store
    /// snapshot (stale selection guard).
    pub fn select_slot(&mut self, slot_id: i64) -> Result<(), BookingError> {
        if matches!(self.phase, Phase::Submitting { .. }) {
            return Err(BookingError::SubmissionInFlight);
        }
        let slot = self
            .store
            .slot(slot_id)
            .ok_or(BookingError::StaleSlot(slot_id))?;
        if slot.taken {
            warn!(slot_id, "refusing to select a taken slot");
            return Err(BookingError::SlotTaken);
        }
        self.phase = Phase::SlotSelected { slot: slot.clone() };
        self.modal = Modal::Booking;
        Ok(())
    }

    /// Selects by start instant (a calendar click). Two slots with identical
    /// instants resolve to the first match in list order.
    pub fn select_slot_at(&mut self, start_time: DateTime<Utc>) -> Result<(), BookingError> {
        let slot_id = self
            .store
            .slots()
            .iter()
            .find(|slot| !slot.taken && slot.start_time == start_time)
            .map(|slot| slot.id)
            .ok_or(BookingError::SlotTaken)?;
        self.select_slot(slot_id)
    }

    /// Records the chosen appointment type. Requires a selected slot and an id
    /// resolving to a known type in the store snapshot.
    pub fn choose_type(&mut self, appointment_type_id: i64) -> Result<(), BookingError> {
        let slot = match &self.phase {
            Phase::SlotSelected { slot }
            | Phase::TypeChosen { slot, .. }
            | Phase::SubmitFailed { slot, .. } => slot.clone(),
            Phase::Submitting { .. } => return Err(BookingError::SubmissionInFlight),
            Phase::NoSelection | Phase::Booked => return Err(BookingError::NoSlotSelected),
        };
        if self.store.appointment_type(appointment_type_id).is_none() {
            return Err(BookingError::UnknownAppointmentType(appointment_type_id));
        }
        self.phase = Phase::TypeChosen {
            slot,
            appointment_type_id,
        };
        Ok(())
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    /// Submits the current selection as a new appointment.
    ///
    /// The appointment always spans the fixed 45-minute slot duration. While a
    /// submission is in flight, further calls are rejected without touching
    /// the network. On success the store is reconciled by re-fetching both
    /// lists, the modal closes, and the selection clears. On failure the
    /// selection and modal survive so the user can retry.
    pub async fn confirm_booking(&mut self) -> Result<Appointment, BookingError> {
        let (slot, appointment_type_id) = match &self.phase {
            Phase::TypeChosen {
                slot,
                appointment_type_id,
            }
            | Phase::SubmitFailed {
                slot,
                appointment_type_id,
                ..
            } => (slot.clone(), *appointment_type_id),
            Phase::Submitting { .. } => return Err(BookingError::SubmissionInFlight),
            Phase::NoSelection | Phase::SlotSelected { .. } | Phase::Booked => {
                return Err(BookingError::NoSlotSelected)
            }
        };

        let request = NewAppointment {
            slot_id: slot.id,
            start_time: slot.start_time,
            end_time: slot.start_time + Duration::minutes(SLOT_DURATION_MINUTES),
            appointment_type_id,
        };
        self.phase = Phase::Submitting {
            slot: slot.clone(),
            appointment_type_id,
        };

        match self.api.create_appointment(&request).await {
            Ok(appointment) => {
                info!(appointment_id = appointment.id, slot_id = slot.id, "appointment booked");
                self.phase = Phase::Booked;
                self.store.load_slots(None).await;
                self.store.load_appointments().await;
                self.phase = Phase::NoSelection;
                self.modal = Modal::None;
                self.clamp_page();
                Ok(appointment)
            }
            Err(err) => {
                warn!(error = %err, slot_id = slot.id, "booking failed");
                self.phase = Phase::SubmitFailed {
                    slot,
                    appointment_type_id,
                    message: err.user_message(),
                };
                Err(BookingError::Api(err))
            }
        }
    }

    /// Cancels an appointment, gated on explicit user confirmation.
    ///
    /// A declined gate sends nothing. A failed call leaves the store exactly
    /// as it was. On success the freed slot becomes bookable again, so both
    /// lists are re-fetched.
    pub async fn cancel_appointment(
        &mut self,
        appointment_id: i64,
        confirmation: Confirmation,
    ) -> Result<CancelOutcome, BookingError> {
        if confirmation == Confirmation::Declined {
            return Ok(CancelOutcome::Dismissed);
        }
        if self.store.appointment(appointment_id).is_none() {
            return Err(BookingError::UnknownAppointment(appointment_id));
        }

        let updated = self.api.cancel_appointment(appointment_id).await?;
        info!(appointment_id, "appointment cancelled");
        self.store.replace_appointment(updated);
        self.refresh_slots(None).await;
        self.store.load_appointments().await;
        Ok(CancelOutcome::Cancelled)
    }

    /// Moves an appointment to a new date and time, preserving its original
    /// duration. The caller must supply both parts of the new schedule.
    pub async fn reschedule_appointment(
        &mut self,
        appointment_id: i64,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> Result<Appointment, BookingError> {
        let current = self
            .store
            .appointment(appointment_id)
            .ok_or(BookingError::UnknownAppointment(appointment_id))?;
        let duration = current.duration();
        let new_start = new_date.and_time(new_time).and_utc();
        let new_end = new_start + duration;

        let updated = self
            .api
            .reschedule_appointment(appointment_id, new_start, new_end)
            .await?;
        info!(appointment_id, %new_start, "appointment rescheduled");
        self.store.replace_appointment(updated.clone());
        self.store.load_appointments().await;
        Ok(updated)
    }

    //=====================================================================================
    // Documents
    //=====================================================================================

    /// Shares a file on an appointment, then refreshes its document list.
    pub async fn share_document(
        &mut self,
        appointment_id: i64,
        file_name: &str,
        title: &str,
        data: Vec<u8>,
    ) -> Result<(), BookingError> {
        self.api
            .share_document(appointment_id, file_name, title, data)
            .await?;
        info!(appointment_id, file_name, "document shared");
        self.store.load_appointment_documents(appointment_id).await;
        Ok(())
    }

    pub async fn load_documents(&mut self, appointment_id: i64) -> LoadStatus {
        self.store.load_appointment_documents(appointment_id).await
    }

    /// Read-through listing of a user's documents (the documents page is not
    /// part of the dashboard store).
    pub async fn user_documents(
        &self,
        user_id: i64,
    ) -> Result<Vec<SharedDocument>, BookingError> {
        Ok(self.api.list_user_documents(user_id).await?)
    }

    pub async fn delete_document(
        &mut self,
        user_id: i64,
        document_id: i64,
    ) -> Result<(), BookingError> {
        self.api.delete_document(user_id, document_id).await?;
        info!(user_id, document_id, "document deleted");
        Ok(())
    }

    //=====================================================================================
    // Modals
    //=====================================================================================

    pub fn open_profile(&mut self) {
        self.modal = Modal::Profile;
    }

    /// Closes whichever modal is open and abandons the current selection.
    /// A submission in flight is left alone.
    pub fn close_modal(&mut self) {
        self.modal = Modal::None;
        if !matches!(self.phase, Phase::Submitting { .. }) {
            self.phase = Phase::NoSelection;
        }
    }

    //=====================================================================================
    // Pagination over available slots
    //=====================================================================================

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        let available = self.store.available_slots().len();
        (available + SLOTS_PER_PAGE - 1) / SLOTS_PER_PAGE
    }

    /// The slots shown on the current page, in list order.
    pub fn visible_slots(&self) -> Vec<&Slot> {
        let available = self.store.available_slots();
        let start = self.page * SLOTS_PER_PAGE;
        let end = (start + SLOTS_PER_PAGE).min(available.len());
        if start >= available.len() {
            return Vec::new();
        }
        available[start..end].to_vec()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    pub fn next_page(&mut self) {
        if self.has_next_page() {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.has_previous_page() {
            self.page -= 1;
        }
    }

    /// Resets the page when a refresh shrank the list past it.
    fn clamp_page(&mut self) {
        let available = self.store.available_slots().len();
        if self.page != 0 && self.page * SLOTS_PER_PAGE >= available {
            self.page = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppointmentStatus;
    use crate::testing::{appointment, appointment_type, slot, utc, MockApi};

    /// Builds a workflow whose store holds the given slots, one appointment
    /// type (id 1), and the given appointments.
    async fn workflow_with(
        api: Arc<MockApi>,
        slots: Vec<Slot>,
        appointments: Vec<Appointment>,
    ) -> BookingWorkflow {
        {
            let mut state = api.state.lock().unwrap();
            state.slot_responses.push_back(Ok(slots));
            state.appointment_responses.push_back(Ok(appointments));
            state.types = vec![appointment_type(1, "Consultation")];
        }
        let mut workflow = BookingWorkflow::new(api);
        workflow.refresh_slots(None).await;
        workflow.refresh_appointments().await;
        workflow.refresh_appointment_types().await;
        workflow
    }

    #[tokio::test]
    async fn taken_slots_are_never_selectable() {
        let api = Arc::new(MockApi::new());
        let mut workflow =
            workflow_with(api, vec![slot(7, utc(2025, 3, 1, 9, 30), true)], vec![]).await;

        let result = workflow.select_slot(7);

        assert!(matches!(result, Err(BookingError::SlotTaken)));
        assert_eq!(*workflow.phase(), Phase::NoSelection);
        assert_eq!(workflow.modal(), Modal::None);
    }

    #[tokio::test]
    async fn stale_slot_ids_are_rejected() {
        let api = Arc::new(MockApi::new());
        let mut workflow = workflow_with(api, vec![], vec![]).await;

        assert!(matches!(
            workflow.select_slot(99),
            Err(BookingError::StaleSlot(99))
        ));
        assert_eq!(workflow.modal(), Modal::None);
    }

    #[tokio::test]
    async fn selecting_a_free_slot_opens_the_booking_modal() {
        let api = Arc::new(MockApi::new());
        let free = slot(7, utc(2025, 3, 1, 9, 30), false);
        let mut workflow = workflow_with(api, vec![free.clone()], vec![]).await;

        workflow.select_slot(7).unwrap();

        assert_eq!(*workflow.phase(), Phase::SlotSelected { slot: free });
        assert_eq!(workflow.modal(), Modal::Booking);
    }

    #[tokio::test]
    async fn identical_instants_resolve_to_first_in_list_order() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(
            api,
            vec![slot(5, start, false), slot(6, start, false)],
            vec![],
        )
        .await;

        workflow.select_slot_at(start).unwrap();

        match workflow.phase() {
            Phase::SlotSelected { slot } => assert_eq!(slot.id, 5),
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[tokio::test]
    async fn choosing_a_type_requires_a_selected_slot() {
        let api = Arc::new(MockApi::new());
        let mut workflow = workflow_with(api, vec![], vec![]).await;

        assert!(matches!(
            workflow.choose_type(1),
            Err(BookingError::NoSlotSelected)
        ));
    }

    #[tokio::test]
    async fn unknown_appointment_types_are_rejected() {
        let api = Arc::new(MockApi::new());
        let mut workflow =
            workflow_with(api, vec![slot(7, utc(2025, 3, 1, 9, 30), false)], vec![]).await;
        workflow.select_slot(7).unwrap();

        assert!(matches!(
            workflow.choose_type(42),
            Err(BookingError::UnknownAppointmentType(42))
        ));
        assert!(matches!(workflow.phase(), Phase::SlotSelected { .. }));
    }

    #[tokio::test]
    async fn successful_booking_reconciles_and_clears_selection() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(api.clone(), vec![slot(7, start, false)], vec![]).await;
        {
            let mut state = api.state.lock().unwrap();
            state
                .create_responses
                .push_back(Ok(appointment(9, start, AppointmentStatus::Scheduled)));
            // The backend marks slot 7 taken, so the refresh no longer lists it.
            state.slot_responses.push_back(Ok(vec![]));
            state
                .appointment_responses
                .push_back(Ok(vec![appointment(9, start, AppointmentStatus::Scheduled)]));
        }
        workflow.select_slot(7).unwrap();
        workflow.choose_type(1).unwrap();

        let booked = workflow.confirm_booking().await.unwrap();

        assert_eq!(booked.id, 9);
        let state = api.state.lock().unwrap();
        assert_eq!(state.calls.create_appointment, 1);
        let request = state.last_create.as_ref().unwrap();
        assert_eq!(request.slot_id, 7);
        assert_eq!(request.end_time, utc(2025, 3, 1, 10, 15));
        drop(state);
        assert_eq!(*workflow.phase(), Phase::NoSelection);
        assert_eq!(workflow.modal(), Modal::None);
        assert!(workflow.store().slot(7).is_none());
        assert_eq!(workflow.store().appointments().len(), 1);
    }

    #[tokio::test]
    async fn confirm_is_rejected_while_a_submission_is_in_flight() {
        let api = Arc::new(MockApi::new());
        let free = slot(7, utc(2025, 3, 1, 9, 30), false);
        let mut workflow = workflow_with(api.clone(), vec![free.clone()], vec![]).await;
        workflow.phase = Phase::Submitting {
            slot: free,
            appointment_type_id: 1,
        };

        let result = workflow.confirm_booking().await;

        assert!(matches!(result, Err(BookingError::SubmissionInFlight)));
        assert_eq!(api.state.lock().unwrap().calls.create_appointment, 0);
    }

    #[tokio::test]
    async fn failed_booking_keeps_the_modal_open_for_retry() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(api.clone(), vec![slot(7, start, false)], vec![]).await;
        {
            let mut state = api.state.lock().unwrap();
            state.create_responses.push_back(Err(PortError::Application(
                "Ce créneau vient d'être réservé.".to_string(),
            )));
            state
                .create_responses
                .push_back(Ok(appointment(9, start, AppointmentStatus::Scheduled)));
        }
        workflow.select_slot(7).unwrap();
        workflow.choose_type(1).unwrap();

        let first = workflow.confirm_booking().await;

        assert!(first.is_err());
        match workflow.phase() {
            Phase::SubmitFailed { message, .. } => {
                assert_eq!(message, "Ce créneau vient d'être réservé.");
            }
            other => panic!("unexpected phase {other:?}"),
        }
        assert_eq!(workflow.modal(), Modal::Booking);
        // The store was not touched by the failed attempt.
        assert!(workflow.store().slot(7).is_some());

        // Retry straight from the failed state.
        assert!(workflow.confirm_booking().await.is_ok());
        assert_eq!(api.state.lock().unwrap().calls.create_appointment, 2);
    }

    #[tokio::test]
    async fn declined_cancellation_sends_nothing() {
        let api = Arc::new(MockApi::new());
        let mut workflow = workflow_with(
            api.clone(),
            vec![],
            vec![appointment(42, utc(2025, 6, 1, 9, 0), AppointmentStatus::Scheduled)],
        )
        .await;

        let outcome = workflow
            .cancel_appointment(42, Confirmation::Declined)
            .await
            .unwrap();

        assert_eq!(outcome, CancelOutcome::Dismissed);
        assert_eq!(api.state.lock().unwrap().calls.cancel_appointment, 0);
    }

    #[tokio::test]
    async fn failed_cancellation_leaves_the_appointment_scheduled() {
        let api = Arc::new(MockApi::new());
        let mut workflow = workflow_with(
            api.clone(),
            vec![],
            vec![appointment(42, utc(2025, 6, 1, 9, 0), AppointmentStatus::Scheduled)],
        )
        .await;
        api.state
            .lock()
            .unwrap()
            .cancel_responses
            .push_back(Err(PortError::Network("connection reset".to_string())));

        let result = workflow.cancel_appointment(42, Confirmation::Confirmed).await;

        assert!(matches!(result, Err(BookingError::Api(PortError::Network(_)))));
        assert_eq!(
            workflow.store().appointment(42).unwrap().status,
            AppointmentStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn successful_cancellation_frees_the_slot_and_refreshes() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 6, 1, 9, 0);
        let mut workflow = workflow_with(
            api.clone(),
            vec![],
            vec![appointment(42, start, AppointmentStatus::Scheduled)],
        )
        .await;
        {
            let mut state = api.state.lock().unwrap();
            let mut cancelled = appointment(42, start, AppointmentStatus::Cancelled);
            cancelled.cancelled_by = Some("patient".to_string());
            state.cancel_responses.push_back(Ok(cancelled.clone()));
            // The freed slot shows up again on refresh.
            state.slot_responses.push_back(Ok(vec![slot(7, start, false)]));
            state.appointment_responses.push_back(Ok(vec![cancelled]));
        }

        let outcome = workflow
            .cancel_appointment(42, Confirmation::Confirmed)
            .await
            .unwrap();

        assert_eq!(outcome, CancelOutcome::Cancelled);
        assert_eq!(
            workflow.store().appointment(42).unwrap().status,
            AppointmentStatus::Cancelled
        );
        assert!(workflow.store().slot(7).is_some());
        let state = api.state.lock().unwrap();
        assert_eq!(state.calls.cancel_appointment, 1);
        assert_eq!(state.last_cancelled_id, Some(42));
        assert_eq!(state.calls.list_slots, 2);
        assert_eq!(state.calls.list_appointments, 2);
    }

    #[tokio::test]
    async fn reschedule_preserves_the_original_duration() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(
            api.clone(),
            vec![],
            vec![appointment(42, start, AppointmentStatus::Scheduled)],
        )
        .await;
        let moved = appointment(42, utc(2025, 3, 5, 14, 0), AppointmentStatus::Scheduled);
        api.state
            .lock()
            .unwrap()
            .reschedule_responses
            .push_back(Ok(moved));

        workflow
            .reschedule_appointment(
                42,
                NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        let (id, new_start, new_end) = api.state.lock().unwrap().last_reschedule.unwrap();
        assert_eq!(id, 42);
        assert_eq!(new_start, utc(2025, 3, 5, 14, 0));
        assert_eq!(new_end, utc(2025, 3, 5, 14, 45));
    }

    #[tokio::test]
    async fn failed_reschedule_retains_the_original_schedule() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(
            api.clone(),
            vec![],
            vec![appointment(42, start, AppointmentStatus::Scheduled)],
        )
        .await;
        api.state
            .lock()
            .unwrap()
            .reschedule_responses
            .push_back(Err(PortError::Application("Créneau indisponible.".to_string())));

        let result = workflow
            .reschedule_appointment(
                42,
                NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            )
            .await;

        assert!(result.is_err());
        let kept = workflow.store().appointment(42).unwrap();
        assert_eq!(kept.start_time, start);
        assert_eq!(api.state.lock().unwrap().calls.list_appointments, 1);
    }

    #[tokio::test]
    async fn pagination_slices_available_slots_by_eight() {
        let api = Arc::new(MockApi::new());
        let slots: Vec<Slot> = (0..20)
            .map(|i| slot(i, utc(2025, 3, 1, 8, 0) + Duration::hours(i), false))
            .collect();
        let mut workflow = workflow_with(api, slots, vec![]).await;

        assert_eq!(workflow.total_pages(), 3);
        assert_eq!(
            workflow.visible_slots().iter().map(|s| s.id).collect::<Vec<_>>(),
            (0..8).collect::<Vec<_>>()
        );
        assert!(workflow.has_next_page());
        assert!(!workflow.has_previous_page());

        workflow.next_page();
        workflow.next_page();

        assert_eq!(workflow.page(), 2);
        assert_eq!(
            workflow.visible_slots().iter().map(|s| s.id).collect::<Vec<_>>(),
            (16..20).collect::<Vec<_>>()
        );
        assert!(!workflow.has_next_page());

        // Walking past the last page is a no-op.
        workflow.next_page();
        assert_eq!(workflow.page(), 2);
    }

    #[tokio::test]
    async fn refresh_clears_a_selection_that_went_stale() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(api.clone(), vec![slot(7, start, false)], vec![]).await;
        workflow.select_slot(7).unwrap();
        // Another client books slot 7 before this user confirms.
        api.state
            .lock()
            .unwrap()
            .slot_responses
            .push_back(Ok(vec![slot(7, start, true)]));

        workflow.refresh_slots(None).await;

        assert_eq!(*workflow.phase(), Phase::NoSelection);
        assert_eq!(workflow.modal(), Modal::None);
    }

    #[tokio::test]
    async fn refresh_resets_the_page_when_it_falls_past_the_end() {
        let api = Arc::new(MockApi::new());
        let slots: Vec<Slot> = (0..20)
            .map(|i| slot(i, utc(2025, 3, 1, 8, 0) + Duration::hours(i), false))
            .collect();
        let mut workflow = workflow_with(api.clone(), slots, vec![]).await;
        workflow.next_page();
        workflow.next_page();
        assert_eq!(workflow.page(), 2);
        api.state
            .lock()
            .unwrap()
            .slot_responses
            .push_back(Ok(vec![slot(0, utc(2025, 3, 1, 8, 0), false)]));

        workflow.refresh_slots(None).await;

        assert_eq!(workflow.page(), 0);
    }

    #[tokio::test]
    async fn cancellation_refresh_also_clears_a_stale_selection() {
        let api = Arc::new(MockApi::new());
        let start = utc(2025, 3, 1, 9, 30);
        let mut workflow = workflow_with(
            api.clone(),
            vec![slot(7, start, false)],
            vec![appointment(42, utc(2025, 6, 1, 9, 0), AppointmentStatus::Scheduled)],
        )
        .await;
        workflow.select_slot(7).unwrap();
        {
            let mut state = api.state.lock().unwrap();
            state.cancel_responses.push_back(Ok(appointment(
                42,
                utc(2025, 6, 1, 9, 0),
                AppointmentStatus::Cancelled,
            )));
            // Slot 7 was taken by another client in the meantime; the refresh
            // triggered by the cancellation must drop the open selection.
            state.slot_responses.push_back(Ok(vec![slot(7, start, true)]));
            state.appointment_responses.push_back(Ok(vec![]));
        }

        workflow
            .cancel_appointment(42, Confirmation::Confirmed)
            .await
            .unwrap();

        assert_eq!(*workflow.phase(), Phase::NoSelection);
        assert_eq!(workflow.modal(), Modal::None);
    }

    #[tokio::test]
    async fn closing_the_modal_abandons_the_selection() {
        let api = Arc::new(MockApi::new());
        let mut workflow =
            workflow_with(api, vec![slot(7, utc(2025, 3, 1, 9, 30), false)], vec![]).await;
        workflow.select_slot(7).unwrap();
        workflow.choose_type(1).unwrap();

        workflow.close_modal();

        assert_eq!(*workflow.phase(), Phase::NoSelection);
        assert_eq!(workflow.modal(), Modal::None);
    }

    #[tokio::test]
    async fn closing_the_modal_leaves_an_in_flight_submission_alone() {
        let api = Arc::new(MockApi::new());
        let free = slot(7, utc(2025, 3, 1, 9, 30), false);
        let mut workflow = workflow_with(api, vec![free.clone()], vec![]).await;
        workflow.phase = Phase::Submitting {
            slot: free.clone(),
            appointment_type_id: 1,
        };

        workflow.close_modal();

        assert_eq!(workflow.modal(), Modal::None);
        assert_eq!(
            *workflow.phase(),
            Phase::Submitting {
                slot: free,
                appointment_type_id: 1,
            }
        );
    }

    #[tokio::test]
    async fn profile_modal_opens_without_touching_the_selection() {
        let api = Arc::new(MockApi::new());
        let mut workflow =
            workflow_with(api, vec![slot(7, utc(2025, 3, 1, 9, 30), false)], vec![]).await;
        workflow.select_slot(7).unwrap();

        workflow.open_profile();

        assert_eq!(workflow.modal(), Modal::Profile);
        assert!(matches!(workflow.phase(), Phase::SlotSelected { .. }));
    }
}
