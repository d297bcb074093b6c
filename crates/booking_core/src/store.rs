//! crates/booking_core/src/store.rs
//!
//! The slot/appointment state store: the client's only shared mutable state.
//! It holds the last fetched lists and their load status. Fetch failures are
//! absorbed here (logged, status set to `Failed`, lists left unchanged) so the
//! presentation layer never has to handle a transport error itself.

use std::sync::Arc;

use chrono::{DateTime, Months, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::domain::{Appointment, AppointmentStatus, AppointmentType, SharedDocument, Slot};
use crate::ports::{BookingApi, PortError};

/// The lifecycle of a single fetch: `Idle → Loading → Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Holds the current slot, appointment, type, and document lists.
///
/// Only the workflow controller mutates this store, and only after a completed
/// API call; nothing is written optimistically.
pub struct BookingStore {
    api: Arc<dyn BookingApi>,
    slots: Vec<Slot>,
    appointments: Vec<Appointment>,
    appointment_types: Vec<AppointmentType>,
    documents: Vec<SharedDocument>,
    slot_status: LoadStatus,
    appointment_status: LoadStatus,
    type_status: LoadStatus,
    document_status: LoadStatus,
    last_error: Option<PortError>,
}

/// The default fetch window: today through three months out.
fn default_slot_range() -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    let end = today.checked_add_months(Months::new(3)).unwrap_or(today);
    (today, end)
}

impl BookingStore {
    pub(crate) fn new(api: Arc<dyn BookingApi>) -> Self {
        Self {
            api,
            slots: Vec::new(),
            appointments: Vec::new(),
            appointment_types: Vec::new(),
            documents: Vec::new(),
            slot_status: LoadStatus::Idle,
            appointment_status: LoadStatus::Idle,
            type_status: LoadStatus::Idle,
            document_status: LoadStatus::Idle,
            last_error: None,
        }
    }

    //=====================================================================================
    // Fetches
    //=====================================================================================

    /// Fetches slots in `[start, end)` and replaces the local list.
    ///
    /// Defaults to [`default_slot_range`] when no range is given. A fetch that
    /// fails leaves the list unchanged; a fetch already in flight is skipped.
    pub(crate) async fn load_slots(&mut self, range: Option<(NaiveDate, NaiveDate)>) -> LoadStatus {
        if self.slot_status == LoadStatus::Loading {
            debug!("slot fetch already in flight, skipping");
            return self.slot_status;
        }
        let (start, end) = range.unwrap_or_else(default_slot_range);
        self.slot_status = LoadStatus::Loading;
        match self.api.list_slots(start, end).await {
            Ok(slots) => {
                debug!(count = slots.len(), "slots fetched");
                self.slots = slots;
                self.slot_status = LoadStatus::Succeeded;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "slot fetch failed");
                self.slot_status = LoadStatus::Failed;
                self.last_error = Some(err);
            }
        }
        self.slot_status
    }

    /// Fetches the user's appointments and replaces the local list.
    pub(crate) async fn load_appointments(&mut self) -> LoadStatus {
        if self.appointment_status == LoadStatus::Loading {
            debug!("appointment fetch already in flight, skipping");
            return self.appointment_status;
        }
        self.appointment_status = LoadStatus::Loading;
        match self.api.list_appointments().await {
            Ok(appointments) => {
                debug!(count = appointments.len(), "appointments fetched");
                self.appointments = appointments;
                self.appointment_status = LoadStatus::Succeeded;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "appointment fetch failed");
                self.appointment_status = LoadStatus::Failed;
                self.last_error = Some(err);
            }
        }
        self.appointment_status
    }

    pub(crate) async fn load_appointment_types(&mut self) -> LoadStatus {
        if self.type_status == LoadStatus::Loading {
            return self.type_status;
        }
        self.type_status = LoadStatus::Loading;
        match self.api.list_appointment_types().await {
            Ok(types) => {
                self.appointment_types = types;
                self.type_status = LoadStatus::Succeeded;
            }
            Err(err) => {
                warn!(error = %err, "appointment type fetch failed");
                self.type_status = LoadStatus::Failed;
                self.last_error = Some(err);
            }
        }
        self.type_status
    }

    /// Fetches the documents shared on one appointment.
    pub(crate) async fn load_appointment_documents(&mut self, appointment_id: i64) -> LoadStatus {
        if self.document_status == LoadStatus::Loading {
            return self.document_status;
        }
        self.document_status = LoadStatus::Loading;
        match self.api.list_appointment_documents(appointment_id).await {
            Ok(documents) => {
                self.documents = documents;
                self.document_status = LoadStatus::Succeeded;
            }
            Err(err) => {
                warn!(error = %err, appointment_id, "document fetch failed");
                self.document_status = LoadStatus::Failed;
                self.last_error = Some(err);
            }
        }
        self.document_status
    }

    //=====================================================================================
    // Local reconciliation (post-mutation, confirmed by the server)
    //=====================================================================================

    /// Replaces the stored appointment carrying `updated.id`, if present.
    pub(crate) fn replace_appointment(&mut self, updated: Appointment) {
        if let Some(existing) = self.appointments.iter_mut().find(|a| a.id == updated.id) {
            *existing = updated;
        }
    }

    //=====================================================================================
    // Read Accessors
    //=====================================================================================

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slots open for selection, in list order.
    pub fn available_slots(&self) -> Vec<&Slot> {
        self.slots.iter().filter(|slot| !slot.taken).collect()
    }

    /// First slot with this id, in list order. Duplicate instants resolve to
    /// the earliest entry.
    pub fn slot(&self, slot_id: i64) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == slot_id)
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn appointment(&self, appointment_id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }

    /// Appointments still ahead of `now` and not cancelled.
    pub fn upcoming_appointments(&self, now: DateTime<Utc>) -> Vec<&Appointment> {
        self.appointments.iter().filter(|a| a.is_upcoming(now)).collect()
    }

    /// Appointments already started or cancelled; they stay visible here,
    /// nothing is ever hard-deleted on the client.
    pub fn past_appointments(&self, now: DateTime<Utc>) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|a| a.start_time < now || a.status == AppointmentStatus::Cancelled)
            .collect()
    }

    pub fn appointment_types(&self) -> &[AppointmentType] {
        &self.appointment_types
    }

    pub fn appointment_type(&self, type_id: i64) -> Option<&AppointmentType> {
        self.appointment_types.iter().find(|t| t.id == type_id)
    }

    pub fn documents(&self) -> &[SharedDocument] {
        &self.documents
    }

    pub fn slot_status(&self) -> LoadStatus {
        self.slot_status
    }

    pub fn appointment_status(&self) -> LoadStatus {
        self.appointment_status
    }

    pub fn appointment_type_status(&self) -> LoadStatus {
        self.type_status
    }

    pub fn document_status(&self) -> LoadStatus {
        self.document_status
    }

    /// The error behind the most recent `Failed` status, if any.
    pub fn last_error(&self) -> Option<&PortError> {
        self.last_error.as_ref()
    }
}
