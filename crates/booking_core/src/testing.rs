//! crates/booking_core/src/testing.rs
//!
//! A scripted, in-memory `BookingApi` used by the store and workflow tests.
//! Responses are queued per operation; call counts and the last payloads are
//! recorded so tests can assert on exactly what went over the wire.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::domain::{
    Appointment, AppointmentStatus, AppointmentType, SharedDocument, Slot,
};
use crate::ports::{BookingApi, NewAppointment, PortError, PortResult};

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn slot(id: i64, start_time: DateTime<Utc>, taken: bool) -> Slot {
    Slot {
        id,
        start_time,
        end_time: None,
        taken,
    }
}

pub fn appointment(id: i64, start_time: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
    Appointment {
        id,
        user_id: 1,
        start_time,
        end_time: start_time + chrono::Duration::minutes(45),
        title: Some(format!("Rendez-vous {id}")),
        appointment_type_id: Some(1),
        status,
        cancelled_by: None,
    }
}

pub fn appointment_type(id: i64, name: &str) -> AppointmentType {
    AppointmentType {
        id,
        name: name.to_string(),
        color: "#4CAF50".to_string(),
    }
}

#[derive(Default)]
pub struct Calls {
    pub list_slots: usize,
    pub list_appointments: usize,
    pub create_appointment: usize,
    pub cancel_appointment: usize,
    pub reschedule_appointment: usize,
    pub list_appointment_types: usize,
    pub share_document: usize,
    pub delete_document: usize,
}

#[derive(Default)]
pub struct MockState {
    // Queued responses, consumed front-to-back. An empty queue yields the
    // operation's default (empty list, or an "unscripted" error for mutations).
    pub slot_responses: VecDeque<PortResult<Vec<Slot>>>,
    pub appointment_responses: VecDeque<PortResult<Vec<Appointment>>>,
    pub create_responses: VecDeque<PortResult<Appointment>>,
    pub cancel_responses: VecDeque<PortResult<Appointment>>,
    pub reschedule_responses: VecDeque<PortResult<Appointment>>,
    pub types: Vec<AppointmentType>,
    pub documents: Vec<SharedDocument>,

    pub calls: Calls,
    pub last_slot_range: Option<(NaiveDate, NaiveDate)>,
    pub last_create: Option<NewAppointment>,
    pub last_cancelled_id: Option<i64>,
    pub last_reschedule: Option<(i64, DateTime<Utc>, DateTime<Utc>)>,
}

#[derive(Default)]
pub struct MockApi {
    pub state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unscripted() -> PortError {
    PortError::Unexpected("no scripted response".to_string())
}

#[async_trait]
impl BookingApi for MockApi {
    async fn list_slots(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> PortResult<Vec<Slot>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_slots += 1;
        state.last_slot_range = Some((start_date, end_date));
        state.slot_responses.pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn list_appointments(&self) -> PortResult<Vec<Appointment>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_appointments += 1;
        state
            .appointment_responses
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn create_appointment(&self, request: &NewAppointment) -> PortResult<Appointment> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_appointment += 1;
        state.last_create = Some(request.clone());
        state.create_responses.pop_front().unwrap_or(Err(unscripted()))
    }

    async fn cancel_appointment(&self, appointment_id: i64) -> PortResult<Appointment> {
        let mut state = self.state.lock().unwrap();
        state.calls.cancel_appointment += 1;
        state.last_cancelled_id = Some(appointment_id);
        state.cancel_responses.pop_front().unwrap_or(Err(unscripted()))
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: i64,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> PortResult<Appointment> {
        let mut state = self.state.lock().unwrap();
        state.calls.reschedule_appointment += 1;
        state.last_reschedule = Some((appointment_id, new_start, new_end));
        state
            .reschedule_responses
            .pop_front()
            .unwrap_or(Err(unscripted()))
    }

    async fn list_appointment_types(&self) -> PortResult<Vec<AppointmentType>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_appointment_types += 1;
        Ok(state.types.clone())
    }

    async fn share_document(
        &self,
        _appointment_id: i64,
        _file_name: &str,
        _title: &str,
        _data: Vec<u8>,
    ) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.share_document += 1;
        Ok(())
    }

    async fn list_appointment_documents(
        &self,
        _appointment_id: i64,
    ) -> PortResult<Vec<SharedDocument>> {
        Ok(self.state.lock().unwrap().documents.clone())
    }

    async fn list_user_documents(&self, _user_id: i64) -> PortResult<Vec<SharedDocument>> {
        Ok(self.state.lock().unwrap().documents.clone())
    }

    async fn delete_document(&self, _user_id: i64, document_id: i64) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_document += 1;
        state.documents.retain(|doc| doc.id != document_id);
        Ok(())
    }
}
