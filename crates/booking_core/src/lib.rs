pub mod domain;
pub mod ports;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{
    Appointment, AppointmentStatus, AppointmentType, Role, SharedDocument, Slot,
    SLOT_DURATION_MINUTES,
};
pub use ports::{BookingApi, CredentialProvider, NewAppointment, PortError, PortResult};
pub use store::{BookingStore, LoadStatus};
pub use workflow::{
    BookingError, BookingWorkflow, CancelOutcome, Confirmation, Modal, Phase, SLOTS_PER_PAGE,
};
