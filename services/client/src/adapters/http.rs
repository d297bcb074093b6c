//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, which is the concrete implementation
//! of the `BookingApi` port from the `core` crate. It is a stateless transport
//! shim: one request per call, no retries, no caching. Every request carries
//! the bearer token read from the injected `CredentialProvider`.
//!
//! Backend payloads are not statically guaranteed, so list responses are
//! decoded element by element; a malformed element is logged and skipped
//! instead of failing the whole response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use booking_core::domain::{
    Appointment, AppointmentStatus, AppointmentType, SharedDocument, Slot,
    SLOT_DURATION_MINUTES,
};
use booking_core::ports::{
    BookingApi, CredentialProvider, NewAppointment, PortError, PortResult,
};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `BookingApi` port over HTTP with `reqwest`.
pub struct HttpBookingApi {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpBookingApi {
    /// Creates a new `HttpBookingApi`. The timeout applies to every request;
    /// a request that hits it surfaces as an application error.
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> PortResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// The current bearer token. Without one, every call short-circuits to
    /// `Unauthorized` before touching the network.
    fn bearer(&self) -> PortResult<String> {
        self.credentials.token().ok_or(PortError::Unauthorized)
    }

    async fn parse_list(response: reqwest::Response) -> PortResult<Vec<Value>> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed list response: {e}")))
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn transport_error(err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        // Treated like a server rejection so the user sees a retryable message.
        PortError::Application("La requête a expiré. Veuillez réessayer.".to_string())
    } else {
        PortError::Network(err.to_string())
    }
}

/// Maps the response status onto the port's failure taxonomy: 401 is the sole
/// auth signal, any other non-2xx carries an optional `message` field shown to
/// the user verbatim.
async fn ensure_success(response: reqwest::Response) -> PortResult<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(PortError::Unauthorized);
    }
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    Err(PortError::Application(message.unwrap_or_else(|| {
        format!("La requête a échoué (code {}).", status.as_u16())
    })))
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct SlotRecord {
    id: i64,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    taken: bool,
}
impl SlotRecord {
    fn to_domain(self) -> Slot {
        Slot {
            id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            taken: self.taken,
        }
    }
}

/// Appointments arrive under two historical shapes: `start_time`/`end_time`
/// with a string `status`, or `start`/`end` with a boolean `honored`.
#[derive(Deserialize)]
struct AppointmentRecord {
    id: i64,
    user_id: i64,
    #[serde(alias = "start")]
    start_time: DateTime<Utc>,
    #[serde(alias = "end")]
    end_time: Option<DateTime<Utc>>,
    title: Option<String>,
    appointment_type_id: Option<i64>,
    status: Option<String>,
    honored: Option<bool>,
    cancelled_by: Option<String>,
}
impl AppointmentRecord {
    fn to_domain(self) -> Appointment {
        // Cancellation wins over everything; the legacy boolean only decides
        // between honored and scheduled.
        let cancelled = self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"));
        let status = if cancelled {
            AppointmentStatus::Cancelled
        } else if let Some(honored) = self.honored {
            if honored {
                AppointmentStatus::Honored
            } else {
                AppointmentStatus::Scheduled
            }
        } else {
            self.status
                .as_deref()
                .map(AppointmentStatus::parse)
                .unwrap_or(AppointmentStatus::Scheduled)
        };
        let end_time = self.end_time.unwrap_or_else(|| {
            self.start_time + chrono::Duration::minutes(SLOT_DURATION_MINUTES)
        });
        Appointment {
            id: self.id,
            user_id: self.user_id,
            start_time: self.start_time,
            end_time,
            title: self.title,
            appointment_type_id: self.appointment_type_id,
            status,
            cancelled_by: self.cancelled_by,
        }
    }
}

#[derive(Deserialize)]
struct AppointmentTypeRecord {
    id: i64,
    name: String,
    #[serde(default = "default_color")]
    color: String,
}
fn default_color() -> String {
    "#4CAF50".to_string()
}
impl AppointmentTypeRecord {
    fn to_domain(self) -> AppointmentType {
        AppointmentType {
            id: self.id,
            name: self.name,
            color: self.color,
        }
    }
}

#[derive(Deserialize)]
struct DocumentRecord {
    id: i64,
    #[serde(alias = "titre", alias = "title")]
    name: String,
    #[serde(default = "default_mime")]
    mime_type: String,
    #[serde(alias = "created_at")]
    shared_at: DateTime<Utc>,
}
fn default_mime() -> String {
    "application/octet-stream".to_string()
}
impl DocumentRecord {
    fn to_domain(self) -> SharedDocument {
        SharedDocument {
            id: self.id,
            name: self.name,
            mime_type: self.mime_type,
            shared_at: self.shared_at,
        }
    }
}

/// The appointment listing is bare for users but wrapped for admins.
#[derive(Deserialize)]
#[serde(untagged)]
enum AppointmentsPayload {
    Wrapped { appointments: Vec<Value> },
    Bare(Vec<Value>),
}
impl AppointmentsPayload {
    fn into_values(self) -> Vec<Value> {
        match self {
            AppointmentsPayload::Wrapped { appointments } => appointments,
            AppointmentsPayload::Bare(values) => values,
        }
    }
}

/// Document listings always arrive wrapped.
#[derive(Deserialize)]
struct DocumentsPayload {
    #[serde(default)]
    documents: Vec<Value>,
}

/// Converts raw list elements one by one, skipping whatever does not match
/// the expected shape.
fn decode_records<R, T>(values: Vec<Value>, kind: &str, convert: fn(R) -> T) -> Vec<T>
where
    R: DeserializeOwned,
{
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<R>(value) {
            Ok(record) => Some(convert(record)),
            Err(err) => {
                warn!(error = %err, kind, "skipping malformed record");
                None
            }
        })
        .collect()
}

//=========================================================================================
// `BookingApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_slots(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> PortResult<Vec<Slot>> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint("slots"))
            .query(&[
                ("start_date", start_date.format("%Y-%m-%d").to_string()),
                ("end_date", end_date.format("%Y-%m-%d").to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let values = Self::parse_list(response).await?;
        Ok(decode_records(values, "slot", SlotRecord::to_domain))
    }

    async fn list_appointments(&self) -> PortResult<Vec<Appointment>> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint("appointments"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let payload = response
            .json::<AppointmentsPayload>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed list response: {e}")))?;
        Ok(decode_records(
            payload.into_values(),
            "appointment",
            AppointmentRecord::to_domain,
        ))
    }

    async fn create_appointment(&self, request: &NewAppointment) -> PortResult<Appointment> {
        let token = self.bearer()?;
        let body = serde_json::json!({
            "slot_id": request.slot_id,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "appointment_type_id": request.appointment_type_id,
        });
        let response = self
            .http
            .post(self.endpoint("appointments"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let record = response
            .json::<AppointmentRecord>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed appointment: {e}")))?;
        Ok(record.to_domain())
    }

    async fn cancel_appointment(&self, appointment_id: i64) -> PortResult<Appointment> {
        let token = self.bearer()?;
        let response = self
            .http
            .post(self.endpoint(&format!("appointments/{appointment_id}/cancel")))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let record = response
            .json::<AppointmentRecord>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed appointment: {e}")))?;
        Ok(record.to_domain())
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: i64,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> PortResult<Appointment> {
        let token = self.bearer()?;
        let body = serde_json::json!({ "start": new_start, "end": new_end });
        let response = self
            .http
            .put(self.endpoint(&format!("appointments/{appointment_id}")))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let record = response
            .json::<AppointmentRecord>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed appointment: {e}")))?;
        Ok(record.to_domain())
    }

    async fn list_appointment_types(&self) -> PortResult<Vec<AppointmentType>> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint("appointment-types"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let values = Self::parse_list(response).await?;
        Ok(decode_records(
            values,
            "appointment type",
            AppointmentTypeRecord::to_domain,
        ))
    }

    async fn share_document(
        &self,
        appointment_id: i64,
        file_name: &str,
        title: &str,
        data: Vec<u8>,
    ) -> PortResult<()> {
        let token = self.bearer()?;
        // The backend expects the historical French field name.
        let form = Form::new()
            .part("file", Part::bytes(data).file_name(file_name.to_string()))
            .text("titre", title.to_string());
        let response = self
            .http
            .post(self.endpoint(&format!("appointments/{appointment_id}/share")))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn list_appointment_documents(
        &self,
        appointment_id: i64,
    ) -> PortResult<Vec<SharedDocument>> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint(&format!("appointments/{appointment_id}/documents")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let payload = response
            .json::<DocumentsPayload>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed list response: {e}")))?;
        Ok(decode_records(
            payload.documents,
            "document",
            DocumentRecord::to_domain,
        ))
    }

    async fn list_user_documents(&self, user_id: i64) -> PortResult<Vec<SharedDocument>> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint(&format!("documents/{user_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;
        let payload = response
            .json::<DocumentsPayload>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed list response: {e}")))?;
        Ok(decode_records(
            payload.documents,
            "document",
            DocumentRecord::to_domain,
        ))
    }

    async fn delete_document(&self, user_id: i64, document_id: i64) -> PortResult<()> {
        let token = self.bearer()?;
        let response = self
            .http
            .delete(self.endpoint(&format!("documents/{user_id}/{document_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}
