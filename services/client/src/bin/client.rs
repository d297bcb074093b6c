//! services/client/src/bin/client.rs
//!
//! A small terminal front end over the booking workflow: it loads the stored
//! session, refreshes the lists, and prints the requested view. Commands:
//! `slots` (default), `appointments`, `types`.

use std::sync::Arc;

use booking_core::ports::{CredentialProvider, PortError};
use booking_core::store::LoadStatus;
use booking_core::workflow::BookingWorkflow;
use chrono::Utc;
use client_lib::{
    adapters::{http::HttpBookingApi, session::FileSession},
    config::Config,
    error::ClientError,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting booking client...");

    // --- 2. Load the Session & Build the Adapters ---
    let session = Arc::new(FileSession::load(config.session_path.clone())?);
    if session.token().is_none() {
        warn!(
            path = %config.session_path.display(),
            "no stored session; the backend will refuse every request"
        );
    }
    let api = Arc::new(HttpBookingApi::new(
        config.api_base_url.clone(),
        config.request_timeout,
        session,
    )?);
    let mut workflow = BookingWorkflow::new(api);

    // --- 3. Run the Requested View ---
    let command = std::env::args().nth(1).unwrap_or_else(|| "slots".to_string());
    match command.as_str() {
        "slots" => {
            let status = workflow.refresh_slots(None).await;
            bail_if_logged_out(&workflow, status)?;
            println!("Créneaux disponibles (page 1/{}):", workflow.total_pages().max(1));
            for slot in workflow.visible_slots() {
                println!(
                    "  #{:<5} {} - {}",
                    slot.id,
                    slot.start_time.format("%d/%m/%Y %H:%M"),
                    slot.end_or_default().format("%H:%M")
                );
            }
            if workflow.has_next_page() {
                println!("  ... {} créneaux au total", workflow.store().available_slots().len());
            }
        }
        "appointments" => {
            let status = workflow.refresh_appointments().await;
            bail_if_logged_out(&workflow, status)?;
            let now = Utc::now();
            println!("Rendez-vous à venir :");
            for apt in workflow.store().upcoming_appointments(now) {
                println!(
                    "  #{:<5} {} {}",
                    apt.id,
                    apt.start_time.format("%d/%m/%Y %H:%M"),
                    apt.title.as_deref().unwrap_or("Rendez-vous")
                );
            }
            println!("Rendez-vous passés ou annulés :");
            for apt in workflow.store().past_appointments(now) {
                println!(
                    "  #{:<5} {} [{}]",
                    apt.id,
                    apt.start_time.format("%d/%m/%Y %H:%M"),
                    apt.status.as_str()
                );
            }
        }
        "types" => {
            let status = workflow.refresh_appointment_types().await;
            bail_if_logged_out(&workflow, status)?;
            println!("Motifs de rendez-vous :");
            for kind in workflow.store().appointment_types() {
                println!("  #{:<5} {} ({})", kind.id, kind.name, kind.color);
            }
        }
        other => {
            return Err(ClientError::Internal(format!(
                "unknown command '{other}' (expected slots, appointments, or types)"
            )));
        }
    }

    Ok(())
}

/// The terminal analog of the 401 login redirect: report the expired session
/// instead of showing an empty list.
fn bail_if_logged_out(workflow: &BookingWorkflow, status: LoadStatus) -> Result<(), ClientError> {
    if status == LoadStatus::Failed {
        if let Some(PortError::Unauthorized) = workflow.store().last_error() {
            println!("Votre session a expiré. Veuillez vous reconnecter.");
            return Err(ClientError::Port(PortError::Unauthorized));
        }
    }
    Ok(())
}
