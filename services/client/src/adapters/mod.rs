//! services/client/src/adapters/mod.rs
//!
//! Concrete implementations of the core's ports: the reqwest-backed
//! `BookingApi` transport and the file-backed session store.

pub mod http;
pub mod session;
