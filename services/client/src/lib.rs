//! services/client/src/lib.rs
//!
//! The runnable booking client: configuration, the HTTP and session adapters,
//! and the error type shared by the binary.

pub mod adapters;
pub mod config;
pub mod error;
