//! Request-scoped models for the back office.
//!
//! Persisted records live in `sav_core::models`.

pub mod session;

pub use session::CurrentStore;
