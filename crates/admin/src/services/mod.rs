//! Business logic services for the back office.
//!
//! # Services
//!
//! - `auth` - PIN login, lockout bookkeeping and session expiry checks
//! - `dashboard` - Work-queue counters per store
//! - `draft` - Per-session intervention form drafts

pub mod auth;
pub mod dashboard;
pub mod draft;

pub use auth::{LoginLedger, StoreAuthError, StoreAuthService, current_session};
pub use dashboard::DashboardSummary;
