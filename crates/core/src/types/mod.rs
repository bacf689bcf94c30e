//! Core value types for the back office.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod magasin;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use magasin::{ADMIN_CODE, MagasinCode, MagasinCodeError, Pin, PinError};
pub use money::{format_eur, round_cents};
pub use status::*;
