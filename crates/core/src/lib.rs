//! SAV Audition core: shared types and state machines.
//!
//! This crate is used by every SAV Audition component:
//! - `admin` - back-office server (stores, orders, decomptes, repairs)
//! - `cli` - command-line tools for seeding, exports and PIN checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no clock. Functions that depend on time take `now` as an
//! argument.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, store codes and PINs, money, statuses
//! - [`models`] - Records persisted in the document store
//! - [`directory`] - The store/PIN table
//! - [`auth`] - PIN login, lockout and session expiry
//! - [`signature`] - Signature capture and rendering

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod directory;
pub mod models;
pub mod signature;
pub mod types;

pub use auth::{AuthError, AuthPolicy, AuthSession, LoginAttempts, PinAuthenticator, SessionCheck};
pub use directory::{DirectoryError, StoreDirectory, StoreEntry};
pub use models::{Record, ValidationError};
pub use signature::{PointerDevice, PointerEvent, PointerPhase, SignatureError, SignaturePad, Surface};
pub use types::*;
