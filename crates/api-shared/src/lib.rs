//! # API Shared
//!
//! Shared wire types and services for the SAVISER APIs.
//!
//! Contains:
//! - Request/response DTOs (`messages` module)
//! - The shared `HealthService`
//!
//! The DTOs deliberately use plain wire types (`u8` levels, string tokens)
//! so this crate stays a thin boundary; conversion into the validated core
//! types happens in the handlers.

pub mod health;
pub mod messages;

pub use health::HealthService;
pub use messages::*;
