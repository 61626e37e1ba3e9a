//! # API REST
//!
//! REST API implementation for SAVISER.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//! - The in-memory encounter store standing in for the persistence
//!   collaborator
//!
//! Uses `api-shared` for wire types and `saviser-core` for all triage
//! semantics.

#![warn(rust_2018_idioms)]

pub mod store;

pub use store::{EncounterStore, StoreError};
