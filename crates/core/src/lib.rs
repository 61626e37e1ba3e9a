//! # SAVISER Core
//!
//! Core triage classification logic for the SAVISER system
//! ("Sistema de Clasificación de Triage").
//!
//! This crate contains the pure domain:
//! - Validated vital-sign records and chief-complaint categorisation
//! - The rule definition language (predicate expression trees + parser)
//! - The deterministic, auditable classification engine with atomic rule
//!   reloads
//! - Append-only patient encounters and the waiting-room queue projection
//!
//! **No API concerns**: HTTP servers, request parsing, and persistence of
//! results belong to `api-rest` and its collaborators, not here. The only
//! I/O this crate performs is reading rule definition files.

pub mod complaint;
pub mod config;
pub mod encounter;
pub mod engine;
mod error;
pub mod queue;
pub mod rules;
pub mod vitals;

pub use complaint::{classify_complaint, SymptomCategory};
pub use config::{resolve_rules_path, CoreConfig, DEFAULT_RULES_FILE};
pub use encounter::{Encounter, EncounterSnapshot, LatestClassification};
pub use engine::{evaluate_against, ClassificationEngine, ClassificationResult, RuleMatch};
pub use error::{TriageError, TriageResult};
pub use queue::{project, QueueEntry, QueueProjection};
pub use rules::{Rule, RuleSet};
pub use vitals::{ConsciousnessLevel, VitalSignsInput, VitalSignsRecord};

pub use saviser_types::{NonEmptyText, PriorityLevel};
