//! Request and response DTOs for the SAVISER REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// System information response (`GET /info`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InfoRes {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<String>,
}

/// Request to open a new patient encounter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpenEncounterReq {
    pub patient_name: String,
}

/// Response after opening an encounter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpenEncounterRes {
    pub encounter_id: Uuid,
}

/// Summary of one encounter for listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EncounterSummary {
    pub encounter_id: Uuid,
    pub patient_name: String,
    pub opened_at: DateTime<Utc>,
    /// Latest assigned level, absent while classification is pending.
    pub level: Option<u8>,
    pub classified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListEncountersRes {
    pub encounters: Vec<EncounterSummary>,
}

/// Vital signs as submitted by the intake UI.
///
/// `consciousness` is the AVPU token (`ALERT`, `VERBAL`, `PAIN`,
/// `UNRESPONSIVE`); everything is range-checked by the core before any rule
/// is evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordVitalsReq {
    pub heart_rate: u32,
    pub systolic_bp: u32,
    pub diastolic_bp: u32,
    pub respiratory_rate: u32,
    pub spo2: u32,
    pub temperature: f64,
    pub pain_scale: u8,
    pub consciousness: String,
    pub chief_complaint: String,
    pub age: u32,
}

/// Outcome of recording vitals: the stored record and its classification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordVitalsRes {
    pub record_id: Uuid,
    pub level: u8,
    pub matched_rule_ids: Vec<String>,
    pub rationale: String,
    pub classified_at: DateTime<Utc>,
}

/// One row of the projected waiting-room queue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueEntryRes {
    pub encounter_id: Uuid,
    pub patient_name: String,
    pub level: u8,
    pub classified_at: DateTime<Utc>,
}

/// Projected queue plus the encounters still awaiting classification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueRes {
    pub ordered: Vec<QueueEntryRes>,
    /// Encounters with no classification yet — shown as "pending
    /// classification", never silently dropped.
    pub pending: Vec<Uuid>,
}

/// Request to atomically replace the active rule set.
///
/// With `source` set, the submitted YAML is loaded; otherwise the configured
/// rules file is re-read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReloadRulesReq {
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReloadRulesRes {
    pub rules: usize,
}

/// The active rule set in canonical, re-loadable YAML form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RulesRes {
    pub rules: usize,
    pub source: String,
}
