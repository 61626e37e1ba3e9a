//! Patient encounters and their append-only history.
//!
//! An encounter exclusively owns the sequence of vital-sign records and
//! classification results produced during one episode of care. Both
//! sequences only ever grow: a correction or re-triage appends, it never
//! edits what was recorded before.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use saviser_types::{NonEmptyText, PriorityLevel};

use crate::engine::ClassificationResult;
use crate::vitals::VitalSignsRecord;
use crate::{TriageError, TriageResult};

/// One patient's episode of care.
#[derive(Debug, Clone, Serialize)]
pub struct Encounter {
    id: Uuid,
    patient_name: NonEmptyText,
    opened_at: DateTime<Utc>,
    records: Vec<VitalSignsRecord>,
    results: Vec<ClassificationResult>,
}

impl Encounter {
    /// Opens a new, empty encounter for the named patient.
    pub fn open(patient_name: NonEmptyText) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_name,
            opened_at: Utc::now(),
            records: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn patient_name(&self) -> &NonEmptyText {
        &self.patient_name
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// All vital-sign records, oldest first.
    pub fn records(&self) -> &[VitalSignsRecord] {
        &self.records
    }

    /// All classification results, oldest first.
    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    /// Appends a new vital-signs record; later records supersede earlier
    /// ones without erasing them.
    pub fn add_record(&mut self, record: VitalSignsRecord) {
        self.records.push(record);
    }

    /// Appends a classification result.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::StaleSnapshot`] if the result references a
    /// record this encounter does not own; that means the caller classified
    /// against data from some other encounter or an outdated view.
    pub fn add_result(&mut self, result: ClassificationResult) -> TriageResult<()> {
        if !self.records.iter().any(|r| r.id() == result.record_id()) {
            return Err(TriageError::StaleSnapshot(format!(
                "result references record {} which encounter {} does not own",
                result.record_id(),
                self.id
            )));
        }
        self.results.push(result);
        Ok(())
    }

    /// The most recent classification, if any evaluation has completed.
    pub fn latest_result(&self) -> Option<&ClassificationResult> {
        self.results.last()
    }

    /// Point-in-time projection input for the waiting-room queue.
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            encounter_id: self.id,
            latest: self.latest_result().map(|result| LatestClassification {
                level: result.level(),
                classified_at: result.classified_at(),
            }),
        }
    }
}

/// The latest classification of an encounter, as seen by the queue.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatestClassification {
    pub level: PriorityLevel,
    pub classified_at: DateTime<Utc>,
}

/// Immutable point-in-time view of one encounter for queue projection.
///
/// `latest` is `None` while the encounter is still pending classification.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSnapshot {
    pub encounter_id: Uuid,
    pub latest: Option<LatestClassification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate_against;
    use crate::rules::RuleSet;
    use crate::vitals::{ConsciousnessLevel, VitalSignsInput};

    const SOURCE: &str = r#"
rules:
  - id: spo2-critical
    priority: 1
    when: "spo2 < 90"
    rationale: "Oxygen saturation below 90%"
  - id: default
    priority: 2
    when: "ALWAYS"
    rationale: "No urgent findings"
"#;

    fn record(spo2: u32) -> VitalSignsRecord {
        VitalSignsRecord::new(VitalSignsInput {
            heart_rate: 70,
            systolic_bp: 115,
            diastolic_bp: 75,
            respiratory_rate: 13,
            spo2,
            temperature: 36.5,
            pain_scale: 1,
            consciousness: ConsciousnessLevel::Alert,
            chief_complaint: "checkup".into(),
            age: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_history_is_append_only_and_supersedes() {
        let rules = RuleSet::load(SOURCE).unwrap();
        let mut encounter = Encounter::open(NonEmptyText::new("Ana Torres").unwrap());
        assert!(encounter.latest_result().is_none());
        assert!(encounter.snapshot().latest.is_none());

        let first = record(99);
        let first_result = evaluate_against(&rules, &first).unwrap();
        encounter.add_record(first);
        encounter.add_result(first_result).unwrap();
        assert_eq!(encounter.latest_result().unwrap().level().as_u8(), 2);

        // Re-triage with worse saturation supersedes but keeps history.
        let second = record(85);
        let second_result = evaluate_against(&rules, &second).unwrap();
        encounter.add_record(second);
        encounter.add_result(second_result).unwrap();

        assert_eq!(encounter.records().len(), 2);
        assert_eq!(encounter.results().len(), 2);
        assert_eq!(encounter.latest_result().unwrap().level().as_u8(), 1);
        assert_eq!(encounter.snapshot().latest.unwrap().level.as_u8(), 1);
    }

    #[test]
    fn test_rejects_result_for_foreign_record() {
        let rules = RuleSet::load(SOURCE).unwrap();
        let mut encounter = Encounter::open(NonEmptyText::new("Ana Torres").unwrap());
        encounter.add_record(record(99));

        let foreign = record(85);
        let foreign_result = evaluate_against(&rules, &foreign).unwrap();
        let err = encounter.add_result(foreign_result).expect_err("should reject");
        assert!(matches!(err, TriageError::StaleSnapshot(_)));
        assert!(encounter.results().is_empty());
    }
}
