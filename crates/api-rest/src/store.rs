//! In-memory encounter store.
//!
//! Stands in for the persistence collaborator the spec keeps external: it
//! owns the active encounters behind one lock and hands the queue projector
//! point-in-time snapshots, never live references. Swapping it for a real
//! database changes this module only.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use api_shared::EncounterSummary;
use saviser_core::{
    ClassificationResult, Encounter, EncounterSnapshot, NonEmptyText, QueueProjection,
    TriageError, VitalSignsRecord,
};

/// Errors raised by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("encounter {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Core(#[from] TriageError),
}

/// Thread-safe registry of active encounters.
#[derive(Default)]
pub struct EncounterStore {
    encounters: RwLock<HashMap<Uuid, Encounter>>,
}

impl EncounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Encounter>> {
        match self.encounters.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Encounter>> {
        match self.encounters.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Opens a new encounter and returns its id.
    pub fn open(&self, patient_name: NonEmptyText) -> Uuid {
        let encounter = Encounter::open(patient_name);
        let id = encounter.id();
        self.write().insert(id, encounter);
        id
    }

    /// Appends a record and its classification to an encounter.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown encounter; the core's
    /// `StaleSnapshot` if the result does not belong to the record set (the
    /// handlers construct record and result together, so that indicates a
    /// caller bug rather than a user error).
    pub fn attach(
        &self,
        encounter_id: Uuid,
        record: VitalSignsRecord,
        result: ClassificationResult,
    ) -> Result<(), StoreError> {
        let mut encounters = self.write();
        let encounter = encounters
            .get_mut(&encounter_id)
            .ok_or(StoreError::NotFound(encounter_id))?;
        encounter.add_record(record);
        encounter.add_result(result)?;
        Ok(())
    }

    /// Summaries of all encounters, newest-opened last.
    pub fn summaries(&self) -> Vec<EncounterSummary> {
        let encounters = self.read();
        let mut summaries: Vec<EncounterSummary> = encounters
            .values()
            .map(|encounter| EncounterSummary {
                encounter_id: encounter.id(),
                patient_name: encounter.patient_name().to_string(),
                opened_at: encounter.opened_at(),
                level: encounter.latest_result().map(|r| r.level().as_u8()),
                classified_at: encounter.latest_result().map(|r| r.classified_at()),
            })
            .collect();
        summaries.sort_by_key(|s| s.opened_at);
        summaries
    }

    /// Projects the waiting-room queue from one consistent snapshot,
    /// returning the projection together with the patient names for display.
    ///
    /// # Errors
    ///
    /// Propagates `StaleSnapshot` from the projector; the caller should
    /// simply retry, which takes a fresh snapshot.
    pub fn project_queue(&self) -> Result<(QueueProjection, HashMap<Uuid, String>), StoreError> {
        // Copy snapshots and names out under one read lock so the projector
        // sees a single consistent view.
        let (snapshots, names): (Vec<EncounterSnapshot>, HashMap<Uuid, String>) = {
            let encounters = self.read();
            (
                encounters.values().map(Encounter::snapshot).collect(),
                encounters
                    .values()
                    .map(|e| (e.id(), e.patient_name().to_string()))
                    .collect(),
            )
        };

        let projection = saviser_core::project(&snapshots)?;
        Ok((projection, names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saviser_core::{
        evaluate_against, ClassificationEngine, ConsciousnessLevel, RuleSet, VitalSignsInput,
    };

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

    fn vitals(spo2: u32) -> VitalSignsRecord {
        VitalSignsRecord::new(VitalSignsInput {
            heart_rate: 80,
            systolic_bp: 120,
            diastolic_bp: 80,
            respiratory_rate: 16,
            spo2,
            temperature: 37.0,
            pain_scale: 2,
            consciousness: ConsciousnessLevel::Alert,
            chief_complaint: "control".into(),
            age: 41,
        })
        .unwrap()
    }

    #[test]
    fn test_open_attach_and_summarise() {
        let engine = ClassificationEngine::new(RuleSet::load(SOURCE).unwrap());
        let store = EncounterStore::new();
        let id = store.open(NonEmptyText::new("Luis Prado").unwrap());

        let record = vitals(86);
        let result = engine.evaluate(&record).unwrap();
        store.attach(id, record, result).unwrap();

        let summaries = store.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].patient_name, "Luis Prado");
        assert_eq!(summaries[0].level, Some(1));
    }

    #[test]
    fn test_attach_to_unknown_encounter() {
        let engine = ClassificationEngine::new(RuleSet::load(SOURCE).unwrap());
        let store = EncounterStore::new();

        let record = vitals(97);
        let result = engine.evaluate(&record).unwrap();
        let err = store
            .attach(Uuid::new_v4(), record, result)
            .expect_err("should fail");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_queue_projection_separates_pending() {
        let rules = RuleSet::load(SOURCE).unwrap();
        let store = EncounterStore::new();

        let classified = store.open(NonEmptyText::new("Ana").unwrap());
        let waiting = store.open(NonEmptyText::new("Ben").unwrap());

        let record = vitals(86);
        let result = evaluate_against(&rules, &record).unwrap();
        store.attach(classified, record, result).unwrap();

        let (projection, names) = store.project_queue().unwrap();
        assert_eq!(projection.ordered.len(), 1);
        assert_eq!(projection.ordered[0].encounter_id, classified);
        assert_eq!(projection.pending, vec![waiting]);
        assert_eq!(names.get(&classified).map(String::as_str), Some("Ana"));
    }
}
