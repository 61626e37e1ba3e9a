//! Waiting-room queue projection.
//!
//! Turns a consistent snapshot of active encounters into the total order a
//! waiting-room display shows. The projection is a pure function of its
//! input and is recomputed from scratch on every change; there is no
//! incremental patching to go stale.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use saviser_types::PriorityLevel;

use crate::encounter::EncounterSnapshot;
use crate::{TriageError, TriageResult};

/// One classified encounter's place in the projected queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub encounter_id: Uuid,
    pub level: PriorityLevel,
    pub classified_at: DateTime<Utc>,
}

/// The projected waiting-room order.
///
/// Encounters without a classification yet are reported in `pending`, never
/// silently dropped: an unclassified patient must stay visible to staff.
#[derive(Debug, Clone, Serialize)]
pub struct QueueProjection {
    pub ordered: Vec<QueueEntry>,
    pub pending: Vec<Uuid>,
}

/// Projects a point-in-time set of encounter snapshots into display order.
///
/// Ordering: urgency level ascending (level 1 first), then classification
/// time ascending (first classified, first served within a level — this is
/// what keeps lower-priority patients from being starved), then encounter id
/// as a final tie-break so the order is total and reproducible.
///
/// The caller is responsible for the snapshots being one consistent view;
/// callers holding live state should copy it out before projecting.
///
/// # Errors
///
/// Returns [`TriageError::StaleSnapshot`] if the same encounter appears more
/// than once, since that can only come from an inconsistent read. The remedy
/// is to take a fresh snapshot and project again.
pub fn project(snapshots: &[EncounterSnapshot]) -> TriageResult<QueueProjection> {
    let mut seen = std::collections::HashSet::with_capacity(snapshots.len());
    for snapshot in snapshots {
        if !seen.insert(snapshot.encounter_id) {
            return Err(TriageError::StaleSnapshot(format!(
                "encounter {} appears more than once in the snapshot",
                snapshot.encounter_id
            )));
        }
    }

    let mut ordered = Vec::new();
    let mut pending = Vec::new();

    for snapshot in snapshots {
        match &snapshot.latest {
            Some(latest) => ordered.push(QueueEntry {
                encounter_id: snapshot.encounter_id,
                level: latest.level,
                classified_at: latest.classified_at,
            }),
            None => pending.push(snapshot.encounter_id),
        }
    }

    ordered.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then(a.classified_at.cmp(&b.classified_at))
            .then(a.encounter_id.cmp(&b.encounter_id))
    });

    Ok(QueueProjection { ordered, pending })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::LatestClassification;
    use chrono::TimeZone;

    fn classified(level: u8, minute: u32) -> EncounterSnapshot {
        EncounterSnapshot {
            encounter_id: Uuid::new_v4(),
            latest: Some(LatestClassification {
                level: PriorityLevel::new(level).unwrap(),
                classified_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, minute, 0).unwrap(),
            }),
        }
    }

    fn unclassified() -> EncounterSnapshot {
        EncounterSnapshot {
            encounter_id: Uuid::new_v4(),
            latest: None,
        }
    }

    #[test]
    fn test_orders_by_level_then_classification_time() {
        // Levels [3, 1, 1, 5] classified at t1 < t2 < t3 < t4.
        let snapshots = vec![
            classified(3, 1),
            classified(1, 2),
            classified(1, 3),
            classified(5, 4),
        ];
        let projection = project(&snapshots).unwrap();

        let expectation = [
            snapshots[1].encounter_id, // level 1, t2
            snapshots[2].encounter_id, // level 1, t3
            snapshots[0].encounter_id, // level 3
            snapshots[3].encounter_id, // level 5
        ];
        let actual: Vec<Uuid> = projection.ordered.iter().map(|e| e.encounter_id).collect();
        assert_eq!(actual, expectation);
        assert!(projection.pending.is_empty());
    }

    #[test]
    fn test_pending_encounters_are_reported_not_dropped() {
        let waiting = unclassified();
        let snapshots = vec![classified(2, 0), waiting.clone(), classified(4, 1)];
        let projection = project(&snapshots).unwrap();

        assert_eq!(projection.ordered.len(), 2);
        assert_eq!(projection.pending, vec![waiting.encounter_id]);
    }

    #[test]
    fn test_duplicate_encounter_is_a_stale_snapshot() {
        let snapshot = classified(2, 0);
        let err = project(&[snapshot.clone(), snapshot]).expect_err("should reject");
        assert!(matches!(err, TriageError::StaleSnapshot(_)));
    }

    #[test]
    fn test_projection_of_empty_snapshot_is_empty() {
        let projection = project(&[]).unwrap();
        assert!(projection.ordered.is_empty());
        assert!(projection.pending.is_empty());
    }

    #[test]
    fn test_projection_is_deterministic() {
        let snapshots = vec![classified(2, 5), classified(2, 5), classified(1, 9)];
        let first = project(&snapshots).unwrap();
        let second = project(&snapshots).unwrap();
        let ids = |p: &QueueProjection| p.ordered.iter().map(|e| e.encounter_id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }
}
