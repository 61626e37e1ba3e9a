//! The triage classification engine.
//!
//! `evaluate` is a pure function of (record, rule-set snapshot): it walks the
//! rules most-urgent-first, lets the FIRST match fix the canonical level
//! (most-urgent-wins — triage safety doctrine is to never under-triage), and
//! keeps walking so every match is retained for audit. Persistence of the
//! result is the caller's job; the engine performs no I/O.
//!
//! The active [`RuleSet`] sits behind an atomic snapshot swap: readers clone
//! an `Arc` under a read lock, reload validates the new set fully before
//! swapping it in under the write lock. An evaluation in flight therefore
//! runs against an entirely-old or entirely-new set, never a mix, and a
//! failed reload leaves the last-known-good set active.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use saviser_types::{NonEmptyText, PriorityLevel};

use crate::rules::RuleSet;
use crate::vitals::VitalSignsRecord;
use crate::{TriageError, TriageResult};

/// One rule that matched during an evaluation, kept for audit.
#[derive(Debug, Clone, Serialize)]
pub struct RuleMatch {
    pub rule_id: NonEmptyText,
    pub level: PriorityLevel,
    pub rationale: NonEmptyText,
}

/// The immutable outcome of one evaluation.
///
/// Exactly one canonical level is stored even when several rules matched;
/// the full match list is retained so the decision can be audited. A result
/// is never edited: re-triage evaluates a new record and appends a new
/// result to the encounter.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    record_id: Uuid,
    level: PriorityLevel,
    matches: Vec<RuleMatch>,
    classified_at: DateTime<Utc>,
}

impl ClassificationResult {
    /// The vital-signs record this result was derived from.
    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    /// The canonical (most urgent) assigned level.
    pub fn level(&self) -> PriorityLevel {
        self.level
    }

    /// Every rule that matched, most urgent first. Never empty.
    pub fn matches(&self) -> &[RuleMatch] {
        &self.matches
    }

    /// Identifiers of all matched rules, in match order.
    pub fn matched_rule_ids(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.rule_id.as_str()).collect()
    }

    /// Combined rationale text for display, one clause per matched rule.
    pub fn rationale(&self) -> String {
        self.matches
            .iter()
            .map(|m| m.rationale.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn classified_at(&self) -> DateTime<Utc> {
        self.classified_at
    }
}

/// Evaluates a record against a pinned rule-set snapshot.
///
/// Deterministic: the same record and rule set always produce the same level
/// and match list (only the `classified_at` stamp differs between calls).
///
/// # Errors
///
/// Returns [`TriageError::NoMatchingRule`] if no rule matched. With a
/// validated [`RuleSet`] this cannot happen (the catch-all is structural),
/// so hitting it means the active set is defective; it is surfaced rather
/// than masked because silently defaulting a level could under-prioritise a
/// patient.
pub fn evaluate_against(rules: &RuleSet, record: &VitalSignsRecord) -> TriageResult<ClassificationResult> {
    let mut matches = Vec::new();

    for rule in rules.rules() {
        if rule.predicate.matches(record) {
            matches.push(RuleMatch {
                rule_id: rule.id.clone(),
                level: rule.priority,
                rationale: rule.rationale.clone(),
            });
        }
    }

    // Rules are ordered most-urgent-first, so the first match carries the
    // canonical level; later matches are audit trail only.
    let level = match matches.first() {
        Some(first) => first.level,
        None => {
            return Err(TriageError::NoMatchingRule {
                record_id: record.id(),
            });
        }
    };

    tracing::debug!(
        record_id = %record.id(),
        level = level.as_u8(),
        matched = matches.len(),
        "classified vital signs record"
    );

    Ok(ClassificationResult {
        record_id: record.id(),
        level,
        matches,
        classified_at: Utc::now(),
    })
}

/// Deterministic, auditable mapping from vital signs to a classification.
///
/// Safe to share across any number of worker threads: evaluation takes a
/// snapshot and has no internal concurrency, and [`reload`](Self::reload) is
/// the only mutation.
pub struct ClassificationEngine {
    active: RwLock<Arc<RuleSet>>,
}

impl ClassificationEngine {
    /// Creates an engine with the given initial rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(rules)),
        }
    }

    /// The currently active rule-set snapshot.
    ///
    /// The returned `Arc` is pinned: a concurrent reload swaps the engine's
    /// pointer but never mutates a set already handed out.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock only means a panic elsewhere; the Arc inside
            // is still a fully-constructed set.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Evaluates a validated record against the active rule set.
    ///
    /// See [`evaluate_against`] for the algorithm and error contract.
    pub fn evaluate(&self, record: &VitalSignsRecord) -> TriageResult<ClassificationResult> {
        let snapshot = self.snapshot();
        evaluate_against(&snapshot, record)
    }

    /// Atomically replaces the active rule set from a definition source.
    ///
    /// The new source is parsed and validated in full before the swap; on
    /// any error the previous set stays active. Evaluations in flight finish
    /// against the snapshot they started with.
    ///
    /// # Errors
    ///
    /// Everything [`RuleSet::load`] can return.
    pub fn reload(&self, source: &str) -> TriageResult<()> {
        let new_set = RuleSet::load(source)?;
        self.install(new_set);
        Ok(())
    }

    /// Atomically replaces the active rule set from a file.
    ///
    /// # Errors
    ///
    /// Everything [`RuleSet::load_from_path`] can return.
    pub fn reload_from_path(&self, path: &std::path::Path) -> TriageResult<()> {
        let new_set = RuleSet::load_from_path(path)?;
        self.install(new_set);
        Ok(())
    }

    fn install(&self, new_set: RuleSet) {
        let count = new_set.len();
        let new_arc = Arc::new(new_set);
        match self.active.write() {
            Ok(mut guard) => *guard = new_arc,
            Err(poisoned) => *poisoned.into_inner() = new_arc,
        }
        tracing::info!(rules = count, "installed new rule set");
    }
}
