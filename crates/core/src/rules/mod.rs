//! Classification rules and rule-set loading.
//!
//! A [`RuleSet`] is the ordered, validated collection of rules the engine
//! evaluates against. It is immutable once constructed: hot reload builds a
//! whole new set and swaps it in atomically (see
//! [`crate::engine::ClassificationEngine`]), so an evaluation in flight never
//! observes a partially-updated set.

pub mod parser;
pub mod predicate;

use serde::{Deserialize, Serialize};

use saviser_types::{NonEmptyText, PriorityLevel};

use crate::rules::predicate::Predicate;
use crate::{TriageError, TriageResult};

/// One classification rule: a predicate, the urgency level it assigns, and
/// the human-readable rationale recorded when it matches.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: NonEmptyText,
    pub priority: PriorityLevel,
    #[serde(rename = "when")]
    pub predicate: Predicate,
    pub rationale: NonEmptyText,
}

/// Raw rule entry as it appears in a definition file, before validation.
#[derive(Debug, Deserialize)]
struct RawRule {
    id: String,
    priority: i64,
    when: String,
    rationale: String,
}

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    rules: Vec<RawRule>,
}

#[derive(Debug, Serialize)]
struct RuleFileOut<'a> {
    rules: &'a [Rule],
}

/// An ordered, validated, immutable set of classification rules.
///
/// Rules are held most-urgent-first (stable within a level, preserving
/// definition order). Construction guarantees a catch-all rule exists at the
/// lowest-urgency level, so evaluating a well-formed set always matches at
/// least one rule.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parses and validates a YAML rule definition source.
    ///
    /// The expected shape is a `rules:` list of
    /// `{ id, priority, when, rationale }` entries, with `when` written in
    /// the predicate expression language (see [`parser`]).
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::YamlDeserialization`] if the document is not
    /// valid YAML of that shape, and [`TriageError::InvalidRuleDefinition`]
    /// when the content is structurally wrong:
    /// - empty rule list, blank id/rationale, duplicate rule id
    /// - priority outside the 1-5 scale
    /// - malformed predicate or one referencing an unknown field
    /// - the set of used levels is not contiguous from level 1
    /// - no `ALWAYS` catch-all at the lowest-urgency level, or an `ALWAYS`
    ///   rule above it (which would make every less urgent rule unreachable)
    pub fn load(source: &str) -> TriageResult<Self> {
        let raw: RawRuleFile =
            serde_yaml::from_str(source).map_err(TriageError::YamlDeserialization)?;

        if raw.rules.is_empty() {
            return Err(TriageError::InvalidRuleDefinition(
                "rule set contains no rules".into(),
            ));
        }

        let mut rules = Vec::with_capacity(raw.rules.len());
        for entry in raw.rules {
            let id = NonEmptyText::new(&entry.id).map_err(|_| {
                TriageError::InvalidRuleDefinition("rule id cannot be empty".into())
            })?;

            if rules.iter().any(|r: &Rule| r.id == id) {
                return Err(TriageError::InvalidRuleDefinition(format!(
                    "duplicate rule id {:?}",
                    id.as_str()
                )));
            }

            let priority = u8::try_from(entry.priority)
                .ok()
                .and_then(|p| PriorityLevel::new(p).ok())
                .ok_or_else(|| {
                    TriageError::InvalidRuleDefinition(format!(
                        "rule {:?}: priority {} outside the 1-5 scale",
                        id.as_str(),
                        entry.priority
                    ))
                })?;

            let predicate = parser::parse_predicate(&entry.when)?;

            let rationale = NonEmptyText::new(&entry.rationale).map_err(|_| {
                TriageError::InvalidRuleDefinition(format!(
                    "rule {:?}: rationale cannot be empty",
                    id.as_str()
                ))
            })?;

            rules.push(Rule {
                id,
                priority,
                predicate,
                rationale,
            });
        }

        validate_levels(&rules)?;

        // Most urgent first; definition order is preserved within a level so
        // audit output lists same-level co-matches the way the file does.
        rules.sort_by_key(|rule| rule.priority);

        Ok(Self { rules })
    }

    /// Reads and loads a rule definition file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::FileRead`] if the file cannot be read, plus
    /// everything [`RuleSet::load`] can return.
    pub fn load_from_path(path: &std::path::Path) -> TriageResult<Self> {
        let source = std::fs::read_to_string(path).map_err(TriageError::FileRead)?;
        Self::load(&source)
    }

    /// Rules in evaluation order (most urgent first).
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serializes the set back to YAML in canonical form.
    ///
    /// Predicates are emitted as their canonical expression text, so the
    /// output is accepted by [`RuleSet::load`] and yields an equivalent set.
    pub fn to_source(&self) -> String {
        // Rule and its fields serialize to plain YAML scalars, which cannot fail.
        serde_yaml::to_string(&RuleFileOut { rules: &self.rules })
            .unwrap_or_else(|e| unreachable!("rule set serialization failed: {e}"))
    }

    /// Builds a set from already-validated rules, skipping structural checks.
    ///
    /// Only for tests that need a deliberately defective set (e.g. one with
    /// no catch-all, to exercise the `NoMatchingRule` path).
    #[cfg(test)]
    pub(crate) fn from_rules_unchecked(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }
}

fn validate_levels(rules: &[Rule]) -> TriageResult<()> {
    let mut used = [false; 5];
    for rule in rules {
        used[(rule.priority.as_u8() - 1) as usize] = true;
    }

    let lowest_urgency = rules
        .iter()
        .map(|rule| rule.priority)
        .max()
        .unwrap_or(PriorityLevel::LEAST_URGENT);

    if !used[0] {
        return Err(TriageError::InvalidRuleDefinition(
            "rule set defines no level-1 (most urgent) rule".into(),
        ));
    }
    for level in 1..lowest_urgency.as_u8() {
        if !used[(level - 1) as usize] {
            return Err(TriageError::InvalidRuleDefinition(format!(
                "urgency levels are non-contiguous: level {} is unused but level {} is",
                level,
                lowest_urgency.as_u8()
            )));
        }
    }

    let mut has_catch_all = false;
    for rule in rules {
        if rule.predicate == Predicate::Always {
            if rule.priority != lowest_urgency {
                return Err(TriageError::InvalidRuleDefinition(format!(
                    "rule {:?}: ALWAYS is only allowed at the lowest-urgency level ({})",
                    rule.id.as_str(),
                    lowest_urgency.as_u8()
                )));
            }
            has_catch_all = true;
        }
    }
    if !has_catch_all {
        return Err(TriageError::InvalidRuleDefinition(format!(
            "rule set has no ALWAYS catch-all at the lowest-urgency level ({})",
            lowest_urgency.as_u8()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SOURCE: &str = r#"
rules:
  - id: spo2-critical
    priority: 1
    when: "spo2 < 90"
    rationale: "Oxygen saturation below 90%"
  - id: shock
    priority: 1
    when: "systolic_bp < 90 AND heart_rate > 120"
    rationale: "Hypotension with tachycardia"
  - id: reduced-consciousness
    priority: 2
    when: "consciousness == VERBAL OR consciousness == PAIN"
    rationale: "Reduced consciousness (responsive)"
  - id: severe-pain
    priority: 3
    when: "pain_scale >= 7"
    rationale: "Severe pain"
  - id: moderate-pain
    priority: 4
    when: "pain_scale >= 4"
    rationale: "Moderate pain"
  - id: default
    priority: 5
    when: "ALWAYS"
    rationale: "No urgent findings"
"#;

    #[test]
    fn test_loads_valid_source_most_urgent_first() {
        let set = RuleSet::load(VALID_SOURCE).expect("should load");
        assert_eq!(set.len(), 6);
        let levels: Vec<u8> = set.rules().iter().map(|r| r.priority.as_u8()).collect();
        assert_eq!(levels, vec![1, 1, 2, 3, 4, 5]);
        // Stable within a level: file order kept.
        assert_eq!(set.rules()[0].id.as_str(), "spo2-critical");
        assert_eq!(set.rules()[1].id.as_str(), "shock");
    }

    #[test]
    fn test_rejects_missing_catch_all() {
        let source = r#"
rules:
  - id: spo2-critical
    priority: 1
    when: "spo2 < 90"
    rationale: "Oxygen saturation below 90%"
  - id: severe-pain
    priority: 2
    when: "pain_scale >= 7"
    rationale: "Severe pain"
"#;
        let err = RuleSet::load(source).expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("catch-all"))
        );
    }

    #[test]
    fn test_rejects_non_contiguous_levels() {
        let source = r#"
rules:
  - id: spo2-critical
    priority: 1
    when: "spo2 < 90"
    rationale: "Oxygen saturation below 90%"
  - id: default
    priority: 5
    when: "ALWAYS"
    rationale: "No urgent findings"
"#;
        let err = RuleSet::load(source).expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("non-contiguous"))
        );
    }

    #[test]
    fn test_rejects_catch_all_above_lowest_level() {
        let source = r#"
rules:
  - id: everything
    priority: 1
    when: "ALWAYS"
    rationale: "Shadows everything"
  - id: default
    priority: 2
    when: "ALWAYS"
    rationale: "Unreachable"
"#;
        let err = RuleSet::load(source).expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("lowest-urgency"))
        );
    }

    #[test]
    fn test_rejects_duplicate_rule_id() {
        let source = r#"
rules:
  - id: default
    priority: 1
    when: "spo2 < 90"
    rationale: "Oxygen saturation below 90%"
  - id: default
    priority: 1
    when: "ALWAYS"
    rationale: "No urgent findings"
"#;
        let err = RuleSet::load(source).expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_rejects_priority_out_of_range() {
        let source = r#"
rules:
  - id: bad
    priority: 9
    when: "ALWAYS"
    rationale: "Out of scale"
"#;
        let err = RuleSet::load(source).expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("1-5 scale"))
        );
    }

    #[test]
    fn test_rejects_unknown_predicate_field() {
        let source = r#"
rules:
  - id: bad
    priority: 1
    when: "pulse < 50"
    rationale: "Unknown field"
"#;
        let err = RuleSet::load(source).expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("unknown field"))
        );
    }

    #[test]
    fn test_rejects_non_yaml_source() {
        let err = RuleSet::load("not: [valid").expect_err("should reject");
        assert!(matches!(err, TriageError::YamlDeserialization(_)));
    }

    #[test]
    fn test_canonical_source_round_trips() {
        let set = RuleSet::load(VALID_SOURCE).unwrap();
        let canonical = set.to_source();
        let reloaded = RuleSet::load(&canonical).expect("canonical source should re-load");
        assert_eq!(reloaded.len(), set.len());
        for (a, b) in set.rules().iter().zip(reloaded.rules()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.priority, b.priority);
            assert_eq!(a.predicate, b.predicate);
            assert_eq!(a.rationale, b.rationale);
        }
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, VALID_SOURCE).unwrap();
        assert!(RuleSet::load_from_path(&path).is_ok());

        let missing = dir.path().join("nope.yaml");
        let err = RuleSet::load_from_path(&missing).expect_err("should fail");
        assert!(matches!(err, TriageError::FileRead(_)));
    }
}
