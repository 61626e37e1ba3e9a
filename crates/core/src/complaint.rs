//! Chief-complaint categorisation.
//!
//! Rule predicates must stay type-safe, so the free-text chief complaint is
//! mapped into a closed set of symptom categories at record construction.
//! The mapping is a pure keyword scan; anything it does not recognise falls
//! through to [`SymptomCategory::General`] rather than inventing a category.
//! Keywords cover English and Spanish terms since intake staff record
//! complaints in either.

use serde::{Deserialize, Serialize};

/// Closed set of symptom categories derivable from a chief complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymptomCategory {
    ChestPain,
    Breathing,
    Bleeding,
    Trauma,
    Burn,
    AbdominalPain,
    Fever,
    Headache,
    Obstetric,
    General,
}

impl SymptomCategory {
    /// Canonical token used in rule predicate expressions.
    pub fn as_token(self) -> &'static str {
        match self {
            SymptomCategory::ChestPain => "CHEST_PAIN",
            SymptomCategory::Breathing => "BREATHING",
            SymptomCategory::Bleeding => "BLEEDING",
            SymptomCategory::Trauma => "TRAUMA",
            SymptomCategory::Burn => "BURN",
            SymptomCategory::AbdominalPain => "ABDOMINAL_PAIN",
            SymptomCategory::Fever => "FEVER",
            SymptomCategory::Headache => "HEADACHE",
            SymptomCategory::Obstetric => "OBSTETRIC",
            SymptomCategory::General => "GENERAL",
        }
    }

    /// Parses a predicate token back into a symptom category.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "CHEST_PAIN" => Some(SymptomCategory::ChestPain),
            "BREATHING" => Some(SymptomCategory::Breathing),
            "BLEEDING" => Some(SymptomCategory::Bleeding),
            "TRAUMA" => Some(SymptomCategory::Trauma),
            "BURN" => Some(SymptomCategory::Burn),
            "ABDOMINAL_PAIN" => Some(SymptomCategory::AbdominalPain),
            "FEVER" => Some(SymptomCategory::Fever),
            "HEADACHE" => Some(SymptomCategory::Headache),
            "OBSTETRIC" => Some(SymptomCategory::Obstetric),
            "GENERAL" => Some(SymptomCategory::General),
            _ => None,
        }
    }
}

/// Keyword table, checked in order. Earlier rows win, so the more specific
/// or more dangerous presentations come first (chest pain before generic
/// pain, bleeding before trauma).
const KEYWORDS: &[(SymptomCategory, &[&str])] = &[
    (
        SymptomCategory::ChestPain,
        &["chest pain", "chest pressure", "dolor de pecho", "dolor toracico"],
    ),
    (
        SymptomCategory::Breathing,
        &[
            "short of breath",
            "shortness of breath",
            "can't breathe",
            "cannot breathe",
            "difficulty breathing",
            "wheezing",
            "dificultad para respirar",
            "falta de aire",
            "asfixia",
        ],
    ),
    (
        SymptomCategory::Bleeding,
        &["bleeding", "blood loss", "hemorrhage", "sangrado", "hemorragia"],
    ),
    (
        SymptomCategory::Burn,
        &["burn", "scald", "quemadura"],
    ),
    (
        SymptomCategory::Trauma,
        &[
            "fracture",
            "broken",
            "fall", "fell",
            "accident",
            "injury",
            "wound",
            "fractura",
            "caida",
            "golpe",
            "herida",
            "accidente",
        ],
    ),
    (
        SymptomCategory::AbdominalPain,
        &["abdominal pain", "stomach pain", "belly pain", "dolor abdominal", "dolor de estomago"],
    ),
    (
        SymptomCategory::Fever,
        &["fever", "high temperature", "fiebre", "calentura"],
    ),
    (
        SymptomCategory::Headache,
        &["headache", "migraine", "dolor de cabeza", "migrana", "cefalea"],
    ),
    (
        SymptomCategory::Obstetric,
        &["labor", "contractions", "pregnan", "parto", "contracciones", "embaraz"],
    ),
];

/// Maps a free-text chief complaint into the closed symptom set.
///
/// Matching is case-insensitive substring search over the keyword table;
/// the first matching row wins. Unrecognised text maps to
/// [`SymptomCategory::General`].
pub fn classify_complaint(complaint: &str) -> SymptomCategory {
    let normalised = complaint.to_lowercase();
    for (category, keywords) in KEYWORDS {
        if keywords.iter().any(|kw| normalised.contains(kw)) {
            return *category;
        }
    }
    SymptomCategory::General
}
