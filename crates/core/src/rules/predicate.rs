//! Rule predicates as a tagged expression tree.
//!
//! Predicates are data, never executable code: a tree of comparison leaves
//! and logical combinators that can be audited, serialized, and hot-reloaded
//! safely. The textual form (see [`super::parser`]) is canonical — `Display`
//! emits text the parser re-reads into an identical tree.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::complaint::SymptomCategory;
use crate::vitals::{ConsciousnessLevel, VitalSignsRecord};

/// A vital-sign field a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    HeartRate,
    SystolicBp,
    DiastolicBp,
    RespiratoryRate,
    Spo2,
    Temperature,
    PainScale,
    Age,
    Consciousness,
    Symptom,
}

impl Field {
    /// Canonical field name used in predicate expressions.
    pub fn name(self) -> &'static str {
        match self {
            Field::HeartRate => "heart_rate",
            Field::SystolicBp => "systolic_bp",
            Field::DiastolicBp => "diastolic_bp",
            Field::RespiratoryRate => "respiratory_rate",
            Field::Spo2 => "spo2",
            Field::Temperature => "temperature",
            Field::PainScale => "pain_scale",
            Field::Age => "age",
            Field::Consciousness => "consciousness",
            Field::Symptom => "symptom",
        }
    }

    /// Looks a field up by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "heart_rate" => Some(Field::HeartRate),
            "systolic_bp" => Some(Field::SystolicBp),
            "diastolic_bp" => Some(Field::DiastolicBp),
            "respiratory_rate" => Some(Field::RespiratoryRate),
            "spo2" => Some(Field::Spo2),
            "temperature" => Some(Field::Temperature),
            "pain_scale" => Some(Field::PainScale),
            "age" => Some(Field::Age),
            "consciousness" => Some(Field::Consciousness),
            "symptom" => Some(Field::Symptom),
            _ => None,
        }
    }

    /// True for fields carrying a categorical value rather than a number.
    pub fn is_categorical(self) -> bool {
        matches!(self, Field::Consciousness | Field::Symptom)
    }
}

/// Comparison operators supported by the predicate language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
        }
    }

    fn holds_f64(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }
}

/// Right-hand side of a comparison, typed to the field it compares against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Consciousness(ConsciousnessLevel),
    Symptom(SymptomCategory),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Consciousness(level) => f.write_str(level.as_token()),
            Value::Symptom(symptom) => f.write_str(symptom.as_token()),
        }
    }
}

/// A boolean expression over a [`VitalSignsRecord`].
///
/// `Always` is the catch-all literal: it matches every record, and rule-set
/// validation requires exactly this literal on the lowest-urgency rule so
/// that a well-formed set can never fail to classify.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: Field,
        op: CompareOp,
        value: Value,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Always,
}

impl Predicate {
    /// Evaluates the predicate against a validated record.
    ///
    /// Pure and total: validated records always carry a value for every
    /// field, so evaluation cannot fail.
    pub fn matches(&self, record: &VitalSignsRecord) -> bool {
        match self {
            Predicate::Compare { field, op, value } => compare(record, *field, *op, *value),
            Predicate::And(children) => children.iter().all(|child| child.matches(record)),
            Predicate::Or(children) => children.iter().any(|child| child.matches(record)),
            Predicate::Not(inner) => !inner.matches(record),
            Predicate::Always => true,
        }
    }

    // Binding strength for canonical text: OR binds loosest, then AND,
    // then NOT; leaves never need parentheses.
    fn precedence(&self) -> u8 {
        match self {
            Predicate::Or(_) => 0,
            Predicate::And(_) => 1,
            Predicate::Not(_) => 2,
            Predicate::Compare { .. } | Predicate::Always => 3,
        }
    }

    fn fmt_child(&self, child: &Predicate, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if child.precedence() <= self.precedence() && !matches!(child, Predicate::Not(_)) {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }
}

fn compare(record: &VitalSignsRecord, field: Field, op: CompareOp, value: Value) -> bool {
    match (field, value) {
        (Field::HeartRate, Value::Number(n)) => op.holds_f64(record.heart_rate() as f64, n),
        (Field::SystolicBp, Value::Number(n)) => op.holds_f64(record.systolic_bp() as f64, n),
        (Field::DiastolicBp, Value::Number(n)) => op.holds_f64(record.diastolic_bp() as f64, n),
        (Field::RespiratoryRate, Value::Number(n)) => {
            op.holds_f64(record.respiratory_rate() as f64, n)
        }
        (Field::Spo2, Value::Number(n)) => op.holds_f64(record.spo2() as f64, n),
        (Field::Temperature, Value::Number(n)) => op.holds_f64(record.temperature(), n),
        (Field::PainScale, Value::Number(n)) => op.holds_f64(record.pain_scale() as f64, n),
        (Field::Age, Value::Number(n)) => op.holds_f64(record.age() as f64, n),
        (Field::Consciousness, Value::Consciousness(level)) => record.consciousness() == level,
        (Field::Symptom, Value::Symptom(symptom)) => record.symptom() == symptom,
        // The parser rejects mistyped comparisons, so a tree built through
        // the public constructors never reaches these arms.
        _ => false,
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { field, op, value } => {
                write!(f, "{} {} {}", field.name(), op.symbol(), value)
            }
            Predicate::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    self.fmt_child(child, f)?;
                }
                Ok(())
            }
            Predicate::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    self.fmt_child(child, f)?;
                }
                Ok(())
            }
            Predicate::Not(inner) => {
                f.write_str("NOT ")?;
                self.fmt_child(inner, f)
            }
            Predicate::Always => f.write_str("ALWAYS"),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
