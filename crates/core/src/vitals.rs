//! Intake vital-sign snapshots.
//!
//! A [`VitalSignsRecord`] is the validated, immutable measurement set a
//! triage nurse captures at intake. Validation happens once, in the
//! constructor; everything downstream (the rule engine, the queue) can rely
//! on the bounds without re-checking. Records are never edited: a correction
//! is a new record appended to the encounter, superseding the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::complaint::{classify_complaint, SymptomCategory};
use crate::{TriageError, TriageResult};

/// AVPU consciousness scale captured at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsciousnessLevel {
    Alert,
    Verbal,
    Pain,
    Unresponsive,
}

impl ConsciousnessLevel {
    /// Canonical token used in rule predicate expressions.
    pub fn as_token(self) -> &'static str {
        match self {
            ConsciousnessLevel::Alert => "ALERT",
            ConsciousnessLevel::Verbal => "VERBAL",
            ConsciousnessLevel::Pain => "PAIN",
            ConsciousnessLevel::Unresponsive => "UNRESPONSIVE",
        }
    }

    /// Parses a predicate token back into a consciousness level.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ALERT" => Some(ConsciousnessLevel::Alert),
            "VERBAL" => Some(ConsciousnessLevel::Verbal),
            "PAIN" => Some(ConsciousnessLevel::Pain),
            "UNRESPONSIVE" => Some(ConsciousnessLevel::Unresponsive),
            _ => None,
        }
    }
}

/// Raw measurements as captured by intake staff, before validation.
///
/// This is the wire/input shape: the REST layer and the CLI deserialize it
/// directly. It only becomes a [`VitalSignsRecord`] by passing the bound
/// checks in [`VitalSignsRecord::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSignsInput {
    /// Heart rate in beats per minute.
    pub heart_rate: u32,
    /// Systolic blood pressure in mmHg.
    pub systolic_bp: u32,
    /// Diastolic blood pressure in mmHg.
    pub diastolic_bp: u32,
    /// Respiratory rate in breaths per minute.
    pub respiratory_rate: u32,
    /// Peripheral oxygen saturation as a percentage.
    pub spo2: u32,
    /// Body temperature in degrees Celsius.
    pub temperature: f64,
    /// Self-reported pain on the 0-10 scale.
    pub pain_scale: u8,
    /// AVPU consciousness level.
    pub consciousness: ConsciousnessLevel,
    /// Free-text chief complaint as stated at intake.
    pub chief_complaint: String,
    /// Age in years.
    pub age: u32,
}

// Physiological plausibility ceilings. Values above these are treated as
// data-entry errors, not extreme patients.
const MAX_HEART_RATE: u32 = 300;
const MAX_SYSTOLIC_BP: u32 = 300;
const MAX_DIASTOLIC_BP: u32 = 200;
const MAX_RESPIRATORY_RATE: u32 = 80;
const MAX_SPO2: u32 = 100;
const MIN_TEMPERATURE: f64 = 25.0;
const MAX_TEMPERATURE: f64 = 45.0;
const MAX_PAIN_SCALE: u8 = 10;
const MAX_AGE: u32 = 130;

/// A validated, immutable snapshot of a patient's vital signs at intake.
///
/// All numeric fields are inside physiologically plausible bounds and the
/// chief complaint has been mapped into the closed [`SymptomCategory`] set.
/// The capture timestamp and record id are fixed at construction.
#[derive(Debug, Clone, Serialize)]
pub struct VitalSignsRecord {
    id: Uuid,
    heart_rate: u32,
    systolic_bp: u32,
    diastolic_bp: u32,
    respiratory_rate: u32,
    spo2: u32,
    temperature: f64,
    pain_scale: u8,
    consciousness: ConsciousnessLevel,
    chief_complaint: String,
    symptom: SymptomCategory,
    age: u32,
    captured_at: DateTime<Utc>,
}

impl VitalSignsRecord {
    /// Validates raw intake measurements into an immutable record.
    ///
    /// The capture timestamp is stamped here and never changes; corrections
    /// must construct a new record.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidVitalSigns`] naming the offending field
    /// if any measurement is outside its plausible bound, or if the
    /// diastolic pressure exceeds the systolic pressure.
    pub fn new(input: VitalSignsInput) -> TriageResult<Self> {
        fn reject(field: &str, detail: String) -> TriageError {
            TriageError::InvalidVitalSigns(format!("{field}: {detail}"))
        }

        if input.heart_rate > MAX_HEART_RATE {
            return Err(reject(
                "heart_rate",
                format!("{} bpm exceeds {}", input.heart_rate, MAX_HEART_RATE),
            ));
        }
        if input.systolic_bp > MAX_SYSTOLIC_BP {
            return Err(reject(
                "systolic_bp",
                format!("{} mmHg exceeds {}", input.systolic_bp, MAX_SYSTOLIC_BP),
            ));
        }
        if input.diastolic_bp > MAX_DIASTOLIC_BP {
            return Err(reject(
                "diastolic_bp",
                format!("{} mmHg exceeds {}", input.diastolic_bp, MAX_DIASTOLIC_BP),
            ));
        }
        if input.diastolic_bp > input.systolic_bp {
            return Err(reject(
                "diastolic_bp",
                format!(
                    "{} mmHg exceeds systolic {} mmHg",
                    input.diastolic_bp, input.systolic_bp
                ),
            ));
        }
        if input.respiratory_rate > MAX_RESPIRATORY_RATE {
            return Err(reject(
                "respiratory_rate",
                format!(
                    "{} breaths/min exceeds {}",
                    input.respiratory_rate, MAX_RESPIRATORY_RATE
                ),
            ));
        }
        if input.spo2 > MAX_SPO2 {
            return Err(reject(
                "spo2",
                format!("{}% exceeds {}%", input.spo2, MAX_SPO2),
            ));
        }
        if !input.temperature.is_finite()
            || input.temperature < MIN_TEMPERATURE
            || input.temperature > MAX_TEMPERATURE
        {
            return Err(reject(
                "temperature",
                format!(
                    "{} degC outside {}..={} degC",
                    input.temperature, MIN_TEMPERATURE, MAX_TEMPERATURE
                ),
            ));
        }
        if input.pain_scale > MAX_PAIN_SCALE {
            return Err(reject(
                "pain_scale",
                format!("{} exceeds {}", input.pain_scale, MAX_PAIN_SCALE),
            ));
        }
        if input.age > MAX_AGE {
            return Err(reject(
                "age",
                format!("{} years exceeds {}", input.age, MAX_AGE),
            ));
        }

        let symptom = classify_complaint(&input.chief_complaint);

        Ok(Self {
            id: Uuid::new_v4(),
            heart_rate: input.heart_rate,
            systolic_bp: input.systolic_bp,
            diastolic_bp: input.diastolic_bp,
            respiratory_rate: input.respiratory_rate,
            spo2: input.spo2,
            temperature: input.temperature,
            pain_scale: input.pain_scale,
            consciousness: input.consciousness,
            chief_complaint: input.chief_complaint,
            symptom,
            age: input.age,
            captured_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn heart_rate(&self) -> u32 {
        self.heart_rate
    }

    pub fn systolic_bp(&self) -> u32 {
        self.systolic_bp
    }

    pub fn diastolic_bp(&self) -> u32 {
        self.diastolic_bp
    }

    pub fn respiratory_rate(&self) -> u32 {
        self.respiratory_rate
    }

    pub fn spo2(&self) -> u32 {
        self.spo2
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn pain_scale(&self) -> u8 {
        self.pain_scale
    }

    pub fn consciousness(&self) -> ConsciousnessLevel {
        self.consciousness
    }

    /// The chief complaint exactly as stated at intake.
    pub fn chief_complaint(&self) -> &str {
        &self.chief_complaint
    }

    /// The closed-set category the chief complaint was classified into.
    pub fn symptom(&self) -> SymptomCategory {
        self.symptom
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_input() -> VitalSignsInput {
        VitalSignsInput {
            heart_rate: 72,
            systolic_bp: 120,
            diastolic_bp: 80,
            respiratory_rate: 14,
            spo2: 98,
            temperature: 36.8,
            pain_scale: 1,
            consciousness: ConsciousnessLevel::Alert,
            chief_complaint: "mild headache".into(),
            age: 34,
        }
    }

    #[test]
    fn test_accepts_normal_vitals() {
        let record = VitalSignsRecord::new(normal_input()).expect("should accept");
        assert_eq!(record.heart_rate(), 72);
        assert_eq!(record.symptom(), SymptomCategory::Headache);
    }

    #[test]
    fn test_rejects_spo2_above_100() {
        let mut input = normal_input();
        input.spo2 = 101;
        let err = VitalSignsRecord::new(input).expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidVitalSigns(msg) if msg.contains("spo2")));
    }

    #[test]
    fn test_rejects_diastolic_above_systolic() {
        let mut input = normal_input();
        input.systolic_bp = 90;
        input.diastolic_bp = 110;
        let err = VitalSignsRecord::new(input).expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidVitalSigns(msg) if msg.contains("diastolic_bp"))
        );
    }

    #[test]
    fn test_rejects_implausible_temperature() {
        for temperature in [20.0, 50.0, f64::NAN] {
            let mut input = normal_input();
            input.temperature = temperature;
            let err = VitalSignsRecord::new(input).expect_err("should reject");
            assert!(
                matches!(err, TriageError::InvalidVitalSigns(msg) if msg.contains("temperature"))
            );
        }
    }

    #[test]
    fn test_rejects_pain_scale_above_10() {
        let mut input = normal_input();
        input.pain_scale = 11;
        let err = VitalSignsRecord::new(input).expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidVitalSigns(msg) if msg.contains("pain_scale")));
    }

    #[test]
    fn test_consciousness_token_round_trip() {
        for level in [
            ConsciousnessLevel::Alert,
            ConsciousnessLevel::Verbal,
            ConsciousnessLevel::Pain,
            ConsciousnessLevel::Unresponsive,
        ] {
            assert_eq!(ConsciousnessLevel::from_token(level.as_token()), Some(level));
        }
        assert_eq!(ConsciousnessLevel::from_token("AWAKE"), None);
    }
}
