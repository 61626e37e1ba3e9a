//! Validated primitive types shared across the SAVISER crates.
//!
//! These types exist so that "already validated" is a property of the type,
//! not a comment: once constructed, a [`NonEmptyText`] is never blank and a
//! [`PriorityLevel`] is always on the 1–5 urgency scale.

/// Errors that can occur when creating validated primitive types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    EmptyText,
    /// The urgency level was outside the 1–5 scale
    #[error("priority level must be between 1 and 5, got {0}")]
    PriorityOutOfRange(u8),
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, trimming the input.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::EmptyText` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptyText);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A triage urgency level on the ordered 1–5 scale.
///
/// Level 1 is the most urgent, level 5 the least. The ordering derives from
/// the inner number, so `PriorityLevel` sorts most-urgent-first when sorted
/// ascending, which is exactly the order the waiting-room queue wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriorityLevel(u8);

impl PriorityLevel {
    /// The most urgent level on the scale.
    pub const MOST_URGENT: PriorityLevel = PriorityLevel(1);
    /// The least urgent level on the scale.
    pub const LEAST_URGENT: PriorityLevel = PriorityLevel(5);

    /// Creates a `PriorityLevel` from a raw number.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::PriorityOutOfRange` unless `1 <= level <= 5`.
    pub fn new(level: u8) -> Result<Self, TypeError> {
        if !(1..=5).contains(&level) {
            return Err(TypeError::PriorityOutOfRange(level));
        }
        Ok(Self(level))
    }

    /// Returns the raw level number (1 most urgent … 5 least urgent).
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// True if `self` is more urgent (numerically smaller) than `other`.
    pub fn is_more_urgent_than(self, other: PriorityLevel) -> bool {
        self.0 < other.0
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for PriorityLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PriorityLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        PriorityLevel::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_and_keeps_content() {
        let text = NonEmptyText::new("  triage nurse  ").expect("should accept");
        assert_eq!(text.as_str(), "triage nurse");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace_only() {
        assert!(matches!(NonEmptyText::new("   "), Err(TypeError::EmptyText)));
        assert!(matches!(NonEmptyText::new(""), Err(TypeError::EmptyText)));
    }

    #[test]
    fn test_priority_level_accepts_full_scale() {
        for raw in 1..=5 {
            let level = PriorityLevel::new(raw).expect("scale value should be valid");
            assert_eq!(level.as_u8(), raw);
        }
    }

    #[test]
    fn test_priority_level_rejects_out_of_range() {
        assert!(matches!(
            PriorityLevel::new(0),
            Err(TypeError::PriorityOutOfRange(0))
        ));
        assert!(matches!(
            PriorityLevel::new(6),
            Err(TypeError::PriorityOutOfRange(6))
        ));
    }

    #[test]
    fn test_priority_level_orders_most_urgent_first() {
        let one = PriorityLevel::new(1).unwrap();
        let three = PriorityLevel::new(3).unwrap();
        assert!(one < three);
        assert!(one.is_more_urgent_than(three));
        assert!(!three.is_more_urgent_than(three));
    }

    #[test]
    fn test_priority_level_serde_round_trip() {
        let level = PriorityLevel::new(2).unwrap();
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(json, "2");
        let back: PriorityLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, level);
    }

    #[test]
    fn test_priority_level_serde_rejects_out_of_scale() {
        assert!(serde_json::from_str::<PriorityLevel>("0").is_err());
        assert!(serde_json::from_str::<PriorityLevel>("9").is_err());
    }
}
