#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid vital signs: {0}")]
    InvalidVitalSigns(String),
    #[error("invalid rule definition: {0}")]
    InvalidRuleDefinition(String),
    #[error("no rule matched record {record_id}; the active rule set is missing a catch-all")]
    NoMatchingRule { record_id: uuid::Uuid },
    #[error("stale encounter snapshot: {0}")]
    StaleSnapshot(String),
    #[error("failed to read rule file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize rule YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
