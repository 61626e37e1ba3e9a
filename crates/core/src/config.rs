//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! services that need it. Request handlers never read environment variables
//! directly; doing so mid-request behaves inconsistently across
//! multi-threaded runtimes and test harnesses.

use std::path::{Path, PathBuf};

use crate::{TriageError, TriageResult};

/// Workspace-relative location of the shipped rule definitions.
pub const DEFAULT_RULES_FILE: &str = "rules/default.yaml";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    rules_path: PathBuf,
}

impl CoreConfig {
    /// Creates a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidRuleDefinition`] if `rules_path` is not
    /// an existing file; catching a bad path here beats failing on the first
    /// reload hours later.
    pub fn new(rules_path: PathBuf) -> TriageResult<Self> {
        if !rules_path.is_file() {
            return Err(TriageError::InvalidRuleDefinition(format!(
                "rules path is not a file: {}",
                rules_path.display()
            )));
        }
        Ok(Self { rules_path })
    }

    /// Path of the rule definition file used at startup and on path-based
    /// reloads.
    pub fn rules_path(&self) -> &Path {
        &self.rules_path
    }
}

/// Resolves the rule definition file without reading environment variables.
///
/// If `override_path` is provided it must point at an existing file.
/// Otherwise this looks for [`DEFAULT_RULES_FILE`] relative to the current
/// working directory and then walks up from `CARGO_MANIFEST_DIR`, which
/// covers both deployed layouts and `cargo run` from inside a crate.
///
/// # Errors
///
/// Returns [`TriageError::InvalidRuleDefinition`] if the override is not a
/// file or no candidate location contains the default file.
pub fn resolve_rules_path(override_path: Option<PathBuf>) -> TriageResult<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path);
        }
        return Err(TriageError::InvalidRuleDefinition(format!(
            "SAVISER_RULES_PATH override is not a file: {}",
            path.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_RULES_FILE);
    if cwd_relative.is_file() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_RULES_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(TriageError::InvalidRuleDefinition(format!(
        "could not locate {} (set SAVISER_RULES_PATH to override)",
        DEFAULT_RULES_FILE
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_config_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "rules: []").unwrap();

        assert!(CoreConfig::new(path).is_ok());
        assert!(matches!(
            CoreConfig::new(dir.path().join("missing.yaml")),
            Err(TriageError::InvalidRuleDefinition(_))
        ));
    }

    #[test]
    fn test_resolve_rules_path_accepts_valid_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "rules: []").unwrap();

        let resolved = resolve_rules_path(Some(path.clone())).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_resolve_rules_path_rejects_bad_override() {
        let err = resolve_rules_path(Some(PathBuf::from("/definitely/not/here.yaml")))
            .expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidRuleDefinition(_)));
    }

    #[test]
    fn test_resolve_rules_path_finds_workspace_default() {
        // The shipped rules/default.yaml sits at the workspace root, an
        // ancestor of this crate's manifest dir.
        let resolved = resolve_rules_path(None).expect("workspace default should resolve");
        assert!(resolved.ends_with(DEFAULT_RULES_FILE));
    }
}
