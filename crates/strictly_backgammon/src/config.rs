//! Match rule configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Rule flags for a match or a money session.
///
/// ```toml
/// match_length = 7
/// crawford = true
/// jacoby = false
/// dead_cube = false
/// holland = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize, JsonSchema)]
pub struct MatchRules {
    /// Points needed to win; absent for money play.
    #[serde(default)]
    match_length: Option<u32>,

    /// Forbid doubling in the game after a player reaches match point.
    #[serde(default = "default_crawford")]
    crawford: bool,

    /// Count gammons single while the cube is unturned.
    #[serde(default)]
    jacoby: bool,

    /// Refuse a double once the offerer's score plus the cube value already
    /// reaches the match length.
    #[serde(default)]
    dead_cube: bool,

    /// In post-Crawford games the trailer may not double before their
    /// second roll.
    #[serde(default)]
    holland: bool,
}

fn default_crawford() -> bool {
    true
}

impl MatchRules {
    /// Money play, which never ends on its own.
    pub fn money(jacoby: bool) -> Self {
        Self {
            match_length: None,
            crawford: true,
            jacoby,
            dead_cube: false,
            holland: false,
        }
    }

    /// A match to `length` points with the Crawford rule.
    pub fn match_to(length: u32) -> Self {
        Self {
            match_length: Some(length),
            crawford: true,
            jacoby: false,
            dead_cube: false,
            holland: false,
        }
    }

    /// Same rules with the Crawford flag set.
    pub fn with_crawford(mut self, crawford: bool) -> Self {
        self.crawford = crawford;
        self
    }

    /// Same rules with the Jacoby flag set.
    pub fn with_jacoby(mut self, jacoby: bool) -> Self {
        self.jacoby = jacoby;
        self
    }

    /// Same rules with the dead-cube flag set.
    pub fn with_dead_cube(mut self, dead_cube: bool) -> Self {
        self.dead_cube = dead_cube;
        self
    }

    /// Same rules with the Holland flag set.
    pub fn with_holland(mut self, holland: bool) -> Self {
        self.holland = holland;
        self
    }

    /// True for money play.
    pub fn is_money(&self) -> bool {
        self.match_length.is_none()
    }

    /// Loads rules from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading match rules from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read rules file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses rules from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let rules: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse rules: {}", e)))?;
        rules.validate()?;
        info!(
            match_length = ?rules.match_length,
            crawford = rules.crawford,
            jacoby = rules.jacoby,
            dead_cube = rules.dead_cube,
            holland = rules.holland,
            "Match rules loaded"
        );
        Ok(rules)
    }

    /// Rejects rules no match can be played under.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.match_length == Some(0) {
            warn!("Match length of zero rejected");
            return Err(ConfigError::new("match_length must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::money(false)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_money_with_crawford() {
        let rules = MatchRules::from_toml_str("").unwrap();
        assert_eq!(rules, MatchRules::money(false));
        assert!(*rules.crawford());
        assert!(rules.is_money());
    }

    #[test]
    fn test_parse_match_rules() {
        let rules =
            MatchRules::from_toml_str("match_length = 5\njacoby = true\ncrawford = false").unwrap();
        assert_eq!(*rules.match_length(), Some(5));
        assert!(*rules.jacoby());
        assert!(!*rules.crawford());
        assert!(!*rules.dead_cube());
        assert!(!*rules.holland());
    }

    #[test]
    fn test_parse_cube_gates() {
        let toml = "match_length = 7\ndead_cube = true\nholland = true";
        let rules = MatchRules::from_toml_str(toml).unwrap();
        assert_eq!(
            rules,
            MatchRules::match_to(7).with_dead_cube(true).with_holland(true)
        );
    }

    #[test]
    fn test_zero_length_rejected() {
        let err = MatchRules::from_toml_str("match_length = 0").unwrap_err();
        assert!(err.message.contains("at least 1"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = MatchRules::from_toml_str("match_length = \"seven\"").unwrap_err();
        assert!(err.message.starts_with("Failed to parse rules"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "match_length = 7").unwrap();
        let rules = MatchRules::from_file(file.path()).unwrap();
        assert_eq!(rules, MatchRules::match_to(7));
    }

    #[test]
    fn test_missing_file() {
        let err = MatchRules::from_file("/nonexistent/rules.toml").unwrap_err();
        assert!(err.message.starts_with("Failed to read rules file"));
        assert!(err.file.ends_with("config.rs"));
    }
}
