//! Expansion settings.
//!
//! Settings are plain serde data read from YAML. Every field has a default, so an
//! empty file (or no file at all) yields `ExpandConfig::default()`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{err_msg, SymwalkError};

/// Settings shared by the expansion driver, the macro environment, and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpandConfig {
    /// Prefix for generated names, e.g. `_sw` yields `_sw_let_1`.
    pub gensym_prefix: String,
    /// Record every macro invocation in `MacroEnv::trace`.
    pub record_trace: bool,
    /// Maximum number of nested transitive expansions. Unbounded when unset.
    pub recursion_limit: Option<usize>,
    /// File extension picked up by `symwalk check`.
    pub source_extension: String,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            gensym_prefix: "_sw".to_string(),
            record_trace: true,
            recursion_limit: None,
            source_extension: "lisp".to_string(),
        }
    }
}

impl ExpandConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symwalk::config::ExpandConfig;
    /// let config = ExpandConfig::from_yaml_str("gensym_prefix: _tmp\nrecursion_limit: 64\n").unwrap();
    /// assert_eq!(config.gensym_prefix, "_tmp");
    /// assert_eq!(config.recursion_limit, Some(64));
    /// assert!(config.record_trace);
    /// ```
    pub fn from_yaml_str(text: &str) -> Result<Self, SymwalkError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ExpandConfig = serde_yaml::from_str(text).map_err(|e| SymwalkError::Config {
            message: format!("invalid configuration: {}", e),
            ctx: crate::ErrorContext::none(),
            source: Some(Box::new(e)),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, SymwalkError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Loads settings from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SymwalkError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), SymwalkError> {
        let bad_char = |c: char| c.is_whitespace() || "()[]{}\"';`~.".contains(c);
        if self.gensym_prefix.is_empty() || self.gensym_prefix.chars().any(bad_char) {
            return Err(err_msg!(
                Config,
                "gensym_prefix '{}' must be a non-empty plain symbol",
                self.gensym_prefix
            ));
        }
        if self.recursion_limit == Some(0) {
            return Err(err_msg!(Config, "recursion_limit must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ExpandConfig::from_yaml_str("  \n").unwrap(), ExpandConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ExpandConfig::from_yaml_str("gensym_prefx: _x\n").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[test]
    fn prefix_must_be_a_plain_symbol() {
        let err = ExpandConfig::from_yaml_str("gensym_prefix: \"a b\"\n").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        let err = ExpandConfig::from_yaml_str("gensym_prefix: a.b\n").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[test]
    fn zero_recursion_limit_is_rejected() {
        let err = ExpandConfig::from_yaml_str("recursion_limit: 0\n").unwrap_err();
        assert!(err.message().contains("at least 1"));
    }
}
