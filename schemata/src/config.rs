//! Configuration for artifact derivation.
//!
//! Only generators have tunable behaviour today. A configuration can be
//! built in code or loaded from a TOML file:
//!
//! ```toml
//! [arbitrary]
//! max_string_length = 8
//! max_rest_length = 4
//! refinement_retries = 200
//! soft_depth = 3
//! depth_limit = 32
//! ```
//!
//! # Example
//! ```rust,ignore
//! use schemata::{ArbitraryConfig, Interpreter, SchemaConfig};
//!
//! let config = SchemaConfig::new()
//!     .with_arbitrary(ArbitraryConfig::new().with_max_rest_length(2));
//! let interpreter = Interpreter::new().with_config(config);
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// Default configuration file name.
pub const CONFIG_FILENAME: &str = "schemata.toml";

/// Limits for generated values.
///
/// # Fields
///
/// * `max_string_length` - Upper bound on generated string length. Default: 10.
///
/// * `max_rest_length` - Upper bound on rest elements and index-signature
///   entries. Default: 5.
///
/// * `refinement_retries` - Candidates drawn before a refinement gives up.
///   Default: 100.
///
/// * `soft_depth` - Past this nesting depth optional parts are omitted, rest
///   parts are empty and unions prefer their first workable member. This is
///   what makes recursive schemas terminate. Default: 3.
///
/// * `depth_limit` - Hard nesting limit; generation fails past it. Default: 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitraryConfig {
    pub max_string_length: usize,
    pub max_rest_length: usize,
    pub refinement_retries: usize,
    pub soft_depth: usize,
    pub depth_limit: usize,
}

impl Default for ArbitraryConfig {
    fn default() -> Self {
        Self {
            max_string_length: 10,
            max_rest_length: 5,
            refinement_retries: 100,
            soft_depth: 3,
            depth_limit: 64,
        }
    }
}

impl ArbitraryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_string_length(mut self, length: usize) -> Self {
        self.max_string_length = length;
        self
    }

    #[must_use]
    pub fn with_max_rest_length(mut self, length: usize) -> Self {
        self.max_rest_length = length;
        self
    }

    #[must_use]
    pub fn with_refinement_retries(mut self, retries: usize) -> Self {
        self.refinement_retries = retries;
        self
    }

    #[must_use]
    pub fn with_soft_depth(mut self, depth: usize) -> Self {
        self.soft_depth = depth;
        self
    }

    #[must_use]
    pub fn with_depth_limit(mut self, depth: usize) -> Self {
        self.depth_limit = depth;
        self
    }

    /// Validate the generator limits.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.refinement_retries == 0 {
            return Err(ConfigValidationError::ZeroRefinementRetries);
        }
        if self.depth_limit <= self.soft_depth {
            return Err(ConfigValidationError::DepthLimitBelowSoftDepth {
                soft_depth: self.soft_depth,
                depth_limit: self.depth_limit,
            });
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub arbitrary: ArbitraryConfig,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_arbitrary(mut self, arbitrary: ArbitraryConfig) -> Self {
        self.arbitrary = arbitrary;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.arbitrary.validate()
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> SchemaResult<Self> {
        let config: SchemaConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from [`CONFIG_FILENAME`] in the working
    /// directory. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> SchemaResult<Self> {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_FILENAME));
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(path).map_err(|source| SchemaError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }
}

/// Error returned when configuration values are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    ZeroRefinementRetries,
    DepthLimitBelowSoftDepth { soft_depth: usize, depth_limit: usize },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroRefinementRetries => {
                write!(f, "refinement_retries must be greater than 0")
            }
            Self::DepthLimitBelowSoftDepth {
                soft_depth,
                depth_limit,
            } => write!(
                f,
                "depth_limit ({depth_limit}) must be greater than soft_depth ({soft_depth})"
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SchemaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_toml_fills_defaults() {
        let config = SchemaConfig::from_toml_str("[arbitrary]\nmax_rest_length = 2\n").unwrap();
        assert_eq!(config.arbitrary.max_rest_length, 2);
        assert_eq!(config.arbitrary.refinement_retries, 100);

        let empty = SchemaConfig::from_toml_str("").unwrap();
        assert_eq!(empty, SchemaConfig::default());
    }

    #[test]
    fn test_from_toml_validates() {
        let result = SchemaConfig::from_toml_str("[arbitrary]\nrefinement_retries = 0\n");
        assert!(matches!(
            result,
            Err(SchemaError::InvalidConfig(ConfigValidationError::ZeroRefinementRetries))
        ));

        let result = SchemaConfig::from_toml_str("[arbitrary]\nsoft_depth = 9\ndepth_limit = 4\n");
        assert!(matches!(result, Err(SchemaError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        let result = SchemaConfig::from_toml_str("[arbitrary]\nsoft_depth = \"deep\"\n");
        assert!(matches!(result, Err(SchemaError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = SchemaConfig::load(Some(Path::new("does/not/exist.toml"))).unwrap();
        assert_eq!(config, SchemaConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!("schemata-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[arbitrary]\nmax_string_length = 3\n").unwrap();
        let config = SchemaConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.arbitrary.max_string_length, 3);
    }
}
