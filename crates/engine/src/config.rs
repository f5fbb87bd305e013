//! Archive configuration via `sdarc.toml`
//!
//! Settings that decide how new archives are initialized and how values
//! without a safe encoding are handled. Every field has a default, so an
//! empty file is a valid configuration.

use sdarc_core::{is_valid_deflate, Error, FormatVersion, Result, MAX_DEFLATE_LEVEL};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "sdarc.toml";

/// What to do with a value (or nested slot) that cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Store an `unsupported` placeholder carrying the class name
    #[default]
    Placeholder,
    /// Omit the field from its struct (cells still keep a placeholder)
    Drop,
    /// Fail the whole operation with `UnsupportedValue`
    Reject,
}

/// Archive configuration loaded from `sdarc.toml`.
///
/// # Example
///
/// ```toml
/// default_version = "1.1"
/// default_deflate = 0
/// strict = false
/// unsupported_policy = "placeholder"
/// # max_depth = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Format version of newly created archives.
    pub default_version: FormatVersion,
    /// Deflate level used when an insert does not name one.
    pub default_deflate: u8,
    /// Reject unclassifiable values regardless of `unsupported_policy`.
    pub strict: bool,
    /// Handling of unclassifiable values when not strict.
    pub unsupported_policy: UnsupportedPolicy,
    /// Deepest composite nesting accepted on insert (unbounded if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            default_version: FormatVersion::LATEST,
            default_deflate: 0,
            strict: false,
            unsupported_policy: UnsupportedPolicy::Placeholder,
            max_depth: None,
        }
    }
}

impl ArchiveConfig {
    /// Set the format version of new archives
    pub fn with_default_version(mut self, version: FormatVersion) -> Self {
        self.default_version = version;
        self
    }

    /// Set the default deflate level
    pub fn with_default_deflate(mut self, level: u8) -> Self {
        self.default_deflate = level;
        self
    }

    /// Enable or disable strict classification
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the unsupported-value policy
    pub fn with_unsupported_policy(mut self, policy: UnsupportedPolicy) -> Self {
        self.unsupported_policy = policy;
        self
    }

    /// Bound composite nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Policy actually applied: strict mode always rejects.
    pub fn effective_policy(&self) -> UnsupportedPolicy {
        if self.strict {
            UnsupportedPolicy::Reject
        } else {
            self.unsupported_policy
        }
    }

    /// Check every setting is in range.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_deflate(self.default_deflate) {
            return Err(Error::invalid_argument(format!(
                "default_deflate must be 0-{}, got {}",
                MAX_DEFLATE_LEVEL, self.default_deflate
            )));
        }
        if self.max_depth == Some(0) {
            return Err(Error::invalid_argument(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# sdarc archive configuration
#
# Format version of newly created archives: "1.0" or "1.1" (default)
#   "1.0" = identifier-like labels only, no file records
#   "1.1" = relaxed labels, file records
default_version = "1.1"

# Deflate level (0-9) used when an insert does not name one (default: 0)
default_deflate = 0

# Reject values with no archive encoding instead of storing a placeholder
strict = false

# Handling of values with no archive encoding when not strict:
#   "placeholder" = store an unsupported record carrying the class name
#   "drop"        = leave the field out of its struct
#   "reject"      = fail the insert
unsupported_policy = "placeholder"

# Deepest composite nesting accepted on insert (default: unbounded)
# max_depth = 64
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ArchiveConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_argument(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_argument(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidArgument(msg) => {
                Error::InvalidArgument(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::ContainerIo(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_argument(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::ContainerIo(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
