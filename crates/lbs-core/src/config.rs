//! Engine configuration
//!
//! All settings have defaults; a TOML document only needs the keys it wants
//! to change:
//!
//! ```toml
//! numbering_prefix = "3."
//! aisi_layout = "legacy"
//! active_policy = "first_group"
//! renumber_debounce_ms = 250
//! ```

use lbs_groups::{ActiveCcppPolicy, DEFAULT_STORAGE_KEY};
use lbs_numbering::{DEFAULT_NUMBERING_PREFIX, DEFAULT_RENUMBER_DEBOUNCE};
use lbs_sections::AisiLayout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML did not parse or had wrong types
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Report engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Label prefix for table and photo numbers
    pub numbering_prefix: String,
    /// AISI subsections per instance
    pub aisi_layout: AisiLayout,
    /// Which groups decide whether a type has active CCPP
    pub active_policy: ActiveCcppPolicy,
    /// Quiet period before a renumber pass runs
    pub renumber_debounce_ms: u64,
    /// Key of the persisted group configuration
    pub storage_key: String,
    /// Block navigation when group-scoped fields outlive their group
    pub strict_field_references: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_key",
                reason: "must not be empty".into(),
            });
        }
        if self.numbering_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "numbering_prefix",
                reason: format!("'{}' contains whitespace", self.numbering_prefix),
            });
        }
        Ok(())
    }

    /// Debounce as a duration
    #[inline]
    #[must_use]
    pub fn renumber_debounce(&self) -> Duration {
        Duration::from_millis(self.renumber_debounce_ms)
    }

    /// With numbering prefix
    #[inline]
    #[must_use]
    pub fn with_numbering_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.numbering_prefix = prefix.into();
        self
    }

    /// With AISI layout
    #[inline]
    #[must_use]
    pub fn with_aisi_layout(mut self, layout: AisiLayout) -> Self {
        self.aisi_layout = layout;
        self
    }

    /// With active-CCPP policy
    #[inline]
    #[must_use]
    pub fn with_active_policy(mut self, policy: ActiveCcppPolicy) -> Self {
        self.active_policy = policy;
        self
    }

    /// With renumber debounce
    #[inline]
    #[must_use]
    pub fn with_renumber_debounce(mut self, debounce: Duration) -> Self {
        self.renumber_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With storage key
    #[inline]
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// With strict field reference checks
    #[inline]
    #[must_use]
    pub fn with_strict_field_references(mut self, strict: bool) -> Self {
        self.strict_field_references = strict;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            numbering_prefix: DEFAULT_NUMBERING_PREFIX.to_string(),
            aisi_layout: AisiLayout::default(),
            active_policy: ActiveCcppPolicy::default(),
            renumber_debounce_ms: u64::try_from(DEFAULT_RENUMBER_DEBOUNCE.as_millis()).unwrap_or(500),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            strict_field_references: false,
        }
    }
}
