// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type system configuration.
//!
//! Supports both programmatic and file-based configuration.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Date format used when rendering date values.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSystemConfig {
    /// Reject field-bag entries the layout does not expose. When off they are
    /// logged and skipped.
    #[serde(default = "default_true")]
    pub strict_attributes: bool,

    /// Longest supertype chain accepted when resolving a layout.
    #[serde(default = "default_max_inheritance_depth")]
    pub max_inheritance_depth: usize,

    /// chrono format string for rendered dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_true() -> bool {
    true
}

fn default_max_inheritance_depth() -> usize {
    32
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for TypeSystemConfig {
    fn default() -> Self {
        Self {
            strict_attributes: default_true(),
            max_inheritance_depth: default_max_inheritance_depth(),
            date_format: default_date_format(),
        }
    }
}

impl TypeSystemConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_inheritance_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_inheritance_depth must be greater than 0".into(),
            ));
        }

        if self.date_format.is_empty() {
            return Err(ConfigError::Invalid("date_format is empty".into()));
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Invalid(format!(
                "date_format '{}' is not a valid format string",
                self.date_format
            )));
        }

        Ok(())
    }

    /// Lenient configuration: unknown attributes are skipped.
    pub fn lenient() -> Self {
        Self {
            strict_attributes: false,
            ..Self::default()
        }
    }
}
