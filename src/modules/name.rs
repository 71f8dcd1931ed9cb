//! Module name validation
//!
//! Module names become directory names, so only a conservative character
//! set is accepted and device names reserved on Windows hosts are refused
//! everywhere.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::modules::error::ValidationError;

pub const MAX_MODULE_NAME_LENGTH: usize = 50;

const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "lpt1", "lpt2", "lpt3", "lpt4",
];

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("module name pattern is valid"));

/// A module name that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

impl ModuleName {
    /// Validate a raw name. Rules are checked in order and the first failure wins.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if raw.chars().count() > MAX_MODULE_NAME_LENGTH {
            return Err(ValidationError::NameTooLong {
                max: MAX_MODULE_NAME_LENGTH,
            });
        }

        if !NAME_PATTERN.is_match(raw) {
            return Err(ValidationError::InvalidCharacters {
                name: raw.to_string(),
            });
        }

        let lowered = raw.to_ascii_lowercase();
        if RESERVED_NAMES.contains(&lowered.as_str()) {
            return Err(ValidationError::ReservedName {
                name: raw.to_string(),
            });
        }

        debug!("Validated module name: {}", raw);
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for ModuleName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}
