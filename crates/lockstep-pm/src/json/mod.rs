//! Manifest and lock file models.
//!
//! Both files are JSON. The manifest declares the root requirements:
//!
//! ```json
//! { "require": { "acme/http": ">= 1.0, < 2.0" }, "repositories": ["https://registry.example"] }
//! ```
//!
//! The lock records the versions currently installed and what each of them
//! requires:
//!
//! ```json
//! { "packages": [ { "name": "acme/http", "version": "1.5.0", "require": {} } ] }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::package::Package;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {file}: {source}")]
    Serialize {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The project manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Root requirements, name -> constraint
    #[serde(default)]
    pub require: IndexMap<String, String>,

    /// Registry base URLs to fetch candidate versions from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
}

impl Manifest {
    pub fn parse(file: &str, content: &str) -> Result<Self, JsonError> {
        serde_json::from_str(content).map_err(|source| JsonError::Parse {
            file: file.to_string(),
            source,
        })
    }
}

/// The lock file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub packages: Vec<LockedPackage>,
}

/// A single locked package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub require: IndexMap<String, String>,
}

impl LockFile {
    pub fn parse(file: &str, content: &str) -> Result<Self, JsonError> {
        serde_json::from_str(content).map_err(|source| JsonError::Parse {
            file: file.to_string(),
            source,
        })
    }

    /// Build a lock from a resolved package set, sorted by name.
    pub fn from_packages<'a>(packages: impl IntoIterator<Item = &'a Package>) -> Self {
        let mut packages: Vec<LockedPackage> = packages.into_iter().map(LockedPackage::from).collect();
        packages.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Self { packages }
    }

    /// Find a locked package by name (case-insensitive)
    pub fn find_package(&self, name: &str) -> Option<&LockedPackage> {
        self.packages
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Render as pretty JSON with a trailing newline
    pub fn to_json(&self, file: &str) -> Result<String, JsonError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|source| JsonError::Serialize {
            file: file.to_string(),
            source,
        })?;
        json.push('\n');
        Ok(json)
    }
}
