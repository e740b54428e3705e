//! Input model: dependency files, the graph they describe and the target.
//!
//! Package names are compared case-insensitively and stored lowercase.

use std::io;

use indexmap::IndexMap;
use lockstep_semver::{ParseError, VersionParser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ForceUpdateConfig;
use crate::force_update::Workspace;
use crate::json::{JsonError, LockFile, Manifest};
use crate::package::Package;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("No {0} was provided")]
    MissingFile(String),

    #[error("{0} is empty")]
    EmptyFile(String),

    #[error(transparent)]
    Json(#[from] JsonError),

    #[error("Invalid target version: {0}")]
    InvalidTargetVersion(#[source] ParseError),

    #[error("Target package name is empty")]
    EmptyTargetName,

    #[error("Invalid requirement for {name} in {file}: {source}")]
    InvalidRequirement {
        name: String,
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("Invalid locked version for {name}: {source}")]
    InvalidLockedVersion {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// A named file handed to the updater, e.g. the manifest or the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFile {
    /// Path relative to the project root
    pub name: String,
    pub content: String,
}

impl DependencyFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A root requirement declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Version currently in the lock, if any
    pub version: Option<String>,
    /// Requirement as written in the manifest
    pub requirement: String,
    /// Manifest file the requirement came from
    pub file: String,
}

/// The package to force and the exact version it must end up at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConstraint {
    name: String,
    version: String,
}

impl TargetConstraint {
    /// Validate the target; the version must be a concrete version.
    pub fn new(name: &str, version: &str) -> Result<Self, InputError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InputError::EmptyTargetName);
        }

        let version = VersionParser::new()
            .normalize(version)
            .map_err(InputError::InvalidTargetVersion)?;

        Ok(Self {
            name: name.to_lowercase(),
            version,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Manifest and lock, parsed and cross-referenced.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    manifest: Manifest,
    dependencies: Vec<Dependency>,
    locked: IndexMap<String, Package>,
}

impl DependencyGraph {
    /// Parse and validate the manifest and lock among `files`.
    pub fn load(files: &[DependencyFile], config: &ForceUpdateConfig) -> Result<Self, InputError> {
        let manifest_content = find_content(files, &config.manifest_name)?;
        let lock_content = find_content(files, &config.lock_name)?;
        Self::parse(config, manifest_content, lock_content)
    }

    /// Read the manifest and lock from a staged workspace.
    pub fn from_workspace(workspace: &Workspace, config: &ForceUpdateConfig) -> Result<Self, InputError> {
        let read = |name: &str| {
            workspace.read_file(name).map_err(|source| InputError::Read {
                name: name.to_string(),
                source,
            })
        };

        let manifest_content = read(&config.manifest_name)?;
        let lock_content = read(&config.lock_name)?;
        Self::parse(config, &manifest_content, &lock_content)
    }

    fn parse(config: &ForceUpdateConfig, manifest_content: &str, lock_content: &str) -> Result<Self, InputError> {
        let parser = VersionParser::new();
        let manifest = Manifest::parse(&config.manifest_name, manifest_content)?;
        let lock = LockFile::parse(&config.lock_name, lock_content)?;

        let mut locked = IndexMap::new();
        for lp in &lock.packages {
            parser
                .normalize(&lp.version)
                .map_err(|source| InputError::InvalidLockedVersion {
                    name: lp.name.clone(),
                    source,
                })?;
            locked.insert(lp.name.to_lowercase(), Package::from(lp));
        }

        let mut dependencies = Vec::new();
        for (name, requirement) in &manifest.require {
            parser
                .parse_constraints(requirement)
                .map_err(|source| InputError::InvalidRequirement {
                    name: name.clone(),
                    file: config.manifest_name.clone(),
                    source,
                })?;

            let name = name.to_lowercase();
            dependencies.push(Dependency {
                version: locked.get(&name).map(|p: &Package| p.version.clone()),
                name,
                requirement: requirement.clone(),
                file: config.manifest_name.clone(),
            });
        }

        Ok(Self {
            manifest,
            dependencies,
            locked,
        })
    }

    /// Root requirements in manifest order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        let name = name.to_lowercase();
        self.dependencies.iter().find(|d| d.name == name)
    }

    /// Locked packages keyed by lowercase name, in lock order
    pub fn locked(&self) -> &IndexMap<String, Package> {
        &self.locked
    }

    pub fn locked_version(&self, name: &str) -> Option<&str> {
        self.locked.get(&name.to_lowercase()).map(|p| p.version.as_str())
    }

    /// Registry URLs declared in the manifest
    pub fn repositories(&self) -> &[String] {
        &self.manifest.repositories
    }

    /// Number of distinct package names the graph mentions
    pub fn package_count(&self) -> usize {
        let mut names: Vec<&str> = self.locked.keys().map(String::as_str).collect();
        names.extend(self.dependencies.iter().map(|d| d.name.as_str()));
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

fn find_content<'a>(files: &'a [DependencyFile], name: &str) -> Result<&'a str, InputError> {
    let file = files
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| InputError::MissingFile(name.to_string()))?;

    if file.content.trim().is_empty() {
        return Err(InputError::EmptyFile(name.to_string()));
    }

    Ok(&file.content)
}
