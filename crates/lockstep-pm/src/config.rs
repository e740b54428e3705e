//! Updater configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! - `LOCKSTEP_MANIFEST`: manifest file name (default `lockstep.json`)
//! - `LOCKSTEP_LOCK`: lock file name (default `lockstep.lock`)
//! - `LOCKSTEP_ISOLATION`: `tempdir` or `inprocess`
//! - `LOCKSTEP_PREFER_LOWEST`: `1`/`true` to try lowest versions first

use std::env;
use std::str::FromStr;

pub const DEFAULT_MANIFEST_NAME: &str = "lockstep.json";
pub const DEFAULT_LOCK_NAME: &str = "lockstep.lock";

/// How each resolution attempt is isolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isolation {
    /// Stage the dependency files in a fresh temporary directory per attempt
    #[default]
    TempDir,
    /// Serve the dependency files from memory
    InProcess,
}

impl Isolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Isolation::TempDir => "tempdir",
            Isolation::InProcess => "inprocess",
        }
    }
}

impl FromStr for Isolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tempdir" | "temp-dir" => Ok(Isolation::TempDir),
            "inprocess" | "in-process" => Ok(Isolation::InProcess),
            other => Err(format!(
                "unknown isolation \"{}\", expected \"tempdir\" or \"inprocess\"",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceUpdateConfig {
    /// Name of the manifest among the dependency files
    pub manifest_name: String,
    /// Name of the lock file among the dependency files
    pub lock_name: String,
    pub isolation: Isolation,
    /// Try lowest matching versions first instead of highest
    pub prefer_lowest: bool,
}

impl Default for ForceUpdateConfig {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            isolation: Isolation::default(),
            prefer_lowest: false,
        }
    }
}

impl ForceUpdateConfig {
    /// Defaults overlaid with `LOCKSTEP_*` environment variables.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(name) = lookup("LOCKSTEP_MANIFEST").filter(|v| !v.trim().is_empty()) {
            config.manifest_name = name;
        }
        if let Some(name) = lookup("LOCKSTEP_LOCK").filter(|v| !v.trim().is_empty()) {
            config.lock_name = name;
        }
        if let Some(value) = lookup("LOCKSTEP_ISOLATION") {
            match value.parse() {
                Ok(isolation) => config.isolation = isolation,
                Err(e) => log::warn!("Ignoring LOCKSTEP_ISOLATION: {}", e),
            }
        }
        if let Some(value) = lookup("LOCKSTEP_PREFER_LOWEST") {
            config.prefer_lowest = matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    pub fn with_lock_name(mut self, name: impl Into<String>) -> Self {
        self.lock_name = name.into();
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_prefer_lowest(mut self, prefer_lowest: bool) -> Self {
        self.prefer_lowest = prefer_lowest;
        self
    }
}
