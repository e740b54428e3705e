use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Release stability derived from the version suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    RC,
    Beta,
    Alpha,
    Dev,
}

impl Stability {
    /// Lower is preferred
    pub fn priority(&self) -> u8 {
        match self {
            Stability::Stable => 0,
            Stability::RC => 5,
            Stability::Beta => 10,
            Stability::Alpha => 15,
            Stability::Dev => 20,
        }
    }

    pub fn from_version(version: &str) -> Self {
        let lower = version.to_lowercase();
        if lower.contains("dev") {
            Stability::Dev
        } else if lower.contains("alpha") {
            Stability::Alpha
        } else if lower.contains("beta") {
            Stability::Beta
        } else if lower.contains("rc") {
            Stability::RC
        } else {
            Stability::Stable
        }
    }
}

/// A concrete version of a package and its requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub require: IndexMap<String, String>,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            require: IndexMap::new(),
        }
    }

    /// Builder-style helper to add a requirement
    pub fn with_require(mut self, name: impl Into<String>, constraint: impl Into<String>) -> Self {
        self.require.insert(name.into(), constraint.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn stability(&self) -> Stability {
        Stability::from_version(&self.version)
    }

    /// `name version`, as shown in diagnostics
    pub fn pretty_string(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stability() {
        assert_eq!(Package::new("a", "1.0.0").stability(), Stability::Stable);
        assert_eq!(Package::new("a", "1.0.0-RC1").stability(), Stability::RC);
        assert_eq!(Package::new("a", "2.0.0-beta.1").stability(), Stability::Beta);
        assert_eq!(Package::new("a", "2.0.0-dev").stability(), Stability::Dev);
        assert!(Stability::Stable.priority() < Stability::Dev.priority());
    }

    #[test]
    fn test_with_require() {
        let pkg = Package::new("vendor/a", "1.0.0")
            .with_require("vendor/b", "^1.0")
            .with_require("vendor/c", "*");
        assert_eq!(pkg.require.len(), 2);
        assert_eq!(pkg.pretty_string(), "vendor/a 1.0.0");
    }
}
