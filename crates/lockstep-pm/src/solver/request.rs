use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::package::Package;

/// Where a root-level requirement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Declared in the manifest
    Manifest,
    /// Pinned to the version in the lock
    Lock,
    /// Lower bound kept for an unlocked package
    Floor,
    /// The forced target version
    Target,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Manifest => "manifest",
            Origin::Lock => "lock",
            Origin::Floor => "floor",
            Origin::Target => "target",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A root-level requirement on a package name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    pub constraint: String,
    pub origin: Origin,
}

/// Specification of what needs to be resolved.
///
/// `require` entries must be part of the solution. `constrain` entries only
/// apply if their package ends up in the solution for another reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Request {
    require: Vec<Requirement>,
    constrain: Vec<Requirement>,
    locked: Vec<Package>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a package matching `constraint`
    pub fn require(&mut self, name: &str, constraint: &str, origin: Origin) {
        self.require.push(Requirement {
            name: name.to_lowercase(),
            constraint: constraint.to_string(),
            origin,
        });
    }

    /// Constrain a package, should it be installed
    pub fn constrain(&mut self, name: &str, constraint: &str, origin: Origin) {
        self.constrain.push(Requirement {
            name: name.to_lowercase(),
            constraint: constraint.to_string(),
            origin,
        });
    }

    /// Make a locked package's metadata available to the solver
    pub fn lock(&mut self, package: Package) {
        self.locked.push(package);
    }

    pub fn requires(&self) -> &[Requirement] {
        &self.require
    }

    pub fn constraints(&self) -> &[Requirement] {
        &self.constrain
    }

    pub fn locked_packages(&self) -> &[Package] {
        &self.locked
    }

    /// Requirement for `name` of the given origin, if any
    pub fn find(&self, name: &str, origin: Origin) -> Option<&Requirement> {
        let name = name.to_lowercase();
        self.require
            .iter()
            .chain(self.constrain.iter())
            .find(|r| r.name == name && r.origin == origin)
    }

    /// Stable SHA-256 over the request contents, hex encoded.
    pub fn fingerprint(&self) -> String {
        // Serializing plain strings, vecs and ordered maps cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lowercases_names() {
        let mut request = Request::new();
        request.require("Vendor/A", "^1.0", Origin::Manifest);
        request.constrain("Vendor/B", "= 1.0.0", Origin::Lock);

        assert_eq!(request.requires()[0].name, "vendor/a");
        assert_eq!(request.constraints()[0].name, "vendor/b");
        assert!(request.find("VENDOR/B", Origin::Lock).is_some());
        assert!(request.find("vendor/b", Origin::Floor).is_none());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let build = || {
            let mut request = Request::new();
            request.require("a", "= 2.0.0", Origin::Target);
            request.constrain("b", "= 1.5.0", Origin::Lock);
            request.lock(Package::new("b", "1.5.0"));
            request
        };

        assert_eq!(build().fingerprint(), build().fingerprint());
        assert_eq!(build().fingerprint().len(), 64);

        let mut other = build();
        other.constrain("c", ">= 1.0", Origin::Floor);
        assert_ne!(build().fingerprint(), other.fingerprint());
    }
}
