use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use lockstep_semver::{ConstraintSet, ParseError, VersionParser};

use crate::package::Package;

/// Index of a package version in the [`Pool`].
pub type PackageId = usize;

/// Pool of all candidate package versions for one resolution.
///
/// Each name/version pair is stored once; adding a duplicate returns the
/// existing ID. Names are indexed lowercase.
pub struct Pool {
    packages: Vec<Arc<Package>>,

    /// Package IDs indexed by name (lowercase)
    packages_by_name: HashMap<String, Vec<PackageId>>,

    /// Cached parsed constraints (constraint string -> parsed constraint)
    parsed_constraints: RefCell<HashMap<String, Result<ConstraintSet, ParseError>>>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("packages", &self.packages)
            .field("packages_by_name", &self.packages_by_name)
            .finish()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Self {
            packages: Vec::new(),
            packages_by_name: HashMap::new(),
            parsed_constraints: RefCell::new(HashMap::new()),
        }
    }

    /// Add a package to the pool, returning its ID
    pub fn add_package(&mut self, package: Package) -> PackageId {
        if let Some(id) = self.find_package_id(&package.name, &package.version) {
            return id;
        }

        let id = self.packages.len();
        self.packages_by_name
            .entry(package.name.to_lowercase())
            .or_default()
            .push(id);
        self.packages.push(Arc::new(package));
        id
    }

    /// Find a package ID by name and version
    pub fn find_package_id(&self, name: &str, version: &str) -> Option<PackageId> {
        self.packages_by_name(name)
            .iter()
            .copied()
            .find(|&id| self.packages[id].version == version)
    }

    pub fn package(&self, id: PackageId) -> Option<&Arc<Package>> {
        self.packages.get(id)
    }

    /// All versions of a package, in insertion order
    pub fn packages_by_name(&self, name: &str) -> &[PackageId] {
        self.packages_by_name
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_name(&self, name: &str) -> bool {
        !self.packages_by_name(name).is_empty()
    }

    /// Versions of `name` matching `constraint` (all versions when `None`)
    pub fn what_provides(&self, name: &str, constraint: Option<&str>) -> Result<Vec<PackageId>, ParseError> {
        let ids = self.packages_by_name(name);
        let Some(constraint) = constraint else {
            return Ok(ids.to_vec());
        };

        let parsed = self.parse_constraint(constraint)?;
        Ok(ids
            .iter()
            .copied()
            .filter(|&id| parsed.matches(&self.packages[id].version))
            .collect())
    }

    /// Parse a constraint string, caching the result
    pub fn parse_constraint(&self, constraint: &str) -> Result<ConstraintSet, ParseError> {
        if let Some(cached) = self.parsed_constraints.borrow().get(constraint) {
            return cached.clone();
        }

        let parsed = VersionParser::new().parse_constraints(constraint);
        self.parsed_constraints
            .borrow_mut()
            .insert(constraint.to_string(), parsed.clone());
        parsed
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut pool = Pool::new();
        let a1 = pool.add_package(Package::new("Vendor/A", "1.0.0"));
        let a2 = pool.add_package(Package::new("vendor/a", "2.0.0"));

        assert_eq!(pool.packages_by_name("vendor/a"), &[a1, a2]);
        assert_eq!(pool.package(a2).unwrap().version, "2.0.0");
        assert!(pool.contains_name("VENDOR/A"));
        assert!(!pool.contains_name("vendor/b"));
    }

    #[test]
    fn test_duplicates_share_id() {
        let mut pool = Pool::new();
        let first = pool.add_package(Package::new("a", "1.0.0"));
        let second = pool.add_package(Package::new("a", "1.0.0"));
        assert_eq!(first, second);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_what_provides() {
        let mut pool = Pool::new();
        pool.add_package(Package::new("a", "1.0.0"));
        let a15 = pool.add_package(Package::new("a", "1.5.0"));
        let a20 = pool.add_package(Package::new("a", "2.0.0"));

        assert_eq!(pool.what_provides("a", Some(">= 1.5")).unwrap(), vec![a15, a20]);
        assert_eq!(pool.what_provides("a", None).unwrap().len(), 3);
        assert!(pool.what_provides("b", Some("*")).unwrap().is_empty());
        assert!(pool.what_provides("a", Some("not a constraint")).is_err());
    }
}
