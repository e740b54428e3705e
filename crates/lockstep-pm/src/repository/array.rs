use std::path::Path;

use indexmap::IndexMap;

use super::{Repository, RepositoryError};
use crate::package::Package;

/// In-memory repository.
///
/// Can be filled programmatically or loaded from a JSON array of packages:
///
/// ```json
/// [ { "name": "acme/http", "version": "2.0.0", "require": { "acme/io": ">= 2.0" } } ]
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArrayRepository {
    name: String,
    packages: IndexMap<String, Vec<Package>>,
}

impl ArrayRepository {
    pub fn new() -> Self {
        Self {
            name: "array".to_string(),
            packages: IndexMap::new(),
        }
    }

    pub fn with_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        let mut repo = Self::new();
        for package in packages {
            repo.add_package(package);
        }
        repo
    }

    /// Parse a JSON array of packages. `source_name` names the repository.
    pub fn from_json(source_name: &str, content: &str) -> Result<Self, RepositoryError> {
        let packages: Vec<Package> =
            serde_json::from_str(content).map_err(|source| RepositoryError::Metadata {
                source_name: source_name.to_string(),
                source,
            })?;

        let mut repo = Self::with_packages(packages);
        repo.name = source_name.to_string();
        Ok(repo)
    }

    pub fn from_file(path: &Path) -> Result<Self, RepositoryError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| RepositoryError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&display, &content)
    }

    pub fn add_package(&mut self, package: Package) {
        self.packages
            .entry(package.name.to_lowercase())
            .or_default()
            .push(package);
    }

    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl Repository for ArrayRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn versions(&self, name: &str) -> Result<Vec<Package>, RepositoryError> {
        Ok(self
            .packages
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_by_name() {
        let repo = ArrayRepository::with_packages(vec![
            Package::new("Acme/HTTP", "1.0.0"),
            Package::new("acme/http", "2.0.0"),
            Package::new("acme/io", "1.0.0"),
        ]);

        assert_eq!(repo.len(), 3);
        let versions: Vec<_> = repo
            .versions("acme/http")
            .unwrap()
            .into_iter()
            .map(|p| p.version)
            .collect();
        assert_eq!(versions, vec!["1.0.0", "2.0.0"]);
        assert!(repo.versions("acme/none").unwrap().is_empty());
    }

    #[test]
    fn test_from_json() {
        let repo = ArrayRepository::from_json(
            "fixtures.json",
            r#"[{"name": "a", "version": "2.0.0", "require": {"b": ">= 2.0"}}, {"name": "b", "version": "2.0.0"}]"#,
        )
        .unwrap();

        assert_eq!(repo.name(), "fixtures.json");
        let a = &repo.versions("a").unwrap()[0];
        assert_eq!(a.require.get("b").map(String::as_str), Some(">= 2.0"));
        assert!(repo.versions("b").unwrap()[0].require.is_empty());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = ArrayRepository::from_json("broken.json", "{not json").unwrap_err();
        assert!(matches!(err, RepositoryError::Metadata { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        std::fs::write(&path, r#"[{"name": "a", "version": "1.0.0"}]"#).unwrap();

        let repo = ArrayRepository::from_file(&path).unwrap();
        assert_eq!(repo.len(), 1);

        let missing = ArrayRepository::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, RepositoryError::Io { .. }));
    }
}
