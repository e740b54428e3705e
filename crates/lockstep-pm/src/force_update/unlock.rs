use std::fmt;

use indexmap::IndexSet;
use serde::Serialize;

/// Packages allowed to move away from their locked version.
///
/// Iterates in insertion order. Only ever grows within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnlockSet {
    names: IndexSet<String>,
}

impl UnlockSet {
    /// The initial set: just the target
    pub fn new(target: &str) -> Self {
        let mut names = IndexSet::new();
        names.insert(target.to_lowercase());
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl fmt::Display for UnlockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        f.write_str(&names.join(", "))
    }
}

/// Union `candidates` into `current`. The flag is true when the set grew.
pub fn expand<I>(current: &UnlockSet, candidates: I) -> (UnlockSet, bool)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut next = current.clone();
    for name in candidates {
        next.names.insert(name.as_ref().to_lowercase());
    }
    let progressed = next.len() > current.len();
    (next, progressed)
}
