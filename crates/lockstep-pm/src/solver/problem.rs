use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::request::Origin;

/// Who imposes a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Requirer {
    /// A root-level requirement of the request
    Root { origin: Origin },
    /// A selected package version
    Package { name: String, version: String },
}

impl fmt::Display for Requirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirer::Root { origin } => write!(f, "{}", origin),
            Requirer::Package { name, version } => write!(f, "{} {}", name, version),
        }
    }
}

/// One step of a requirement chain: `requirer` requires `name` at `constraint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequirementLink {
    pub requirer: Requirer,
    pub name: String,
    pub constraint: String,
}

impl fmt::Display for RequirementLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {} {}", self.requirer, self.name, self.constraint)
    }
}

/// The chain of requirements, starting at the root, that leads to one
/// constraint on a conflicting package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequirementTree {
    pub links: Vec<RequirementLink>,
}

impl RequirementTree {
    pub fn new(links: Vec<RequirementLink>) -> Self {
        Self { links }
    }

    /// Name of the root-level package the chain starts from
    pub fn first_name(&self) -> Option<&str> {
        self.links.first().map(|l| l.name.as_str())
    }

    /// The constraint at the end of the chain
    pub fn last(&self) -> Option<&RequirementLink> {
        self.links.last()
    }
}

impl fmt::Display for RequirementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.links.iter().map(|l| l.to_string()).collect();
        f.write_str(&steps.join(" -> "))
    }
}

/// A problem encountered during dependency resolution.
///
/// Problems explain why no version of `package` can be selected: each tree
/// is one requirement on it, with the chain that introduced that requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub package: String,
    pub trees: Vec<RequirementTree>,
    /// Human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Problem {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            trees: Vec::new(),
            message: None,
        }
    }

    pub fn add_tree(&mut self, tree: RequirementTree) {
        if !self.trees.contains(&tree) {
            self.trees.push(tree);
        }
    }

    /// Set a custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Generate a human-readable description of this problem
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref msg) = self.message {
            lines.push(msg.clone());
        } else {
            lines.push(format!("No version of {} satisfies every requirement:", self.package));
        }
        for tree in &self.trees {
            lines.push(format!("  - {}", tree));
        }
        lines.join("\n")
    }
}

/// Collection of problems encountered during solving, one per package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblemSet {
    problems: IndexMap<String, Problem>,
}

impl ProblemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem, replacing an earlier one for the same package
    pub fn add(&mut self, problem: Problem) {
        self.problems.insert(problem.package.clone(), problem);
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn get(&self, package: &str) -> Option<&Problem> {
        self.problems.get(package)
    }

    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.problems.values()
    }

    /// Generate a complete description of all problems
    pub fn describe(&self) -> String {
        let descriptions: Vec<_> = self
            .problems()
            .enumerate()
            .map(|(i, p)| format!("Problem {}:\n{}", i + 1, p.describe()))
            .collect();

        if descriptions.is_empty() {
            "No problems found".to_string()
        } else {
            descriptions.join("\n\n")
        }
    }
}

impl FromIterator<Problem> for ProblemSet {
    fn from_iter<I: IntoIterator<Item = Problem>>(iter: I) -> Self {
        let mut set = ProblemSet::new();
        for problem in iter {
            set.add(problem);
        }
        set
    }
}

impl fmt::Display for ProblemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} problem(s) found", self.problems.len())
    }
}
