use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use lockstep_semver::{ConstraintSet, ParseError};
use thiserror::Error;

use super::policy::Policy;
use super::pool::{PackageId, Pool};
use super::problem::{Problem, ProblemSet, RequirementLink, RequirementTree, Requirer};
use super::request::{Request, Requirement};
use crate::package::Package;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Your requirements could not be resolved to an installable set of packages ({0})")]
    Unsolvable(ProblemSet),

    #[error("Invalid constraint \"{constraint}\" on {name} required by {requirer}: {source}")]
    InvalidConstraint {
        name: String,
        constraint: String,
        requirer: String,
        #[source]
        source: ParseError,
    },
}

/// A consistent set of selected package versions.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    packages: IndexMap<String, Arc<Package>>,
}

impl Solution {
    /// Selected packages in selection order
    pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.packages.values()
    }

    pub fn package(&self, name: &str) -> Option<&Arc<Package>> {
        self.packages.get(&name.to_lowercase())
    }

    /// Lowercase package name -> selected version
    pub fn versions(&self) -> IndexMap<String, String> {
        self.packages
            .iter()
            .map(|(name, p)| (name.clone(), p.version.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// One active constraint on a package name.
struct Edge {
    name: String,
    constraint: ConstraintSet,
    chain: Vec<RequirementLink>,
    /// Required edges force the package into the solution
    required: bool,
}

/// Depth-first backtracking resolver.
///
/// Names are decided in the order they are first required. A name's
/// candidates are the pool versions matching every active constraint on it,
/// tried in policy order. When a name has no candidate, or a newly selected
/// version contradicts an earlier selection, a [`Problem`] is recorded for
/// that name listing every constraint on it and the chain behind each.
/// Failures jump back to the latest selection that contributed to them.
pub struct Solver<'a> {
    pool: &'a Pool,
    policy: &'a Policy,
}

impl<'a> Solver<'a> {
    pub fn new(pool: &'a Pool, policy: &'a Policy) -> Self {
        Self { pool, policy }
    }

    pub fn solve(&self, request: &Request) -> Result<Solution, SolverError> {
        let mut edges = Vec::new();
        for requirement in request.requires() {
            edges.push(self.root_edge(requirement, true)?);
        }
        for requirement in request.constraints() {
            edges.push(self.root_edge(requirement, false)?);
        }

        let mut search = Search {
            pool: self.pool,
            policy: self.policy,
            problems: ProblemSet::new(),
            steps: 0,
        };
        let mut selected = IndexMap::new();

        if let Branch::Solved = search.run(&mut selected, &mut edges)? {
            log::debug!(
                "Solved {} package(s) in {} step(s)",
                selected.len(),
                search.steps
            );
            let packages = selected
                .into_iter()
                .filter_map(|(name, id)| self.pool.package(id).map(|p| (name, Arc::clone(p))))
                .collect();
            return Ok(Solution { packages });
        }

        log::debug!(
            "No solution after {} step(s), {} problem(s)",
            search.steps,
            search.problems.len()
        );
        Err(SolverError::Unsolvable(search.problems))
    }

    fn root_edge(&self, requirement: &Requirement, required: bool) -> Result<Edge, SolverError> {
        let requirer = Requirer::Root {
            origin: requirement.origin,
        };
        let constraint = self
            .pool
            .parse_constraint(&requirement.constraint)
            .map_err(|source| SolverError::InvalidConstraint {
                name: requirement.name.clone(),
                constraint: requirement.constraint.clone(),
                requirer: requirer.to_string(),
                source,
            })?;

        Ok(Edge {
            name: requirement.name.clone(),
            constraint,
            chain: vec![RequirementLink {
                requirer,
                name: requirement.name.clone(),
                constraint: requirement.constraint.clone(),
            }],
            required,
        })
    }
}

struct Search<'a> {
    pool: &'a Pool,
    policy: &'a Policy,
    problems: ProblemSet,
    steps: usize,
}

/// Outcome of exploring one branch of the search.
enum Branch {
    Solved,
    /// Lowercase names of the selections that together make the branch fail
    Failed(IndexSet<String>),
}

impl Search<'_> {
    /// Conflict-directed backtracking: a failed branch reports the
    /// selections responsible for it, and a decision that is not among them
    /// is skipped over instead of retried with its other candidates.
    fn run(
        &mut self,
        selected: &mut IndexMap<String, PackageId>,
        edges: &mut Vec<Edge>,
    ) -> Result<Branch, SolverError> {
        self.steps += 1;

        let Some(next) = edges
            .iter()
            .find(|e| e.required && !selected.contains_key(&e.name))
            .map(|e| e.name.clone())
        else {
            return Ok(Branch::Solved);
        };

        let available = self.pool.packages_by_name(&next);
        if available.is_empty() {
            let problem = self
                .problem_for(&next, edges)
                .with_message(format!("No package named {} could be found", next));
            self.problems.add(problem);
            return Ok(Branch::Failed(self.culprits(&next, edges)));
        }

        let candidates: Vec<PackageId> = available
            .iter()
            .copied()
            .filter(|&id| self.satisfies_all(&next, id, edges))
            .collect();
        if candidates.is_empty() {
            let problem = self.problem_for(&next, edges);
            self.problems.add(problem);
            return Ok(Branch::Failed(self.culprits(&next, edges)));
        }

        // The package hangs off the chain of the first requirement that asked for it.
        let chain = edges
            .iter()
            .find(|e| e.required && e.name == next)
            .map(|e| e.chain.clone())
            .unwrap_or_default();

        // Whatever narrowed the candidates is part of any failure below.
        let mut conflict = self.culprits(&next, edges);

        for id in self.policy.rank(self.pool, &candidates) {
            let Some(package) = self.pool.package(id).map(Arc::clone) else {
                continue;
            };

            let mark = edges.len();
            let mut culprits = match self.add_requirements(&package, &next, &chain, selected, edges)? {
                Some(culprits) => culprits,
                None => {
                    selected.insert(next.clone(), id);
                    match self.run(selected, edges)? {
                        Branch::Solved => return Ok(Branch::Solved),
                        Branch::Failed(culprits) => {
                            selected.pop();
                            culprits
                        }
                    }
                }
            };
            edges.truncate(mark);

            // Another version of `next` cannot fix a failure it took no part in.
            if !culprits.shift_remove(&next) {
                return Ok(Branch::Failed(culprits));
            }
            conflict.extend(culprits);
        }

        Ok(Branch::Failed(conflict))
    }

    /// Push the edges of `package`'s requirements. If one contradicts an
    /// existing selection, records a problem and returns the names involved.
    fn add_requirements(
        &mut self,
        package: &Package,
        name: &str,
        chain: &[RequirementLink],
        selected: &IndexMap<String, PackageId>,
        edges: &mut Vec<Edge>,
    ) -> Result<Option<IndexSet<String>>, SolverError> {
        let requirer = Requirer::Package {
            name: package.name.clone(),
            version: package.version.clone(),
        };

        for (dep, constraint) in &package.require {
            let dep_name = dep.to_lowercase();
            let parsed = self
                .pool
                .parse_constraint(constraint)
                .map_err(|source| SolverError::InvalidConstraint {
                    name: dep_name.clone(),
                    constraint: constraint.clone(),
                    requirer: requirer.to_string(),
                    source,
                })?;

            let mut dep_chain = chain.to_vec();
            dep_chain.push(RequirementLink {
                requirer: requirer.clone(),
                name: dep_name.clone(),
                constraint: constraint.clone(),
            });

            let current = if dep_name == name {
                Some(package.version.clone())
            } else {
                selected
                    .get(&dep_name)
                    .and_then(|&id| self.pool.package(id))
                    .map(|p| p.version.clone())
            };
            let contradicts = current.map_or(false, |v| !parsed.matches(&v));

            edges.push(Edge {
                name: dep_name.clone(),
                constraint: parsed,
                chain: dep_chain,
                required: true,
            });

            if contradicts {
                let problem = self.problem_for(&dep_name, edges);
                self.problems.add(problem);
                let mut culprits = IndexSet::new();
                culprits.insert(name.to_string());
                culprits.insert(dep_name);
                return Ok(Some(culprits));
            }
        }

        Ok(None)
    }

    /// Selected packages whose requirements constrain `name`. Root-level
    /// constraints hold on every branch and name no one.
    fn culprits(&self, name: &str, edges: &[Edge]) -> IndexSet<String> {
        edges
            .iter()
            .filter(|e| e.name == name)
            .filter_map(|e| match e.chain.last().map(|l| &l.requirer) {
                Some(Requirer::Package { name: requirer, .. }) => Some(requirer.to_lowercase()),
                _ => None,
            })
            .collect()
    }

    fn satisfies_all(&self, name: &str, id: PackageId, edges: &[Edge]) -> bool {
        let Some(package) = self.pool.package(id) else {
            return false;
        };
        edges
            .iter()
            .filter(|e| e.name == name)
            .all(|e| e.constraint.matches(&package.version))
    }

    fn problem_for(&self, name: &str, edges: &[Edge]) -> Problem {
        let mut problem = Problem::new(name);
        for edge in edges.iter().filter(|e| e.name == name) {
            problem.add_tree(RequirementTree::new(edge.chain.clone()));
        }
        problem
    }
}
