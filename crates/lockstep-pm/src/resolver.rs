//! The resolution capability consumed by the force-update loop.

use std::collections::{HashSet, VecDeque};

use crate::repository::{Repository, RepositoryError};
use crate::solver::{Policy, Pool, ProblemSet, Request, Solution, Solver, SolverError};

/// Outcome of one resolution.
#[derive(Debug)]
pub enum Resolution {
    /// Every requirement satisfied
    Solved(Solution),
    /// The requirements contradict each other
    Conflict(ProblemSet),
    /// Anything else: unreachable registry, bad metadata, invalid constraints
    Fatal(String),
}

/// Solves a [`Request`].
pub trait Resolver {
    fn solve(&self, request: &Request) -> Resolution;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn solve(&self, request: &Request) -> Resolution {
        (**self).solve(request)
    }
}

/// Resolver backed by package repositories.
///
/// A fresh [`Pool`] is built for every request: the request's locked
/// packages, then every version the repositories know of each name reachable
/// from the root requirements.
#[derive(Default)]
pub struct RepositoryResolver {
    repositories: Vec<Box<dyn Repository>>,
    policy: Policy,
}

impl RepositoryResolver {
    pub fn new(policy: Policy) -> Self {
        Self {
            repositories: Vec::new(),
            policy,
        }
    }

    pub fn add_repository(&mut self, repository: Box<dyn Repository>) {
        self.repositories.push(repository);
    }

    pub fn with_repository(mut self, repository: impl Repository + 'static) -> Self {
        self.add_repository(Box::new(repository));
        self
    }

    pub fn repository_count(&self) -> usize {
        self.repositories.len()
    }

    /// Load the pool for a request
    pub fn build_pool(&self, request: &Request) -> Result<Pool, RepositoryError> {
        let mut pool = Pool::new();
        for package in request.locked_packages() {
            pool.add_package(package.clone());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = request.requires().iter().map(|r| r.name.clone()).collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }

            for repository in &self.repositories {
                let versions = repository.versions(&name)?;
                log::trace!("{} has {} version(s) of {}", repository.name(), versions.len(), name);
                for package in versions {
                    pool.add_package(package);
                }
            }

            for &id in pool.packages_by_name(&name) {
                if let Some(package) = pool.package(id) {
                    for dep in package.require.keys() {
                        let dep = dep.to_lowercase();
                        if !seen.contains(&dep) {
                            queue.push_back(dep);
                        }
                    }
                }
            }
        }

        log::debug!("Pool holds {} package version(s)", pool.len());
        Ok(pool)
    }
}

impl Resolver for RepositoryResolver {
    fn solve(&self, request: &Request) -> Resolution {
        let pool = match self.build_pool(request) {
            Ok(pool) => pool,
            Err(e) => return Resolution::Fatal(e.to_string()),
        };

        match Solver::new(&pool, &self.policy).solve(request) {
            Ok(solution) => Resolution::Solved(solution),
            Err(SolverError::Unsolvable(problems)) => Resolution::Conflict(problems),
            Err(e) => Resolution::Fatal(e.to_string()),
        }
    }
}
