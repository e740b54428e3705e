//! Forcing one package to an exact version.
//!
//! The updater starts with only the target unlocked. Each attempt either
//! solves, fails outright, or conflicts; on a conflict the first package of
//! every requirement chain in the diagnostics is unlocked too and the attempt
//! is repeated. A conflict that implicates nothing new ends the run, so the
//! loop runs at most once per package in the graph.

mod adapter;
mod context;
mod error;
mod interpreter;
mod unlock;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use indexmap::IndexMap;
use lockstep_semver::compare_versions;
use serde::Serialize;

use crate::config::ForceUpdateConfig;
use crate::dependency::{DependencyFile, DependencyGraph, TargetConstraint};
use crate::json::LockFile;
use crate::package::Package;
use crate::resolver::Resolver;
use crate::solver::{ProblemSet, Solution};

pub use adapter::{build_request, Fatal, ResolutionResult, ResolverAdapter};
pub use context::{
    EnvironmentFailure, ExecutionContext, InProcessContext, Sandbox, TempDirContext, Workspace,
};
pub use error::ForceUpdateError;
pub use interpreter::root_causes;
pub use unlock::{expand, UnlockSet};

/// A successful forced update.
#[derive(Debug, Clone, Serialize)]
pub struct ForceUpdate {
    pub name: String,
    pub resolved_version: String,
    /// Packages that had to move, the target first
    pub unlocked_packages: Vec<String>,
    /// Every resolved package, lowercase name -> version
    pub versions: IndexMap<String, String>,
    pub attempts: usize,
    #[serde(skip)]
    packages: Vec<Package>,
}

impl ForceUpdate {
    /// Resolved packages with their metadata
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// The resolution as a lock file
    pub fn to_lock(&self) -> LockFile {
        LockFile::from_packages(&self.packages)
    }
}

enum State {
    Attempting(UnlockSet),
    Expanding(UnlockSet, ProblemSet),
    Succeeded(ForceUpdate),
    Failed(ForceUpdateError),
}

/// Drives attempts until the target resolves or no progress can be made.
pub struct ForceUpdater<R, C> {
    resolver: R,
    context: C,
    config: ForceUpdateConfig,
}

impl<R: Resolver, C: ExecutionContext> ForceUpdater<R, C> {
    pub fn new(resolver: R, context: C, config: ForceUpdateConfig) -> Self {
        Self {
            resolver,
            context,
            config,
        }
    }

    pub fn config(&self) -> &ForceUpdateConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Force `name` to exactly `version` given the manifest and lock in `files`.
    pub fn run(&self, files: &[DependencyFile], name: &str, version: &str) -> Result<ForceUpdate, ForceUpdateError> {
        let target = TargetConstraint::new(name, version)?;
        let graph = DependencyGraph::load(files, &self.config)?;

        log::info!(
            "Forcing {} to {} ({} package(s) in graph)",
            target.name(),
            target.version(),
            graph.package_count()
        );

        let adapter = ResolverAdapter::new(&self.resolver, &self.context, files, &self.config);
        let mut attempts = 0;
        let mut state = State::Attempting(UnlockSet::new(target.name()));

        loop {
            state = match state {
                State::Attempting(unlock) => {
                    attempts += 1;
                    log::debug!("Attempt {}", attempts);
                    match adapter.attempt(&unlock, &target) {
                        ResolutionResult::Success(solution) => {
                            match finish(&target, unlock, solution, attempts) {
                                Ok(update) => State::Succeeded(update),
                                Err(e) => State::Failed(e),
                            }
                        }
                        ResolutionResult::Conflict(problems) => {
                            log::warn!(
                                "Attempt {} conflicted: {}",
                                attempts,
                                problems.describe().replace('\n', " ")
                            );
                            State::Expanding(unlock, problems)
                        }
                        ResolutionResult::Fatal(fatal) => {
                            log::warn!("Attempt {} failed: {}", attempts, fatal);
                            State::Failed(fatal.into())
                        }
                    }
                }
                State::Expanding(unlock, problems) => {
                    let causes = root_causes(&problems);
                    let (next, progressed) = expand(&unlock, &causes);
                    if progressed {
                        log::debug!("Unlocking [{}]", next);
                        State::Attempting(next)
                    } else {
                        State::Failed(ForceUpdateError::NotResolvable {
                            name: target.name().to_string(),
                            version: target.version().to_string(),
                            unlocked: next,
                            problems,
                        })
                    }
                }
                State::Succeeded(update) => {
                    log::info!(
                        "Resolved {} to {} after {} attempt(s), unlocked [{}]",
                        update.name,
                        update.resolved_version,
                        update.attempts,
                        update.unlocked_packages.join(", ")
                    );
                    return Ok(update);
                }
                State::Failed(error) => {
                    log::warn!("Giving up on {}: {}", target.name(), error);
                    return Err(error);
                }
            };
        }
    }
}

/// Check the postcondition and build the output.
fn finish(
    target: &TargetConstraint,
    unlock: UnlockSet,
    solution: Solution,
    attempts: usize,
) -> Result<ForceUpdate, ForceUpdateError> {
    let versions = solution.versions();
    let resolved = match versions.get(target.name()) {
        Some(version) if compare_versions(version, target.version()) == Ordering::Equal => version.clone(),
        Some(version) => {
            return Err(ForceUpdateError::Resolver(format!(
                "{} resolved to {} instead of {}",
                target.name(),
                version,
                target.version()
            )))
        }
        None => {
            return Err(ForceUpdateError::Resolver(format!(
                "{} is missing from the resolution",
                target.name()
            )))
        }
    };

    Ok(ForceUpdate {
        name: target.name().to_string(),
        resolved_version: resolved,
        unlocked_packages: unlock.to_vec(),
        versions,
        attempts,
        packages: solution.packages().map(|p| Package::clone(p)).collect(),
    })
}
