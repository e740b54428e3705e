use std::fmt;

use crate::config::ForceUpdateConfig;
use crate::dependency::{DependencyFile, DependencyGraph, TargetConstraint};
use crate::resolver::{Resolution, Resolver};
use crate::solver::{Origin, ProblemSet, Request, Solution};

use super::context::{EnvironmentFailure, ExecutionContext};
use super::error::ForceUpdateError;
use super::unlock::UnlockSet;

/// A failure that is not a version conflict. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fatal {
    Environment(EnvironmentFailure),
    Resolver(String),
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fatal::Environment(failure) => write!(f, "{}", failure),
            Fatal::Resolver(message) => f.write_str(message),
        }
    }
}

impl From<Fatal> for ForceUpdateError {
    fn from(fatal: Fatal) -> Self {
        match fatal {
            Fatal::Environment(failure) => ForceUpdateError::Environment(failure),
            Fatal::Resolver(message) => ForceUpdateError::Resolver(message),
        }
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum ResolutionResult {
    Success(Solution),
    Conflict(ProblemSet),
    Fatal(Fatal),
}

/// Lower the graph, the unlock set and the target into a solver request.
///
/// - the target is required at exactly its version, as a root requirement
///   even when the manifest does not mention it
/// - unlocked manifest dependencies with a locked version are required at
///   `>= locked`; everything else in the manifest keeps its requirement
/// - locked packages outside the unlock set are pinned to their version
///   should they stay in the solution
/// - unlocked transitive packages keep a `>= locked` floor
pub fn build_request(graph: &DependencyGraph, unlock: &UnlockSet, target: &TargetConstraint) -> Request {
    let mut request = Request::new();
    let exact = format!("= {}", target.version());

    for dep in graph.dependencies() {
        if dep.name == target.name() {
            request.require(&dep.name, &exact, Origin::Target);
        } else if unlock.contains(&dep.name) {
            match dep.version {
                Some(ref version) => request.require(&dep.name, &format!(">= {}", version), Origin::Floor),
                None => request.require(&dep.name, &dep.requirement, Origin::Manifest),
            }
        } else {
            request.require(&dep.name, &dep.requirement, Origin::Manifest);
        }
    }

    if graph.dependency(target.name()).is_none() {
        request.require(target.name(), &exact, Origin::Target);
    }

    for (name, package) in graph.locked() {
        request.lock(package.clone());

        if name == target.name() {
            continue;
        }
        if !unlock.contains(name) {
            request.constrain(name, &format!("= {}", package.version), Origin::Lock);
        } else if graph.dependency(name).is_none() {
            request.constrain(name, &format!(">= {}", package.version), Origin::Floor);
        }
    }

    request
}

/// Runs one attempt: stages the files, rebuilds the graph from the staged
/// copy, lowers it and hands it to the resolver.
pub struct ResolverAdapter<'a, R, C> {
    resolver: &'a R,
    context: &'a C,
    files: &'a [DependencyFile],
    config: &'a ForceUpdateConfig,
}

impl<'a, R: Resolver, C: ExecutionContext> ResolverAdapter<'a, R, C> {
    pub fn new(
        resolver: &'a R,
        context: &'a C,
        files: &'a [DependencyFile],
        config: &'a ForceUpdateConfig,
    ) -> Self {
        Self {
            resolver,
            context,
            files,
            config,
        }
    }

    pub fn attempt(&self, unlock: &UnlockSet, target: &TargetConstraint) -> ResolutionResult {
        let outcome = self.context.run(self.files, |workspace| {
            let graph = DependencyGraph::from_workspace(workspace, self.config)?;
            let request = build_request(&graph, unlock, target);
            log::debug!(
                "Resolving with [{}] unlocked (request {})",
                unlock,
                request.fingerprint()
            );
            Ok::<_, crate::dependency::InputError>(self.resolver.solve(&request))
        });

        match outcome {
            Ok(Ok(Resolution::Solved(solution))) => ResolutionResult::Success(solution),
            Ok(Ok(Resolution::Conflict(problems))) => ResolutionResult::Conflict(problems),
            Ok(Ok(Resolution::Fatal(message))) => ResolutionResult::Fatal(Fatal::Resolver(message)),
            Ok(Err(e)) => ResolutionResult::Fatal(Fatal::Environment(EnvironmentFailure::new(
                "StagingError",
                e.to_string(),
            ))),
            Err(failure) => ResolutionResult::Fatal(Fatal::Environment(failure)),
        }
    }
}
