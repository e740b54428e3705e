use thiserror::Error;

use super::context::EnvironmentFailure;
use super::unlock::UnlockSet;
use crate::dependency::InputError;
use crate::solver::ProblemSet;

#[derive(Error, Debug)]
pub enum ForceUpdateError {
    /// Conflicts stopped implicating packages that are still locked
    #[error("{name} cannot be updated to {version}: still conflicting after unlocking {unlocked} ({problems})")]
    NotResolvable {
        name: String,
        version: String,
        unlocked: UnlockSet,
        problems: ProblemSet,
    },

    #[error(transparent)]
    Environment(#[from] EnvironmentFailure),

    #[error("Malformed input: {0}")]
    MalformedInput(#[from] InputError),

    #[error("Resolution failed: {0}")]
    Resolver(String),
}

impl ForceUpdateError {
    /// Full human-readable diagnostics, when the failure has any
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            ForceUpdateError::NotResolvable { problems, .. } => Some(problems.describe()),
            _ => None,
        }
    }
}
