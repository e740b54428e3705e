//! Forced single-package updates for locked dependency graphs.
//!
//! Given a manifest, its lock file and a target version for one package,
//! [`ForceUpdater`] produces a consistent resolution that contains exactly
//! that version. When the lock makes the target unreachable it widens the
//! set of packages allowed to move, driven by the conflicts the resolver
//! reports, until the graph solves or stops making progress.
//!
//! The layers, bottom up:
//!
//! - [`json`]: manifest and lock file models
//! - [`package`]: package metadata as seen by the solver
//! - [`repository`]: where candidate versions come from
//! - [`solver`]: a deterministic backtracking resolver with structured
//!   conflict diagnostics
//! - [`resolver`]: the capability the force-update loop talks to
//! - [`force_update`]: the convergence loop and its collaborators

pub mod config;
pub mod dependency;
pub mod force_update;
pub mod json;
pub mod package;
pub mod repository;
pub mod resolver;
pub mod solver;

pub use config::{ForceUpdateConfig, Isolation};
pub use dependency::{Dependency, DependencyFile, DependencyGraph, TargetConstraint};
pub use force_update::{ForceUpdate, ForceUpdateError, ForceUpdater};
pub use package::Package;
pub use resolver::{RepositoryResolver, Resolution, Resolver};
