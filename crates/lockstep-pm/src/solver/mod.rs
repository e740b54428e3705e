//! Backtracking dependency resolver.
//!
//! # Architecture
//!
//! - [`Pool`]: every candidate package version for one resolution, looked up
//!   by name and constraint
//! - [`Request`]: root requirements (`require`) and conditional ones
//!   (`constrain`), each tagged with its [`Origin`]
//! - [`Policy`]: the order in which candidates are tried
//! - [`Solver`]: depth-first search over the names in the order they are
//!   first required
//! - [`ProblemSet`]: why the search failed, as requirement chains per package
//!
//! # Example
//!
//! ```ignore
//! use lockstep_pm::solver::{Origin, Pool, Policy, Request, Solver};
//!
//! let mut pool = Pool::new();
//! // ... add packages to pool
//!
//! let mut request = Request::new();
//! request.require("vendor/a", "^1.0", Origin::Manifest);
//!
//! let policy = Policy::default();
//! match Solver::new(&pool, &policy).solve(&request) {
//!     Ok(solution) => println!("{:?}", solution.versions()),
//!     Err(e) => println!("No solution: {}", e),
//! }
//! ```

mod policy;
mod pool;
mod problem;
mod request;
mod solver;


pub use policy::Policy;
pub use pool::{PackageId, Pool};
pub use problem::{Problem, ProblemSet, RequirementLink, RequirementTree, Requirer};
pub use request::{Origin, Request, Requirement};
pub use solver::{Solution, Solver, SolverError};
