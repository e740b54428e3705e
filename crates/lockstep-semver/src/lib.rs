//! Version comparison and constraint parsing.
//!
//! Versions are dotted numeric strings with an optional stability suffix
//! (`1.2.3`, `v2.0`, `3.0.0-beta.1`). Constraints combine comparison
//! operators with `,` (and) and `||` (or), and understand the common
//! range shorthands: `~>`, `~`, `^` and `1.2.*` wildcards.

pub mod constraint;
mod parser;
mod version;

pub use constraint::{Constraint, ConstraintSet, Operator};
pub use parser::{ParseError, VersionParser};
pub use version::compare_versions;
