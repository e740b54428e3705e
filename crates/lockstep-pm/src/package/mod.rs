// Package model
//
// The solver only needs a package's identity and what it requires; both
// locked packages and registry entries convert into this shape.

mod convert;
mod package;

pub use package::{Package, Stability};
