//! Single version constraint implementation

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use super::Operator;
use crate::version::compare_versions;

#[derive(Error, Debug)]
pub enum ConstraintError {
    #[error("Invalid operator \"{operator}\", expected one of: {expected}")]
    InvalidOperator { operator: String, expected: String },
}

/// A single version constraint (e.g., ">= 1.0.0")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    operator: Operator,
    version: String,
}

impl Constraint {
    /// Create a new constraint
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Constraint {
            operator,
            version: version.into(),
        }
    }

    /// Create a constraint from operator string
    pub fn from_str(operator: &str, version: impl Into<String>) -> Result<Self, ConstraintError> {
        let op = Operator::from_str(operator).map_err(|_| ConstraintError::InvalidOperator {
            operator: operator.to_string(),
            expected: Operator::supported_operators().join(", "),
        })?;
        Ok(Self::new(op, version))
    }

    /// Get the version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the operator
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Whether `version` satisfies this constraint
    pub fn matches(&self, version: &str) -> bool {
        let cmp = compare_versions(version, &self.version);

        match self.operator {
            Operator::Equal => cmp == Ordering::Equal,
            Operator::NotEqual => cmp != Ordering::Equal,
            Operator::LessThan => cmp == Ordering::Less,
            Operator::LessThanOrEqual => cmp != Ordering::Greater,
            Operator::GreaterThan => cmp == Ordering::Greater,
            Operator::GreaterThanOrEqual => cmp != Ordering::Less,
        }
    }

    /// Whether this constraint caps versions from above
    pub fn is_upper_bound(&self) -> bool {
        matches!(
            self.operator,
            Operator::Equal | Operator::LessThan | Operator::LessThanOrEqual
        )
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}
