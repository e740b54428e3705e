use std::fmt;

use super::{Constraint, Operator};

/// A parsed requirement: a disjunction of conjunctions of [`Constraint`]s.
///
/// An alternative with no constraints matches every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSet {
    alternatives: Vec<Vec<Constraint>>,
    pretty: String,
}

impl ConstraintSet {
    pub fn new(alternatives: Vec<Vec<Constraint>>, pretty: impl Into<String>) -> Self {
        Self {
            alternatives,
            pretty: pretty.into(),
        }
    }

    /// Matches every version (`*`)
    pub fn any() -> Self {
        Self::new(vec![Vec::new()], "*")
    }

    /// Matches exactly `version`
    pub fn exact(version: &str) -> Self {
        Self::new(
            vec![vec![Constraint::new(Operator::Equal, version)]],
            format!("= {}", version),
        )
    }

    /// Matches `version` and anything newer
    pub fn at_least(version: &str) -> Self {
        Self::new(
            vec![vec![Constraint::new(Operator::GreaterThanOrEqual, version)]],
            format!(">= {}", version),
        )
    }

    /// Whether `version` satisfies the requirement
    pub fn matches(&self, version: &str) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|c| c.matches(version)))
    }

    /// Whether every alternative caps versions from above
    pub fn has_upper_bound(&self) -> bool {
        !self.alternatives.is_empty()
            && self
                .alternatives
                .iter()
                .all(|all| all.iter().any(Constraint::is_upper_bound))
    }

    pub fn alternatives(&self) -> &[Vec<Constraint>] {
        &self.alternatives
    }

    /// The requirement as originally written
    pub fn pretty_string(&self) -> &str {
        &self.pretty
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_matches_everything() {
        let any = ConstraintSet::any();
        assert!(any.matches("0.0.1"));
        assert!(any.matches("99.0"));
        assert!(!any.has_upper_bound());
    }

    #[test]
    fn test_exact() {
        let exact = ConstraintSet::exact("2.0.0");
        assert!(exact.matches("2.0"));
        assert!(!exact.matches("2.0.1"));
        assert!(exact.has_upper_bound());
        assert_eq!(exact.to_string(), "= 2.0.0");
    }

    #[test]
    fn test_at_least() {
        let floor = ConstraintSet::at_least("1.5");
        assert!(floor.matches("1.5.0"));
        assert!(floor.matches("3.0"));
        assert!(!floor.matches("1.4.9"));
        assert!(!floor.has_upper_bound());
    }
}
