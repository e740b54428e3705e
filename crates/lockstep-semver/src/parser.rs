use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::constraint::{Constraint, ConstraintSet, Operator};

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(
        r"(?i)^v?(\d+)(\.\d+){0,3}(?:[-.]?(?:dev|alpha|beta|rc|a|b|patch|pl|p)(?:[.-]?\d+)*)?$"
    )
    .unwrap();
    static ref TERM_RE: Regex = Regex::new(
        r"(?P<op>~>|>=|<=|==|!=|<>|=|<|>|\^|~)?\s*(?P<version>[vV]?[0-9][0-9A-Za-z.*+-]*|\*|[xX])"
    )
    .unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid version string \"{0}\"")]
    InvalidVersion(String),

    #[error("Could not parse version constraint \"{constraint}\": {reason}")]
    InvalidConstraint { constraint: String, reason: String },
}

/// Parses versions and version constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionParser;

impl VersionParser {
    pub fn new() -> Self {
        VersionParser
    }

    /// Validate a concrete version and return its canonical form.
    ///
    /// The canonical form drops surrounding whitespace and a leading `v`.
    pub fn normalize(&self, version: &str) -> Result<String, ParseError> {
        let trimmed = version.trim();
        if !VERSION_RE.is_match(trimmed) {
            return Err(ParseError::InvalidVersion(version.to_string()));
        }

        Ok(trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed)
            .to_string())
    }

    /// Parse a constraint string such as `>= 1.0, < 2.0 || ^3.1`.
    pub fn parse_constraints(&self, constraints: &str) -> Result<ConstraintSet, ParseError> {
        let pretty = constraints.trim();
        if pretty.is_empty() {
            return Err(self.invalid(constraints, "empty constraint"));
        }

        let mut alternatives = Vec::new();
        for alternative in pretty.split("||") {
            alternatives.push(self.parse_conjunction(constraints, alternative)?);
        }

        Ok(ConstraintSet::new(alternatives, pretty))
    }

    fn parse_conjunction(&self, original: &str, text: &str) -> Result<Vec<Constraint>, ParseError> {
        let text = text.replace(',', " ");
        let text = text.trim();
        if text.is_empty() {
            return Err(self.invalid(original, "empty alternative"));
        }

        let mut constraints = Vec::new();
        let mut consumed = 0;
        for caps in TERM_RE.captures_iter(text) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
            if !text[consumed..whole.start].trim().is_empty() {
                return Err(self.invalid(
                    original,
                    &format!("unexpected \"{}\"", text[consumed..whole.start].trim()),
                ));
            }
            consumed = whole.end;

            let op = caps.name("op").map(|m| m.as_str()).unwrap_or("");
            let version = caps.name("version").map(|m| m.as_str()).unwrap_or("");
            constraints.extend(self.parse_term(original, op, version)?);
        }

        if !text[consumed..].trim().is_empty() {
            return Err(self.invalid(
                original,
                &format!("unexpected \"{}\"", text[consumed..].trim()),
            ));
        }

        Ok(constraints)
    }

    fn parse_term(&self, original: &str, op: &str, version: &str) -> Result<Vec<Constraint>, ParseError> {
        if version == "*" || version.eq_ignore_ascii_case("x") {
            if op.is_empty() || op == ">=" {
                return Ok(Vec::new());
            }
            return Err(self.invalid(original, "wildcard combined with an operator"));
        }

        if version.ends_with(".*") || version.ends_with(".x") || version.ends_with(".X") {
            if !op.is_empty() {
                return Err(self.invalid(original, "wildcard combined with an operator"));
            }
            let prefix = &version[..version.len() - 2];
            let parts = self.numeric_parts(original, prefix)?;
            let lower = pad(&parts, parts.len().max(3));
            let upper = self.upper_bound(original, &parts, parts.len() - 1)?;
            return Ok(vec![
                Constraint::new(Operator::GreaterThanOrEqual, lower),
                Constraint::new(Operator::LessThan, upper),
            ]);
        }

        let normalized = self
            .normalize(version)
            .map_err(|_| self.invalid(original, &format!("invalid version \"{}\"", version)))?;

        match op {
            "~>" | "~" => {
                let parts = self.numeric_parts(original, &normalized)?;
                // ~1 and ~1.2 allow the next major, ~1.2.3 the next minor.
                let position = if parts.len() <= 2 { 0 } else { parts.len() - 2 };
                Ok(vec![
                    Constraint::new(Operator::GreaterThanOrEqual, normalized),
                    Constraint::new(Operator::LessThan, self.upper_bound(original, &parts, position)?),
                ])
            }
            "^" => {
                let parts = self.numeric_parts(original, &normalized)?;
                let position = parts
                    .iter()
                    .position(|&p| p != 0)
                    .unwrap_or(parts.len() - 1);
                Ok(vec![
                    Constraint::new(Operator::GreaterThanOrEqual, normalized),
                    Constraint::new(Operator::LessThan, self.upper_bound(original, &parts, position)?),
                ])
            }
            "" => Ok(vec![Constraint::new(Operator::Equal, normalized)]),
            other => Constraint::from_str(other, normalized)
                .map(|c| vec![c])
                .map_err(|e| self.invalid(original, &e.to_string())),
        }
    }

    fn numeric_parts(&self, original: &str, version: &str) -> Result<Vec<u64>, ParseError> {
        let mut parts = Vec::new();
        for piece in version.split('.') {
            let digits: String = piece.chars().take_while(char::is_ascii_digit).collect();
            let value = digits
                .parse::<u64>()
                .map_err(|_| self.invalid(original, &format!("invalid version \"{}\"", version)))?;
            parts.push(value);
            if digits.len() != piece.len() {
                break;
            }
        }
        Ok(parts)
    }

    fn upper_bound(&self, original: &str, parts: &[u64], position: usize) -> Result<String, ParseError> {
        bump(parts, position).ok_or_else(|| self.invalid(original, "version component too large"))
    }

    fn invalid(&self, constraint: &str, reason: &str) -> ParseError {
        ParseError::InvalidConstraint {
            constraint: constraint.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn pad(parts: &[u64], len: usize) -> String {
    let mut padded: Vec<String> = parts.iter().map(u64::to_string).collect();
    while padded.len() < len {
        padded.push("0".to_string());
    }
    padded.join(".")
}

/// Upper bound that increments `parts[position]`, zeroes the rest and sorts
/// below every pre-release of that version. `None` when the component
/// cannot be incremented.
fn bump(parts: &[u64], position: usize) -> Option<String> {
    let mut bumped: Vec<u64> = parts[..=position].to_vec();
    bumped[position] = bumped[position].checked_add(1)?;
    Some(format!("{}-dev", pad(&bumped, parts.len().max(3))))
}
