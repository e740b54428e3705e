use std::cmp::Ordering;

/// Compare two version strings.
///
/// Versions are split into numeric and alphabetic runs. Numeric runs
/// compare as integers, a missing numeric run counts as `0`, and
/// alphabetic runs rank as stability markers (`dev` < `alpha` < `beta` <
/// `rc` < stable < `patch`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = split_version(strip_prefix(a));
    let b_parts = split_version(strip_prefix(b));

    let max_len = std::cmp::max(a_parts.len(), b_parts.len());

    for i in 0..max_len {
        let cmp = compare_part(
            a_parts.get(i).map(String::as_str),
            b_parts.get(i).map(String::as_str),
        );
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    Ordering::Equal
}

fn strip_prefix(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

pub(crate) fn split_version(version: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut prev_type: Option<CharType> = None;

    for c in version.chars() {
        let current_type = if c.is_ascii_digit() {
            CharType::Digit
        } else if c.is_alphabetic() {
            CharType::Alpha
        } else {
            CharType::Separator
        };

        if current_type == CharType::Separator {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            prev_type = None;
            continue;
        }

        if prev_type.is_some() && prev_type != Some(current_type) && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }

        current.push(c);
        prev_type = Some(current_type);
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

#[derive(Clone, Copy, PartialEq)]
enum CharType {
    Digit,
    Alpha,
    Separator,
}

fn compare_part(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(b)) => compare_part(Some(missing_counterpart(b)), Some(b)),
        (Some(a), None) => compare_part(Some(a), Some(missing_counterpart(a))),
        (Some(a), Some(b)) => match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(an), Ok(bn)) => an.cmp(&bn),
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => special_order(a).cmp(&special_order(b)),
        },
    }
}

// A missing run is zero next to a number and "stable" next to a suffix.
fn missing_counterpart(present: &str) -> &'static str {
    if present.parse::<u64>().is_ok() {
        "0"
    } else {
        "stable"
    }
}

fn special_order(s: &str) -> i32 {
    match s.to_lowercase().as_str() {
        "dev" => 0,
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "rc" => 3,
        "" | "stable" => 4,
        "patch" | "pl" | "p" => 5,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_numeric() {
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.0.0", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    }

    #[test]
    fn test_missing_parts_are_zero() {
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0", "1.0.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_stability_suffixes() {
        assert_eq!(compare_versions("1.0.0-beta", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0-alpha", "1.0.0-beta"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0-rc1", "1.0.0-beta2"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0-dev", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0", "2.0.0-dev"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0-patch1", "1.0.0"), Ordering::Greater);
    }

    #[test]
    fn test_leading_v() {
        assert_eq!(compare_versions("v1.2.3", "1.2.3"), Ordering::Equal);
    }

    #[test]
    fn test_split_version() {
        assert_eq!(split_version("1.0.0-beta2"), vec!["1", "0", "0", "beta", "2"]);
        assert_eq!(split_version("10.4"), vec!["10", "4"]);
    }
}
