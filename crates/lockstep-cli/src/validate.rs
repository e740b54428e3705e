//! Validate command - check the manifest and lock file.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use lockstep_pm::{DependencyGraph, ForceUpdateConfig};
use lockstep_semver::VersionParser;

use crate::force_update::read_dependency_files;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Output as JSON
    #[arg(long = "json")]
    pub format_json: bool,

    /// Working directory
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<i32> {
    let working_dir = args.working_dir.canonicalize()
        .context("Failed to resolve working directory")?;

    let config = ForceUpdateConfig::from_env();
    let files = read_dependency_files(&working_dir, &config)?;

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    match DependencyGraph::load(&files, &config) {
        Ok(graph) => warnings.extend(check_graph(&graph)),
        Err(e) => errors.push(e.to_string()),
    }

    print_results(&errors, &warnings, args.format_json, args.strict, &config.manifest_name)
}

/// Disagreements between the manifest and the lock.
fn check_graph(graph: &DependencyGraph) -> Vec<String> {
    let parser = VersionParser::new();
    let mut warnings = Vec::new();

    for dep in graph.dependencies() {
        let Some(ref version) = dep.version else {
            warnings.push(format!("{} is required but not locked", dep.name));
            continue;
        };

        // Requirements were validated while loading.
        if let Ok(constraint) = parser.parse_constraints(&dep.requirement) {
            if !constraint.matches(version) {
                warnings.push(format!(
                    "{} is locked at {} which does not satisfy {}",
                    dep.name, version, dep.requirement
                ));
            }
        }
    }

    for (name, package) in graph.locked() {
        for (dep, requirement) in &package.require {
            if graph.locked_version(dep).is_none() {
                warnings.push(format!("{} requires {} {} which is not locked", name, dep, requirement));
            }
        }
    }

    warnings
}

fn print_results(
    errors: &[String],
    warnings: &[String],
    as_json: bool,
    strict: bool,
    manifest_name: &str,
) -> Result<i32> {
    if as_json {
        let result = serde_json::json!({
            "valid": errors.is_empty() && (!strict || warnings.is_empty()),
            "errors": errors,
            "warnings": warnings
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for error in errors {
            eprintln!("{} {}", style("Error:").red().bold(), error);
        }

        for warning in warnings {
            println!("{} {}", style("Warning:").yellow().bold(), warning);
        }

        if errors.is_empty() && warnings.is_empty() {
            println!("{} {} is valid", style("Success:").green().bold(), manifest_name);
        } else if errors.is_empty() {
            println!("{} {} is valid with {} warning(s)",
                style("Success:").green().bold(),
                manifest_name,
                warnings.len()
            );
        }
    }

    if !errors.is_empty() {
        return Ok(2);
    }

    if strict && !warnings.is_empty() {
        return Ok(1);
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_pm::DependencyFile;

    fn graph(manifest: &str, lock: &str) -> DependencyGraph {
        let files = vec![
            DependencyFile::new("lockstep.json", manifest),
            DependencyFile::new("lockstep.lock", lock),
        ];
        DependencyGraph::load(&files, &ForceUpdateConfig::default()).unwrap()
    }

    #[test]
    fn test_consistent_graph_has_no_warnings() {
        let graph = graph(
            r#"{"require": {"a": "^1.0"}}"#,
            r#"{"packages": [{"name": "a", "version": "1.2.0", "require": {"b": "*"}}, {"name": "b", "version": "0.1.0"}]}"#,
        );
        assert!(check_graph(&graph).is_empty());
    }

    #[test]
    fn test_reports_drift() {
        let graph = graph(
            r#"{"require": {"a": "^2.0", "c": "^1.0"}}"#,
            r#"{"packages": [{"name": "a", "version": "1.2.0", "require": {"b": "*"}}]}"#,
        );
        let warnings = check_graph(&graph);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("does not satisfy ^2.0"));
        assert!(warnings[1].contains("c is required but not locked"));
        assert!(warnings[2].contains("requires b * which is not locked"));
    }
}
