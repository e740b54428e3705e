//! Force-update command - move one package to an exact version.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use lockstep_pm::repository::{ArrayRepository, Credentials, RegistryRepository};
use lockstep_pm::solver::Policy;
use lockstep_pm::{
    DependencyFile, DependencyGraph, ForceUpdate, ForceUpdateConfig, ForceUpdateError,
    ForceUpdater, Isolation, RepositoryResolver,
};
use lockstep_pm::force_update::Sandbox;

#[derive(Args, Debug)]
pub struct ForceUpdateArgs {
    /// Package to update
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Exact version to move it to
    #[arg(value_name = "VERSION")]
    pub version: String,

    /// Working directory
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Registry base URL, in addition to those in the manifest (repeatable)
    #[arg(long = "registry", value_name = "URL")]
    pub registries: Vec<String>,

    /// JSON file with an array of available packages
    #[arg(long, value_name = "FILE")]
    pub repository_file: Option<PathBuf>,

    /// Access token sent to registries
    #[arg(long, env = "LOCKSTEP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Manifest file name
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<String>,

    /// Lock file name
    #[arg(long, value_name = "FILE")]
    pub lock: Option<String>,

    /// Where attempts run: tempdir or inprocess
    #[arg(long)]
    pub isolation: Option<Isolation>,

    /// Try the lowest matching versions first
    #[arg(long)]
    pub prefer_lowest: bool,

    /// Write the new resolution to the lock file
    #[arg(long)]
    pub write_lock: bool,

    /// Output as JSON
    #[arg(long = "json")]
    pub format_json: bool,
}

pub fn execute(args: ForceUpdateArgs) -> Result<i32> {
    let working_dir = args.working_dir.canonicalize()
        .context("Failed to resolve working directory")?;

    let mut config = ForceUpdateConfig::from_env();
    if let Some(ref name) = args.manifest {
        config = config.with_manifest_name(name.clone());
    }
    if let Some(ref name) = args.lock {
        config = config.with_lock_name(name.clone());
    }
    if let Some(isolation) = args.isolation {
        config = config.with_isolation(isolation);
    }
    if args.prefer_lowest {
        config = config.with_prefer_lowest(true);
    }

    let files = read_dependency_files(&working_dir, &config)?;
    let resolver = build_resolver(&args, &files, &config)?;
    let lock_name = config.lock_name.clone();
    let sandbox = Sandbox::from(config.isolation);
    let updater = ForceUpdater::new(resolver, sandbox, config);

    match updater.run(&files, &args.package, &args.version) {
        Ok(update) => {
            if args.write_lock {
                let lock_path = working_dir.join(&lock_name);
                let json = update.to_lock().to_json(&lock_name)?;
                std::fs::write(&lock_path, json)
                    .with_context(|| format!("Failed to write {}", lock_path.display()))?;
            }

            if args.format_json {
                println!("{}", serde_json::to_string_pretty(&update)?);
            } else {
                print_update(&update, args.write_lock.then_some(lock_name.as_str()));
            }
            Ok(0)
        }
        Err(e) => {
            let code = exit_code(&e);
            if args.format_json {
                println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
            } else {
                eprintln!("{} {}", style("Error:").red().bold(), e);
                if let Some(diagnostics) = e.diagnostics() {
                    eprintln!();
                    eprintln!("{}", diagnostics);
                }
            }
            Ok(code)
        }
    }
}

/// Read the manifest and lock from `working_dir`. Missing files are left
/// out so the updater can report them.
pub fn read_dependency_files(working_dir: &Path, config: &ForceUpdateConfig) -> Result<Vec<DependencyFile>> {
    let mut files = Vec::new();
    for name in [&config.manifest_name, &config.lock_name] {
        let path = working_dir.join(name);
        if !path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(DependencyFile::new(name.as_str(), content));
    }
    Ok(files)
}

fn build_resolver(
    args: &ForceUpdateArgs,
    files: &[DependencyFile],
    config: &ForceUpdateConfig,
) -> Result<RepositoryResolver> {
    let policy = Policy::new().prefer_lowest(config.prefer_lowest);
    let mut resolver = RepositoryResolver::new(policy);

    if let Some(ref path) = args.repository_file {
        let repository = ArrayRepository::from_file(path)?;
        log::info!("Loaded {} package(s) from {}", repository.len(), path.display());
        resolver.add_repository(Box::new(repository));
    }

    // An unparsable manifest is reported by the updater itself.
    let declared = DependencyGraph::load(files, config)
        .map(|graph| graph.repositories().to_vec())
        .unwrap_or_default();

    let credentials = args.token.clone().map(Credentials::new);
    for url in args.registries.iter().chain(declared.iter()) {
        resolver.add_repository(Box::new(RegistryRepository::new(url, credentials.clone())?));
    }

    if resolver.repository_count() == 0 {
        log::warn!("No repositories configured, only locked versions are available");
    }

    Ok(resolver)
}

fn print_update(update: &ForceUpdate, written_lock: Option<&str>) {
    println!(
        "{} {} updated to {}",
        style("Success:").green().bold(),
        style(&update.name).cyan(),
        style(&update.resolved_version).yellow()
    );

    if update.unlocked_packages.len() > 1 {
        println!("Also unlocked:");
        for name in update.unlocked_packages.iter().skip(1) {
            let version = update.versions.get(name).map(String::as_str).unwrap_or("(removed)");
            println!("  - {} {}", style(name).cyan(), version);
        }
    }

    if let Some(lock) = written_lock {
        println!("Wrote {}", lock);
    }
}

fn exit_code(error: &ForceUpdateError) -> i32 {
    match error {
        ForceUpdateError::NotResolvable { .. } => 1,
        ForceUpdateError::MalformedInput(_) => 2,
        ForceUpdateError::Environment(_) | ForceUpdateError::Resolver(_) => 3,
    }
}

fn error_json(error: &ForceUpdateError) -> serde_json::Value {
    let kind = match error {
        ForceUpdateError::NotResolvable { .. } => "not_resolvable",
        ForceUpdateError::Environment(_) => "environment",
        ForceUpdateError::MalformedInput(_) => "malformed_input",
        ForceUpdateError::Resolver(_) => "resolver",
    };

    let mut value = serde_json::json!({
        "error": kind,
        "message": error.to_string(),
    });
    if let ForceUpdateError::NotResolvable { unlocked, problems, .. } = error {
        value["unlocked_packages"] = serde_json::json!(unlocked);
        value["problems"] = serde_json::json!(problems);
    }
    value
}
