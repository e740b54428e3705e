use lockstep_pm::force_update::InProcessContext;
use lockstep_pm::repository::ArrayRepository;
use lockstep_pm::solver::Policy;
use lockstep_pm::{DependencyFile, ForceUpdateConfig, ForceUpdater, Package, RepositoryResolver};

fn main() {
    println!("=== Force Update Demo ===\n");

    // 1. The project: b is capped below 2.0, c is locked at 1.0.0
    let manifest = r#"{"require": {"acme/b": ">= 1.0, < 2.0", "acme/c": "^1.0"}}"#;
    let lock = r#"{"packages": [
        {"name": "acme/b", "version": "1.5.0"},
        {"name": "acme/c", "version": "1.0.0", "require": {"acme/b": ">= 1.0"}}
    ]}"#;
    println!("1. Manifest: {}", manifest);
    println!();

    // 2. What the registry offers
    println!("2. Available packages:");
    let packages = vec![
        Package::new("acme/b", "1.5.0"),
        Package::new("acme/b", "2.0.0"),
        Package::new("acme/c", "1.0.0").with_require("acme/b", ">= 1.0"),
        Package::new("acme/c", "2.0.0").with_require("acme/b", ">= 2.0"),
    ];
    for package in &packages {
        println!("   {}", package.pretty_string());
    }
    println!();

    // 3. Force c to 2.0.0; b has to move too
    println!("3. Forcing acme/c to 2.0.0:");
    let resolver = RepositoryResolver::new(Policy::new())
        .with_repository(ArrayRepository::with_packages(packages));
    let updater = ForceUpdater::new(resolver, InProcessContext::new(), ForceUpdateConfig::default());
    let files = vec![
        DependencyFile::new("lockstep.json", manifest),
        DependencyFile::new("lockstep.lock", lock),
    ];

    match updater.run(&files, "acme/c", "2.0.0") {
        Ok(update) => {
            println!("   Resolved after {} attempt(s)", update.attempts);
            println!("   Unlocked: {}", update.unlocked_packages.join(", "));
            for (name, version) in &update.versions {
                println!("   {} => {}", name, version);
            }
        }
        Err(e) => {
            println!("   Failed: {}", e);
            if let Some(diagnostics) = e.diagnostics() {
                println!("{}", diagnostics);
            }
        }
    }
}
