//! Force-update scenario tests.

use std::cell::{Cell, RefCell};

use super::*;
use crate::repository::ArrayRepository;
use crate::resolver::{RepositoryResolver, Resolution};
use crate::solver::{Origin, Request};

/// Resolver that records every request before delegating.
struct Recording<R> {
    inner: R,
    requests: RefCell<Vec<Request>>,
}

impl<R: Resolver> Recording<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            requests: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    fn fingerprints(&self) -> Vec<String> {
        self.requests.borrow().iter().map(Request::fingerprint).collect()
    }
}

impl<R: Resolver> Resolver for Recording<R> {
    fn solve(&self, request: &Request) -> Resolution {
        self.requests.borrow_mut().push(request.clone());
        self.inner.solve(request)
    }
}

/// Context that counts runs and can refuse to stage.
struct MockContext {
    runs: Cell<usize>,
    failure: Option<EnvironmentFailure>,
}

impl ExecutionContext for MockContext {
    fn run<T, F>(&self, files: &[DependencyFile], f: F) -> Result<T, EnvironmentFailure>
    where
        F: FnOnce(&Workspace) -> T,
    {
        self.runs.set(self.runs.get() + 1);
        if let Some(ref failure) = self.failure {
            return Err(failure.clone());
        }
        InProcessContext::new().run(files, f)
    }
}

fn files(manifest: &str, lock: &str) -> Vec<DependencyFile> {
    vec![
        DependencyFile::new("lockstep.json", manifest),
        DependencyFile::new("lockstep.lock", lock),
    ]
}

fn resolver(packages: Vec<Package>) -> Recording<RepositoryResolver> {
    Recording::new(RepositoryResolver::default().with_repository(ArrayRepository::with_packages(packages)))
}

fn updater<R: Resolver>(resolver: R) -> ForceUpdater<R, InProcessContext> {
    ForceUpdater::new(resolver, InProcessContext::new(), ForceUpdateConfig::default())
}

// ============================================================================
// Scenario 1: a locked sibling blocks the target
// ============================================================================

const BLOCKED_MANIFEST: &str = r#"{"require": {"b": ">= 1.0, < 2.0", "c": "^1.0"}}"#;
const BLOCKED_LOCK: &str = r#"{"packages": [
    {"name": "b", "version": "1.5.0"},
    {"name": "c", "version": "1.0.0", "require": {"b": ">= 1.0"}}
]}"#;

fn blocked_packages() -> Vec<Package> {
    vec![
        Package::new("b", "1.5.0"),
        Package::new("b", "2.0.0"),
        Package::new("c", "1.0.0").with_require("b", ">= 1.0"),
        Package::new("c", "2.0.0").with_require("b", ">= 2.0"),
    ]
}

#[test]
fn test_unlocks_blocking_dependency() {
    let updater = updater(resolver(blocked_packages()));

    let update = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
        .expect("c should resolve once b is unlocked");

    assert_eq!(update.resolved_version, "2.0.0");
    assert_eq!(update.unlocked_packages, vec!["c", "b"]);
    assert_eq!(update.attempts, 2);
    assert_eq!(update.versions["b"], "2.0.0");
    assert_eq!(update.versions["c"], "2.0.0");
    assert_eq!(updater.resolver().calls(), 2);

    let requests = updater.resolver().requests.borrow();
    assert_eq!(requests[0].find("b", Origin::Lock).unwrap().constraint, "= 1.5.0");
    assert_eq!(requests[1].find("b", Origin::Floor).unwrap().constraint, ">= 1.5.0");
}

#[test]
fn test_direct_success_needs_one_attempt() {
    // The target's requirements are already satisfied by the lock.
    let mut packages = blocked_packages();
    packages.push(Package::new("c", "1.1.0").with_require("b", ">= 1.0"));
    let updater = updater(resolver(packages));

    let update = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "1.1.0")
        .unwrap();

    assert_eq!(update.attempts, 1);
    assert_eq!(update.unlocked_packages, vec!["c"]);
    assert_eq!(update.versions["b"], "1.5.0");
}

#[test]
fn test_update_renders_lock() {
    let updater = updater(resolver(blocked_packages()));
    let update = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "C", "v2.0.0")
        .unwrap();

    let lock = update.to_lock();
    assert_eq!(lock.find_package("c").unwrap().version, "2.0.0");
    assert_eq!(lock.find_package("c").unwrap().require["b"], ">= 2.0");
    assert_eq!(update.packages().len(), 2);
}

// ============================================================================
// Scenario 2: cycle
// ============================================================================

#[test]
fn test_cycle_is_not_resolvable() {
    let manifest = r#"{"require": {"d": "^8.0"}}"#;
    let lock = r#"{"packages": [
        {"name": "d", "version": "8.0.0", "require": {"e": "^8.0"}},
        {"name": "e", "version": "8.0.0"}
    ]}"#;
    let updater = updater(resolver(vec![
        Package::new("d", "8.0.0").with_require("e", "^8.0"),
        Package::new("d", "9.0.0").with_require("e", ">= 9.0"),
        Package::new("e", "8.0.0"),
        Package::new("e", "9.0.0").with_require("d", "< 9.0"),
    ]));

    let err = updater.run(&files(manifest, lock), "d", "9.0.0").unwrap_err();
    match err {
        ForceUpdateError::NotResolvable {
            ref name,
            ref unlocked,
            ref problems,
            ..
        } => {
            assert_eq!(name, "d");
            assert_eq!(unlocked.to_vec(), vec!["d", "e"]);
            assert!(problems.get("d").is_some());
        }
        ref other => panic!("expected not resolvable, got {:?}", other),
    }
    assert!(err.diagnostics().unwrap().contains("e 9.0.0 requires d < 9.0"));
    assert_eq!(updater.resolver().calls(), 2);
}

// ============================================================================
// Scenario 3: shared dependency at incompatible ranges
// ============================================================================

#[test]
fn test_unlocks_shared_dependency_and_sibling() {
    let manifest = r#"{"require": {"f": "^1.0", "g": "^1.0"}}"#;
    let lock = r#"{"packages": [
        {"name": "f", "version": "1.0.0", "require": {"h": "^1.0"}},
        {"name": "g", "version": "1.0.0", "require": {"h": "^1.0"}},
        {"name": "h", "version": "1.0.0"}
    ]}"#;
    let updater = updater(resolver(vec![
        Package::new("f", "1.0.0").with_require("h", "^1.0"),
        Package::new("f", "2.0.0").with_require("h", "^2.0"),
        Package::new("g", "1.0.0").with_require("h", "^1.0"),
        Package::new("g", "1.1.0").with_require("h", ">= 1.0"),
        Package::new("h", "1.0.0"),
        Package::new("h", "2.0.0"),
    ]));

    let update = updater.run(&files(manifest, lock), "f", "2.0.0").unwrap();

    assert_eq!(update.unlocked_packages, vec!["f", "h", "g"]);
    assert_eq!(update.versions["h"], "2.0.0");
    assert_eq!(update.versions["g"], "1.1.0");
    assert_eq!(update.attempts, 2);
}

#[test]
fn test_transitive_target() {
    // h is not in the manifest; forcing it still unlocks what pins it.
    let manifest = r#"{"require": {"f": "^1.0"}}"#;
    let lock = r#"{"packages": [
        {"name": "f", "version": "1.0.0", "require": {"h": "^1.0"}},
        {"name": "h", "version": "1.0.0"}
    ]}"#;
    let updater = updater(resolver(vec![
        Package::new("f", "1.0.0").with_require("h", "^1.0"),
        Package::new("f", "1.1.0").with_require("h", ">= 1.0"),
        Package::new("h", "1.0.0"),
        Package::new("h", "2.0.0"),
    ]));

    let update = updater.run(&files(manifest, lock), "h", "2.0.0").unwrap();
    assert_eq!(update.resolved_version, "2.0.0");
    assert_eq!(update.versions["f"], "1.1.0");
    assert!(update.unlocked_packages.contains(&"f".to_string()));
}

// ============================================================================
// Scenario 4 and other input errors
// ============================================================================

#[test]
fn test_bad_target_version_never_reaches_resolver() {
    let updater = updater(resolver(blocked_packages()));

    let err = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "not-a-version")
        .unwrap_err();
    assert!(matches!(err, ForceUpdateError::MalformedInput(_)));
    assert_eq!(updater.resolver().calls(), 0);
}

#[test]
fn test_missing_lock_is_malformed_input() {
    let updater = updater(resolver(blocked_packages()));
    let files = vec![DependencyFile::new("lockstep.json", BLOCKED_MANIFEST)];

    let err = updater.run(&files, "c", "2.0.0").unwrap_err();
    assert!(matches!(err, ForceUpdateError::MalformedInput(_)));
    assert!(err.to_string().contains("lockstep.lock"));
    assert_eq!(updater.resolver().calls(), 0);
}

#[test]
fn test_oversized_manifest_constraint_is_malformed_input() {
    let manifest = r#"{"require": {"b": "^18446744073709551615.0.0", "c": "^1.0"}}"#;
    let updater = updater(resolver(blocked_packages()));

    let err = updater.run(&files(manifest, BLOCKED_LOCK), "c", "2.0.0").unwrap_err();
    assert!(matches!(err, ForceUpdateError::MalformedInput(_)), "got {:?}", err);
    assert!(err.to_string().contains("version component too large"));
    assert_eq!(updater.resolver().calls(), 0);
}

#[test]
fn test_unknown_target_version_is_not_resolvable() {
    let updater = updater(resolver(blocked_packages()));

    let err = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "7.0.0")
        .unwrap_err();
    assert!(matches!(err, ForceUpdateError::NotResolvable { .. }));
}

// ============================================================================
// Fatal outcomes
// ============================================================================

struct Unreachable;

impl Resolver for Unreachable {
    fn solve(&self, _request: &Request) -> Resolution {
        Resolution::Fatal("Could not reach https://registry.example".to_string())
    }
}

#[test]
fn test_resolver_fatal_is_not_retried() {
    let updater = updater(Recording::new(Unreachable));

    let err = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
        .unwrap_err();
    assert!(matches!(err, ForceUpdateError::Resolver(ref m) if m.contains("registry.example")));
    assert_eq!(updater.resolver().calls(), 1);
}

#[test]
fn test_environment_failure_surfaces_unmodified() {
    let context = MockContext {
        runs: Cell::new(0),
        failure: Some(EnvironmentFailure::new("Errno::ENOSPC", "No space left on device")),
    };
    let updater = ForceUpdater::new(resolver(blocked_packages()), context, ForceUpdateConfig::default());

    let err = updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
        .unwrap_err();
    assert_eq!(err.to_string(), "Errno::ENOSPC with message: No space left on device");
    assert_eq!(updater.context.runs.get(), 1);
    assert_eq!(updater.resolver().calls(), 0);
}

#[test]
fn test_wrong_resolved_version_is_fatal() {
    struct Liar;

    impl Resolver for Liar {
        fn solve(&self, _request: &Request) -> Resolution {
            let mut pool = crate::solver::Pool::new();
            pool.add_package(Package::new("c", "1.0.0"));
            let mut request = Request::new();
            request.require("c", "*", Origin::Manifest);
            let policy = crate::solver::Policy::new();
            match crate::solver::Solver::new(&pool, &policy).solve(&request) {
                Ok(solution) => Resolution::Solved(solution),
                Err(e) => Resolution::Fatal(e.to_string()),
            }
        }
    }

    let err = updater(Liar)
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
        .unwrap_err();
    assert!(matches!(err, ForceUpdateError::Resolver(ref m) if m.contains("instead of 2.0.0")));
}

// ============================================================================
// Loop properties
// ============================================================================

#[test]
fn test_unlock_sets_grow_monotonically() {
    let updater = updater(resolver(blocked_packages()));
    updater
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
        .unwrap();

    let requests = updater.resolver().requests.borrow();
    let pinned: Vec<usize> = requests
        .iter()
        .map(|r| r.constraints().iter().filter(|c| c.origin == Origin::Lock).count())
        .collect();
    assert!(pinned.windows(2).all(|w| w[1] < w[0]), "pins must strictly shrink: {:?}", pinned);
}

/// Every required package is resolved and every resolved package matches
/// each requirement and constraint of the final request.
fn assert_satisfies_last_request(recording: &Recording<RepositoryResolver>, update: &ForceUpdate) {
    let parser = lockstep_semver::VersionParser::new();
    let requests = recording.requests.borrow();
    let last = requests.last().expect("at least one attempt");

    for requirement in last.requires() {
        let version = update
            .versions
            .get(&requirement.name)
            .unwrap_or_else(|| panic!("{} is required but not resolved", requirement.name));
        let constraint = parser.parse_constraints(&requirement.constraint).unwrap();
        assert!(constraint.matches(version), "{} {} violates {}", requirement.name, version, requirement.constraint);
    }

    for requirement in last.constraints() {
        if let Some(version) = update.versions.get(&requirement.name) {
            let constraint = parser.parse_constraints(&requirement.constraint).unwrap();
            assert!(constraint.matches(version), "{} {} violates {}", requirement.name, version, requirement.constraint);
        }
    }
}

#[test]
fn test_resolution_satisfies_final_request() {
    let blocked = updater(resolver(blocked_packages()));
    let update = blocked
        .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
        .unwrap();
    assert_satisfies_last_request(blocked.resolver(), &update);

    let manifest = r#"{"require": {"f": "^1.0", "g": "^1.0", "k": "^1.0"}}"#;
    let lock = r#"{"packages": [
        {"name": "f", "version": "1.0.0", "require": {"h": "^1.0"}},
        {"name": "g", "version": "1.0.0", "require": {"h": "^1.0"}},
        {"name": "h", "version": "1.0.0"},
        {"name": "k", "version": "1.0.0"}
    ]}"#;
    let shared = updater(resolver(vec![
        Package::new("f", "1.0.0").with_require("h", "^1.0"),
        Package::new("f", "2.0.0").with_require("h", "^2.0"),
        Package::new("g", "1.0.0").with_require("h", "^1.0"),
        Package::new("g", "1.1.0").with_require("h", ">= 1.0"),
        Package::new("h", "1.0.0"),
        Package::new("h", "2.0.0"),
        Package::new("k", "1.0.0"),
        Package::new("k", "1.5.0"),
    ]));
    let update = shared.run(&files(manifest, lock), "f", "2.0.0").unwrap();

    // k stays pinned while the rest moves.
    assert_eq!(update.versions["k"], "1.0.0");
    assert!(shared.resolver().requests.borrow().last().unwrap().find("k", Origin::Lock).is_some());
    assert_satisfies_last_request(shared.resolver(), &update);
}

#[test]
fn test_attempts_bounded_by_package_count() {
    // A chain where every step needs one more unlock.
    let manifest = r#"{"require": {"p1": "^1.0", "p2": "^1.0", "p3": "^1.0", "p4": "^1.0"}}"#;
    let lock = r#"{"packages": [
        {"name": "p1", "version": "1.0.0"},
        {"name": "p2", "version": "1.0.0"},
        {"name": "p3", "version": "1.0.0"},
        {"name": "p4", "version": "1.0.0"}
    ]}"#;
    let updater = updater(resolver(vec![
        Package::new("p1", "1.0.0"),
        Package::new("p1", "2.0.0").with_require("p2", ">= 2.0"),
        Package::new("p2", "1.0.0"),
        Package::new("p2", "2.0.0").with_require("p3", ">= 2.0"),
        Package::new("p3", "1.0.0"),
        Package::new("p3", "2.0.0").with_require("p4", ">= 2.0"),
        Package::new("p4", "1.0.0"),
        Package::new("p4", "2.0.0"),
    ]));

    let update = updater.run(&files(manifest, lock), "p1", "2.0.0").unwrap();
    assert!(update.attempts <= 4);
    assert_eq!(update.unlocked_packages.len(), 4);
    assert_eq!(update.versions["p4"], "2.0.0");
}

#[test]
fn test_runs_are_deterministic() {
    let run = || {
        let updater = updater(resolver(blocked_packages()));
        let update = updater
            .run(&files(BLOCKED_MANIFEST, BLOCKED_LOCK), "c", "2.0.0")
            .unwrap();
        (update.versions, updater.resolver().fingerprints())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_temp_dir_context_end_to_end() {
    let config = ForceUpdateConfig::default()
        .with_manifest_name("app/lockstep.json")
        .with_lock_name("app/lockstep.lock");
    let files = vec![
        DependencyFile::new("app/lockstep.json", BLOCKED_MANIFEST),
        DependencyFile::new("app/lockstep.lock", BLOCKED_LOCK),
    ];
    let updater = ForceUpdater::new(resolver(blocked_packages()), TempDirContext::new(), config);

    let update = updater.run(&files, "c", "2.0.0").unwrap();
    assert_eq!(update.unlocked_packages, vec!["c", "b"]);
}
