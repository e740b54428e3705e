//! Isolation for resolution attempts.
//!
//! Every attempt runs inside an [`ExecutionContext`]: the dependency files are
//! staged into a fresh [`Workspace`], the attempt runs behind a panic
//! boundary, and the workspace is torn down before `run` returns.

use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::Isolation;
use crate::dependency::DependencyFile;

/// A failure of the environment around an attempt, as opposed to a
/// resolution outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{class} with message: {message}")]
pub struct EnvironmentFailure {
    /// Short failure category, e.g. `Panic` or `Io`
    pub class: String,
    pub message: String,
}

impl EnvironmentFailure {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// The staged dependency files of one attempt.
#[derive(Debug)]
pub struct Workspace {
    root: Option<PathBuf>,
    files: IndexMap<String, String>,
}

impl Workspace {
    fn on_disk(root: PathBuf) -> Self {
        Self {
            root: Some(root),
            files: IndexMap::new(),
        }
    }

    fn in_memory(files: &[DependencyFile]) -> Self {
        Self {
            root: None,
            files: files
                .iter()
                .map(|f| (f.name.clone(), f.content.clone()))
                .collect(),
        }
    }

    /// Directory holding the files, if they live on disk
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn read_file(&self, name: &str) -> io::Result<String> {
        match self.root {
            Some(ref root) => fs::read_to_string(root.join(name)),
            None => self.files.get(name).cloned().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{} is not staged", name))
            }),
        }
    }
}

/// Runs one attempt in isolation.
pub trait ExecutionContext {
    /// Stage `files`, call `f` with the workspace, then tear it down.
    ///
    /// A panic inside `f` and any staging error come back as an
    /// [`EnvironmentFailure`].
    fn run<T, F>(&self, files: &[DependencyFile], f: F) -> Result<T, EnvironmentFailure>
    where
        F: FnOnce(&Workspace) -> T;
}

/// Stages the files in a fresh temporary directory per attempt.
#[derive(Debug, Clone, Default)]
pub struct TempDirContext;

impl TempDirContext {
    pub fn new() -> Self {
        TempDirContext
    }
}

impl ExecutionContext for TempDirContext {
    fn run<T, F>(&self, files: &[DependencyFile], f: F) -> Result<T, EnvironmentFailure>
    where
        F: FnOnce(&Workspace) -> T,
    {
        let dir = tempfile::Builder::new()
            .prefix("lockstep-")
            .tempdir()
            .map_err(|e| EnvironmentFailure::new("Io", format!("Failed to create temporary directory: {}", e)))?;

        for file in files {
            let path = dir.path().join(checked_path(&file.name)?);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| EnvironmentFailure::new("Io", format!("Failed to create {}: {}", parent.display(), e)))?;
            }
            fs::write(&path, &file.content)
                .map_err(|e| EnvironmentFailure::new("Io", format!("Failed to write {}: {}", file.name, e)))?;
        }
        log::trace!("Staged {} file(s) in {}", files.len(), dir.path().display());

        let workspace = Workspace::on_disk(dir.path().to_path_buf());
        let result = guarded(|| f(&workspace));

        if let Err(e) = dir.close() {
            log::warn!("Failed to remove temporary directory: {}", e);
        }
        result
    }
}

/// Serves the files from memory.
#[derive(Debug, Clone, Default)]
pub struct InProcessContext;

impl InProcessContext {
    pub fn new() -> Self {
        InProcessContext
    }
}

impl ExecutionContext for InProcessContext {
    fn run<T, F>(&self, files: &[DependencyFile], f: F) -> Result<T, EnvironmentFailure>
    where
        F: FnOnce(&Workspace) -> T,
    {
        for file in files {
            checked_path(&file.name)?;
        }
        let workspace = Workspace::in_memory(files);
        guarded(|| f(&workspace))
    }
}

/// The context selected by [`Isolation`].
#[derive(Debug, Clone)]
pub enum Sandbox {
    TempDir(TempDirContext),
    InProcess(InProcessContext),
}

impl From<Isolation> for Sandbox {
    fn from(isolation: Isolation) -> Self {
        match isolation {
            Isolation::TempDir => Sandbox::TempDir(TempDirContext::new()),
            Isolation::InProcess => Sandbox::InProcess(InProcessContext::new()),
        }
    }
}

impl ExecutionContext for Sandbox {
    fn run<T, F>(&self, files: &[DependencyFile], f: F) -> Result<T, EnvironmentFailure>
    where
        F: FnOnce(&Workspace) -> T,
    {
        match self {
            Sandbox::TempDir(ctx) => ctx.run(files, f),
            Sandbox::InProcess(ctx) => ctx.run(files, f),
        }
    }
}

/// Relative path without `..`; anything else could escape the workspace.
fn checked_path(name: &str) -> Result<&Path, EnvironmentFailure> {
    let path = Path::new(name);
    let valid = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(path)
    } else {
        Err(EnvironmentFailure::new(
            "InvalidPath",
            format!("{} is not a relative path inside the project", name),
        ))
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, EnvironmentFailure> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| EnvironmentFailure::new("Panic", panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
