//! Sources of candidate package versions.

mod array;
mod registry;

use std::fmt;

use thiserror::Error;

use crate::package::Package;

pub use array::ArrayRepository;
pub use registry::RegistryRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Authentication required for {url}")]
    Unauthorized { url: String },

    #[error("Registry request to {url} failed with status {status}")]
    Http { url: String, status: u16 },

    #[error("Could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid metadata from {source_name}: {source}")]
    Metadata {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid registry URL \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A place to look up the available versions of a package.
pub trait Repository {
    /// Human-readable identifier, used in logs
    fn name(&self) -> &str;

    /// All versions of `name`. Unknown packages yield an empty list.
    fn versions(&self, name: &str) -> Result<Vec<Package>, RepositoryError>;
}

/// An opaque access token for registries.
///
/// The value is only ever handed to the HTTP layer and never shows up in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}
