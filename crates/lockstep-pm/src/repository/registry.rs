use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::{Credentials, Repository, RepositoryError};
use crate::package::Package;

/// Default timeout for registry requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(default)]
    packages: IndexMap<String, Vec<VersionMetadata>>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    version: String,
    #[serde(default)]
    require: IndexMap<String, String>,
}

/// JSON package registry over HTTP.
///
/// Versions of `vendor/name` are read from `{base}/p2/vendor/name.json`.
/// Nothing is cached, so every pool sees the registry as it is now.
pub struct RegistryRepository {
    base: Url,
    client: Client,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for RegistryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryRepository")
            .field("base", &self.base.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl RegistryRepository {
    pub fn new(base: &str, credentials: Option<Credentials>) -> Result<Self, RepositoryError> {
        let trimmed = base.trim_end_matches('/');
        let base = Url::parse(&format!("{}/", trimmed)).map_err(|source| {
            RepositoryError::InvalidUrl {
                url: base.to_string(),
                source,
            }
        })?;

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(format!("lockstep/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| RepositoryError::Transport {
                url: base.to_string(),
                source,
            })?;

        Ok(Self {
            base,
            client,
            credentials,
        })
    }

    /// Metadata URL for a package, each path segment percent-encoded
    pub fn metadata_url(&self, name: &str) -> String {
        let path: Vec<String> = name
            .to_lowercase()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}p2/{}.json", self.base, path.join("/"))
    }

    fn fetch(&self, name: &str) -> Result<Vec<Package>, RepositoryError> {
        let url = self.metadata_url(name);
        log::debug!("Fetching {}", url);

        let mut request = self.client.get(&url);
        if let Some(ref credentials) = self.credentials {
            request = request.bearer_auth(credentials.token());
        }

        let response = request.send().map_err(|source| RepositoryError::Transport {
            url: url.clone(),
            source,
        })?;

        if !check_status(&url, response.status())? {
            return Ok(Vec::new());
        }

        let body = response.text().map_err(|source| RepositoryError::Transport {
            url: url.clone(),
            source,
        })?;
        parse_metadata(&url, name, &body)
    }
}

impl Repository for RegistryRepository {
    fn name(&self) -> &str {
        self.base.as_str()
    }

    fn versions(&self, name: &str) -> Result<Vec<Package>, RepositoryError> {
        self.fetch(&name.to_lowercase())
    }
}

/// Ok(false) when the registry does not know the package.
fn check_status(url: &str, status: StatusCode) -> Result<bool, RepositoryError> {
    match status {
        s if s.is_success() => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RepositoryError::Unauthorized {
            url: url.to_string(),
        }),
        s => Err(RepositoryError::Http {
            url: url.to_string(),
            status: s.as_u16(),
        }),
    }
}

fn parse_metadata(url: &str, name: &str, body: &str) -> Result<Vec<Package>, RepositoryError> {
    let response: MetadataResponse =
        serde_json::from_str(body).map_err(|source| RepositoryError::Metadata {
            source_name: url.to_string(),
            source,
        })?;

    let versions = response
        .packages
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, versions)| versions)
        .unwrap_or_default();

    Ok(versions
        .into_iter()
        .map(|v| Package {
            name: name.to_string(),
            version: v.version,
            require: v.require,
        })
        .collect())
}
