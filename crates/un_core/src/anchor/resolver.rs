//! Address → anchor record resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use url::Url;

use super::address::AnchorAddress;
use super::auth::{build_auth, AuthConfig};
use super::cache::AnchorCache;
use super::fetch::{Fetcher, HttpFetcher};
use super::AnchorRecord;
use crate::error::{AnchorError, AnchorResult};

/// Registry record metadata endpoint; the record id is appended.
pub const REGISTRY_API_BASE: &str = "https://zenodo.org/api/records";

/// Resolves anchor addresses through an explicit cache and fetcher.
///
/// Local addresses (`file:` and bare paths) are read in place. Remote
/// payloads, including registry metadata, go through the cache, so a second
/// resolution of the same address never touches the network.
pub struct AnchorResolver<F: Fetcher = HttpFetcher> {
    cache: AnchorCache,
    auth: Option<AuthConfig>,
    fetcher: F,
    registry_api: String,
}

impl AnchorResolver<HttpFetcher> {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_fetcher(cache_dir, HttpFetcher::default())
    }

    pub fn with_timeout(cache_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_fetcher(cache_dir, HttpFetcher::new(timeout))
    }
}

impl<F: Fetcher> AnchorResolver<F> {
    pub fn with_fetcher(cache_dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            cache: AnchorCache::new(cache_dir),
            auth: None,
            fetcher,
            registry_api: REGISTRY_API_BASE.to_string(),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_registry_api(mut self, base: impl Into<String>) -> Self {
        self.registry_api = base.into();
        self
    }

    pub fn cache(&self) -> &AnchorCache {
        &self.cache
    }

    pub fn resolve(&self, address: &str) -> AnchorResult<AnchorRecord> {
        let path = self.resolve_path(address)?;
        let anchor = read_anchor(&path)?;
        tracing::debug!(
            address,
            anchor_id = anchor.id(),
            value = anchor.value,
            u = anchor.u,
            "resolved anchor"
        );
        Ok(anchor)
    }

    /// Local path of the anchor JSON named by `address`, fetching it first
    /// when remote.
    pub fn resolve_path(&self, address: &str) -> AnchorResult<PathBuf> {
        match AnchorAddress::parse(address)? {
            AnchorAddress::File(path) => Ok(path),
            AnchorAddress::Http(url) => self.fetch_to_cache(&url),
            AnchorAddress::Registry { record_id, file } => self.resolve_registry(record_id, &file),
            AnchorAddress::Path(path) if path.exists() => Ok(path),
            AnchorAddress::Path(_) => {
                Err(AnchorError::Unsupported { address: address.trim().to_string() })
            }
        }
    }

    /// Download any remote resource into the cache and return its local path.
    ///
    /// Credentials for the configured domain are attached here; query-style
    /// credentials become part of the normalized URL and therefore of the
    /// cache key.
    pub fn fetch_to_cache(&self, url: &str) -> AnchorResult<PathBuf> {
        let mut parsed = Url::parse(url)
            .map_err(|source| AnchorError::InvalidUrl { url: url.to_string(), source })?;
        let parts = self
            .auth
            .as_ref()
            .map(|auth| build_auth(&parsed, auth))
            .unwrap_or_default();
        parts.apply_query(&mut parsed);

        let normalized = parsed.as_str();
        self.cache.get_or_fetch(normalized, || self.fetcher.fetch(normalized, &parts.headers))
    }

    fn resolve_registry(&self, record_id: u64, file: &str) -> AnchorResult<PathBuf> {
        let api = format!("{}/{}", self.registry_api.trim_end_matches('/'), record_id);
        let meta_path = self.fetch_to_cache(&api)?;
        let meta: Value = read_json(&meta_path)?;
        let file_url = registry_file_url(&api, &meta, record_id, file)?;
        tracing::debug!(record_id, file, %file_url, "located anchor in registry record");
        self.fetch_to_cache(&file_url)
    }
}

/// Download link of `desired` in a registry record's `files` list. Entries
/// match on their `key`, either the full name or its basename.
fn registry_file_url(
    api: &str,
    meta: &Value,
    record_id: u64,
    desired: &str,
) -> AnchorResult<String> {
    let unexpected = |reason: &str| AnchorError::UnexpectedRegistryResponse {
        url: api.to_string(),
        reason: reason.to_string(),
    };
    if !meta.is_object() {
        return Err(unexpected("metadata is not an object"));
    }
    let files = match meta.get("files") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(files)) => files.as_slice(),
        Some(_) => return Err(unexpected("'files' is not an array")),
    };

    let short = desired.rsplit('/').next().unwrap_or(desired);
    files
        .iter()
        .find(|entry| {
            let key = entry.get("key").and_then(Value::as_str);
            matches!(key, Some(key) if key == desired || key == short)
        })
        .and_then(|entry| entry.pointer("/links/self"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AnchorError::FileNotInRecord { file: desired.to_string(), record_id })
}

/// Read and parse an anchor JSON file.
pub fn read_anchor(path: &Path) -> AnchorResult<AnchorRecord> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AnchorResult<T> {
    let text = fs::read_to_string(path)
        .map_err(|source| AnchorError::Read { path: path.display().to_string(), source })?;
    serde_json::from_str(&text)
        .map_err(|source| AnchorError::Parse { path: path.display().to_string(), source })
}
