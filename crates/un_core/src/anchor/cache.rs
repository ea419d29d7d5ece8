//! Content-addressed on-disk cache for remote payloads.
//!
//! File name: first 16 hex digits of SHA-256 over the normalized request URL,
//! then `_` and the URL's basename. Writes go to a temp file and are renamed
//! into place; a per-key lock keeps concurrent resolvers of the same URL from
//! fetching twice. Lock entries live only while a fetch of that key is in
//! flight.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::error::{AnchorError, AnchorResult};

const FALLBACK_NAME: &str = "payload.bin";

#[derive(Debug)]
pub struct AnchorCache {
    dir: PathBuf,
    locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl AnchorCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), locks: Mutex::new(FxHashMap::default()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic cache file name for a normalized URL.
    pub fn key_for(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        let hex = format!("{:x}", digest);
        format!("{}_{}", &hex[..16], basename(url))
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(Self::key_for(url))
    }

    /// Cached path for `url`, if present.
    pub fn lookup(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        path.is_file().then_some(path)
    }

    /// Return the cached file for `url`, calling `fetch` and storing its
    /// payload only on a miss.
    pub fn get_or_fetch<F>(&self, url: &str, fetch: F) -> AnchorResult<PathBuf>
    where
        F: FnOnce() -> AnchorResult<Vec<u8>>,
    {
        let key = Self::key_for(url);
        let lock = self.lock_for(&key);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.fetch_locked(url, &key, fetch)
        };
        self.release(&key, lock);
        result
    }

    fn fetch_locked<F>(&self, url: &str, key: &str, fetch: F) -> AnchorResult<PathBuf>
    where
        F: FnOnce() -> AnchorResult<Vec<u8>>,
    {
        let path = self.dir.join(key);
        if path.is_file() {
            tracing::debug!(%url, path = %path.display(), "anchor cache hit");
            return Ok(path);
        }

        tracing::info!(%url, "fetching into anchor cache");
        let payload = fetch()?;
        self.store(&path, &payload)?;
        Ok(path)
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Drop the table entry once no other caller holds or waits on it.
    fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn pending_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn store(&self, path: &Path, payload: &[u8]) -> AnchorResult<()> {
        let cache_err = |source| AnchorError::Cache { path: path.display().to_string(), source };
        fs::create_dir_all(&self.dir).map_err(cache_err)?;

        // Atomic save: write to temp file, then rename
        let temp_path = path.with_extension(format!("{}.tmp", std::process::id()));
        {
            let mut file = File::create(&temp_path).map_err(cache_err)?;
            file.write_all(payload).map_err(cache_err)?;
            file.sync_all().map_err(cache_err)?;
        }
        fs::rename(&temp_path, path).map_err(cache_err)?;

        tracing::debug!(bytes = payload.len(), path = %path.display(), "stored anchor payload");
        Ok(())
    }
}

/// Last path segment of a URL, made file-name safe.
fn basename(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());
    let name = path.rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}
