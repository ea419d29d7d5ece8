//! Anchor address parsing.

use std::path::PathBuf;

use crate::error::{AnchorError, AnchorResult};

/// Anchor file looked up in a registry record when the address names none.
pub const DEFAULT_ANCHOR_FILE: &str = "uha_anchor.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorAddress {
    /// `file:<path>`
    File(PathBuf),
    /// `http://` or `https://` URL.
    Http(String),
    /// `doi:` / `zenodo:` address with a `zenodo.<digits>` segment.
    Registry { record_id: u64, file: String },
    /// Anything else; must name an existing local file.
    Path(PathBuf),
}

impl AnchorAddress {
    pub fn parse(address: &str) -> AnchorResult<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AnchorError::EmptyAddress);
        }
        if let Some(path) = address.strip_prefix("file:") {
            return Ok(AnchorAddress::File(PathBuf::from(path)));
        }
        if address.starts_with("zenodo:") || address.starts_with("doi:") {
            return parse_registry(address);
        }
        if address.starts_with("http://") || address.starts_with("https://") {
            return Ok(AnchorAddress::Http(address.to_string()));
        }
        Ok(AnchorAddress::Path(PathBuf::from(address)))
    }
}

fn parse_registry(address: &str) -> AnchorResult<AnchorAddress> {
    let (base, query) = match address.split_once('?') {
        Some((base, query)) => (base, query),
        None => (address, ""),
    };

    let file = url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "file")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ANCHOR_FILE.to_string());

    let Some((_, tail)) = base.rsplit_once("zenodo.") else {
        return Err(AnchorError::MissingRegistryId { address: address.to_string() });
    };
    let record = tail.rsplit('/').next().unwrap_or(tail);
    if record.is_empty() || !record.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AnchorError::InvalidRegistryId { address: address.to_string() });
    }
    let record_id = record
        .parse::<u64>()
        .map_err(|_| AnchorError::InvalidRegistryId { address: address.to_string() })?;

    Ok(AnchorAddress::Registry { record_id, file })
}
