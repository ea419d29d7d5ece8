//! Anchor records and their resolution
//!
//! An anchor is a trusted reference value with an uncertainty and a table of
//! additive inter-frame corrections. Anchors are addressed by `file:` paths,
//! bare local paths, `http(s)` URLs, or `doi:`/`zenodo:` registry records,
//! and remote payloads are cached under a content-addressed file name.

pub mod address;
pub mod auth;
pub mod cache;
pub mod fetch;
pub mod resolver;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

pub use address::{AnchorAddress, DEFAULT_ANCHOR_FILE};
pub use auth::{build_auth, AuthConfig, AuthParts, AuthStyle};
pub use cache::AnchorCache;
pub use fetch::{Fetcher, HttpFetcher};
pub use resolver::{read_anchor, AnchorResolver, REGISTRY_API_BASE};

/// Frame key whose correction applies to unlisted frames.
pub const DEFAULT_FRAME_KEY: &str = "default";

/// Identifier reported when an anchor carries none.
pub const FALLBACK_ANCHOR_ID: &str = "UHA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    #[serde(default)]
    pub anchor_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub frame: Option<String>,
    pub value: f64,
    pub u: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub t_interframe: BTreeMap<String, f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, f64>>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnchorRecord {
    pub fn id(&self) -> &str {
        self.anchor_id.as_deref().unwrap_or(FALLBACK_ANCHOR_ID)
    }

    /// Correction for unlisted frames; zero when no `default` entry exists.
    pub fn default_correction(&self) -> f64 {
        self.t_interframe.get(DEFAULT_FRAME_KEY).copied().unwrap_or(0.0)
    }

    pub fn correction_for(&self, frame: &str) -> f64 {
        self.t_interframe
            .get(frame)
            .copied()
            .unwrap_or_else(|| self.default_correction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_schema() {
        let anchor: AnchorRecord = serde_json::from_str(
            r#"{"anchor_id":"A1","quantity":"H0","units":"km/s/Mpc","frame":"CMB",
                "value":70.0,"u":1.0,"t_interframe":{"default":0.0,"frameA":0.5}}"#,
        )
        .unwrap();
        assert_eq!(anchor.id(), "A1");
        assert_eq!(anchor.correction_for("frameA"), 0.5);
        assert_eq!(anchor.correction_for("elsewhere"), 0.0);
    }

    #[test]
    fn test_minimal_schema() {
        let anchor: AnchorRecord =
            serde_json::from_str(r#"{"value":67.4,"u":0.5,"t_interframe":null}"#).unwrap();
        assert_eq!(anchor.id(), FALLBACK_ANCHOR_ID);
        assert!(anchor.t_interframe.is_empty());
        assert_eq!(anchor.correction_for("x"), 0.0);
    }

    #[test]
    fn test_default_correction_applies_to_unknown_frames() {
        let anchor: AnchorRecord =
            serde_json::from_str(r#"{"value":70,"u":1,"t_interframe":{"default":0.3}}"#).unwrap();
        assert_eq!(anchor.correction_for(""), 0.3);
    }
}
