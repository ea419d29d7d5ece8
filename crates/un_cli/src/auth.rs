//! Credential settings gathered from flags or the environment.

use un_core::anchor::auth::{DEFAULT_HEADER_NAME, DEFAULT_QUERY_NAME};
use un_core::{AuthConfig, AuthStyle};

pub const DEFAULT_API_DOMAIN: &str = "aybllc.org";

/// Raw credential settings, mirroring the `AYBLLC_API_*` variables.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub domain: String,
    pub key: Option<String>,
    pub style: String,
    pub header_name: String,
    pub query_name: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            domain: DEFAULT_API_DOMAIN.to_string(),
            key: None,
            style: "bearer".to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            query_name: DEFAULT_QUERY_NAME.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("domain", &self.domain)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("style", &self.style)
            .finish()
    }
}

impl AuthSettings {
    /// Credentials to inject, or `None` when no key is configured.
    pub fn to_config(&self) -> Option<AuthConfig> {
        let key = self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(AuthConfig {
            domain: self.domain.clone(),
            key: key.to_string(),
            style: AuthStyle::parse(&self.style, &self.header_name, &self.query_name),
        })
    }
}
