use thiserror::Error;

/// Errors raised by the conformance battery.
///
/// These are fatal to a single computation only: `run_all` records them under
/// the affected test's key and keeps evaluating the others.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("no uncertainty source: configure an 'uncertainty_U' column or provide a '{sigma}' column with coverage_k")]
    NoUncertaintySource { sigma: String },

    #[error("invalid calibration_cut '{value}': not a recognised instant")]
    InvalidCalibrationCut { value: String },

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Errors raised while loading a configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Errors raised while resolving an anchor address.
#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("empty anchor address")]
    EmptyAddress,

    #[error("unsupported anchor address or path not found: {address}")]
    Unsupported { address: String },

    #[error("address must contain 'zenodo.<record_id>' for zenodo/doi schemes: {address}")]
    MissingRegistryId { address: String },

    #[error("could not parse registry record id from: {address}")]
    InvalidRegistryId { address: String },

    #[error("unexpected registry response from {url}: {reason}")]
    UnexpectedRegistryResponse { url: String, reason: String },

    #[error("file '{file}' not found in registry record {record_id}")]
    FileNotInRecord { file: String, record_id: u64 },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("payload from {url} exceeds {limit} bytes")]
    PayloadTooLarge { url: String, limit: u64 },

    #[error("cache I/O error at {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read anchor file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid anchor JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AnchorError {
    /// True for network failures, as opposed to address-resolution failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, AnchorError::HttpStatus { .. } | AnchorError::Transport { .. })
    }
}

pub type AnchorResult<T> = std::result::Result<T, AnchorError>;

/// Errors raised by the CT1 anchor conformance check.
#[derive(Error, Debug)]
pub enum Ct1Error {
    #[error("reported-values table is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Anchor(#[from] AnchorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let transport = AnchorError::Transport {
            url: "https://example.org/a.json".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(transport.is_transport());
        assert!(AnchorError::HttpStatus { url: "u".to_string(), status: 404 }.is_transport());
        assert!(!AnchorError::EmptyAddress.is_transport());
        assert!(!AnchorError::FileNotInRecord { file: "a.json".to_string(), record_id: 1 }
            .is_transport());
    }

    #[test]
    fn test_messages_carry_context() {
        let err =
            AnchorError::FileNotInRecord { file: "anchor.json".to_string(), record_id: 123456 };
        assert!(err.to_string().contains("anchor.json"));
        assert!(err.to_string().contains("123456"));

        let err = ValidationError::NoUncertaintySource { sigma: "sigma".to_string() };
        assert!(err.to_string().contains("uncertainty_U"));
    }
}
