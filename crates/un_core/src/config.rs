//! Run configuration: column mapping plus test parameters.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::columns::ColumnMap;
use crate::error::{ConfigError, ValidationError};
use crate::table::parse_instant;

fn default_coverage_k() -> f64 {
    2.0
}

fn default_gamma() -> f64 {
    1.0
}

fn default_edge_delta() -> f64 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Coverage factor turning `sigma` into an expanded uncertainty.
    #[serde(default = "default_coverage_k")]
    pub coverage_k: f64,
    /// Guard-band multiplier.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Instant splitting the drift test into before/after.
    #[serde(default)]
    pub calibration_cut: Option<String>,
    /// Distance from a spec limit that counts as "near the edge".
    #[serde(default = "default_edge_delta")]
    pub edge_delta: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            coverage_k: default_coverage_k(),
            gamma: default_gamma(),
            calibration_cut: None,
            edge_delta: default_edge_delta(),
        }
    }
}

impl Params {
    /// Parsed calibration cut. Blank counts as unset.
    pub fn calibration_instant(&self) -> Result<Option<NaiveDateTime>, ValidationError> {
        match self.calibration_cut.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_instant(raw)
                .map(Some)
                .ok_or_else(|| ValidationError::InvalidCalibrationCut { value: raw.to_string() }),
        }
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub columns: ColumnMap,
    #[serde(default)]
    pub params: Params,
}

impl Config {
    /// Parse and validate a YAML document. An empty document is the default.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("coverage_k", self.params.coverage_k),
            ("gamma", self.params.gamma),
            ("edge_delta", self.params.edge_delta),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
columns:
  nominal: nominal
  tol_lower: tol_lower
  tol_upper: tol_upper
  measured: measured
  true_value: true_value
  uncertainty_U: uncertainty_U
  instrument_id: instrument_id
  part_id: part_id
  timestamp: null
  accepted: accepted
params:
  gamma: 1.5
  calibration_cut: "2024-03-01"
"#;

    #[test]
    fn test_yaml_with_defaults() {
        let cfg = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.columns.uncertainty_u.as_deref(), Some("uncertainty_U"));
        assert_eq!(cfg.columns.timestamp, None);
        assert_eq!(cfg.columns.sigma.as_deref(), Some("sigma"));
        assert_eq!(cfg.params.gamma, 1.5);
        assert_eq!(cfg.params.coverage_k, 2.0);
        assert_eq!(cfg.params.edge_delta, 0.1);
        assert!(cfg.params.calibration_instant().unwrap().is_some());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_yaml_str("{}").unwrap(), Config::default());
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_negative_gamma_rejected() {
        let err = Config::from_yaml_str("params:\n  gamma: -1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ValidationError::InvalidParameter { name: "gamma", .. })
        ));
    }

    #[test]
    fn test_bad_calibration_cut() {
        let params = Params { calibration_cut: Some("soon".into()), ..Params::default() };
        assert!(params.calibration_instant().is_err());
        let params = Params { calibration_cut: Some("  ".into()), ..Params::default() };
        assert_eq!(params.calibration_instant().unwrap(), None);
    }
}
