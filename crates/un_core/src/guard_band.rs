//! Guard-banded conformance decision rule.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::limits::SpecLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Conform,
    Nonconform,
    Indeterminate,
}

impl Decision {
    pub const ALL: [Decision; 3] =
        [Decision::Conform, Decision::Nonconform, Decision::Indeterminate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Conform => "conform",
            Decision::Nonconform => "nonconform",
            Decision::Indeterminate => "indeterminate",
        }
    }

    pub fn is_determinate(&self) -> bool {
        !matches!(self, Decision::Indeterminate)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a measurement against `[lsl, usl]` widened/narrowed by `gamma * u`.
///
/// Comparisons are non-strict on both sides: a value exactly on
/// `usl + gamma*u` is nonconforming, exactly on `usl - gamma*u` conforming.
/// NaN inputs fall through to indeterminate.
pub fn guard_band_decision(measured: f64, lsl: f64, usl: f64, u: f64, gamma: f64) -> Decision {
    let band = gamma * u;
    if measured <= lsl - band || measured >= usl + band {
        return Decision::Nonconform;
    }
    if measured >= lsl + band && measured <= usl - band {
        return Decision::Conform;
    }
    Decision::Indeterminate
}

/// Record-level variant: any missing input is indeterminate.
pub fn decide_record(
    measured: Option<f64>,
    limits: Option<SpecLimits>,
    u: Option<f64>,
    gamma: f64,
) -> Decision {
    match (measured, limits, u) {
        (Some(m), Some(l), Some(u)) => guard_band_decision(m, l.lsl, l.usl, u, gamma),
        _ => Decision::Indeterminate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_three_regions() {
        assert_eq!(guard_band_decision(10.0, 9.95, 10.05, 0.01, 1.0), Decision::Conform);
        assert_eq!(guard_band_decision(10.045, 9.95, 10.05, 0.01, 1.0), Decision::Indeterminate);
        assert_eq!(guard_band_decision(10.2, 9.95, 10.05, 0.01, 1.0), Decision::Nonconform);
        assert_eq!(guard_band_decision(9.9, 9.95, 10.05, 0.01, 1.0), Decision::Nonconform);
    }

    #[test]
    fn test_boundary_ties() {
        // exactly on the outer guard band: nonconform
        assert_eq!(guard_band_decision(12.0, 8.0, 11.0, 0.5, 2.0), Decision::Nonconform);
        assert_eq!(guard_band_decision(7.0, 8.0, 11.0, 0.5, 2.0), Decision::Nonconform);
        // exactly on the inner guard band: conform
        assert_eq!(guard_band_decision(10.0, 8.0, 11.0, 0.5, 2.0), Decision::Conform);
        assert_eq!(guard_band_decision(9.0, 8.0, 11.0, 0.5, 2.0), Decision::Conform);
    }

    #[test]
    fn test_zero_gamma_is_plain_limits() {
        assert_eq!(guard_band_decision(10.05, 9.95, 10.05, 0.5, 0.0), Decision::Nonconform);
        assert_eq!(guard_band_decision(10.0, 9.95, 10.05, 0.5, 0.0), Decision::Conform);
    }

    #[test]
    fn test_missing_inputs_are_indeterminate() {
        assert_eq!(decide_record(None, None, Some(0.1), 1.0), Decision::Indeterminate);
        assert_eq!(guard_band_decision(f64::NAN, 0.0, 1.0, 0.1, 1.0), Decision::Indeterminate);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Decision::Nonconform).unwrap(), "\"nonconform\"");
    }

    proptest! {
        #[test]
        fn prop_decision_matches_exactly_one_region(
            measured in -100.0f64..100.0,
            lsl in -50.0f64..50.0,
            width in 0.0f64..50.0,
            u in 0.0f64..10.0,
            gamma in 0.0f64..3.0,
        ) {
            let usl = lsl + width;
            let band = gamma * u;
            let non = measured <= lsl - band || measured >= usl + band;
            let conf = measured >= lsl + band && measured <= usl - band;
            let d = guard_band_decision(measured, lsl, usl, u, gamma);
            match d {
                Decision::Nonconform => prop_assert!(non),
                Decision::Conform => prop_assert!(conf && !non),
                Decision::Indeterminate => prop_assert!(!non && !conf),
            }
        }
    }
}
