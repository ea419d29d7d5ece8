//! UN-T3 cross-instrument consistency.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::columns::LogicalField;
use crate::config::Config;
use crate::error::ValidationError;
use crate::limits::compute_uncertainty_u;
use crate::table::Table;

use super::rate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossInstrument {
    pub n_pairs: usize,
    pub exceed_rate: Option<f64>,
}

impl CrossInstrument {
    fn empty() -> Self {
        Self { n_pairs: 0, exceed_rate: None }
    }
}

/// Group rows by `part_id` and return the groups measured by at least two
/// distinct instruments. Rows without a part id belong to no group.
fn multi_instrument_groups<'t>(
    parts: &[Option<&'t str>],
    instruments: &[Option<&'t str>],
) -> Vec<Vec<usize>> {
    let mut groups: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for (row, part) in parts.iter().enumerate() {
        if let Some(part) = part {
            groups.entry(*part).or_default().push(row);
        }
    }

    let mut out: Vec<Vec<usize>> = groups
        .into_values()
        .filter(|rows| {
            let distinct: FxHashSet<&str> = rows.iter().filter_map(|&r| instruments[r]).collect();
            distinct.len() >= 2
        })
        .collect();
    out.sort_unstable_by_key(|rows| rows[0]);
    out
}

/// UN-T3: within each multi-instrument part group, the share of record pairs
/// whose difference exceeds `U_i + U_j`.
///
/// Every unordered pair in a qualifying group counts, including two readings
/// from the same instrument. Pairs never span groups.
pub fn cross_instrument(
    table: &Table,
    config: &Config,
) -> Result<CrossInstrument, ValidationError> {
    let cols = &config.columns;
    let instrument_col = cols.resolve(table, LogicalField::InstrumentId);
    if !instrument_col.is_present() {
        return Ok(CrossInstrument::empty());
    }

    let parts = cols.text(table, LogicalField::PartId);
    let instruments = table.text(instrument_col);
    let groups = multi_instrument_groups(&parts, &instruments);
    if groups.is_empty() {
        return Ok(CrossInstrument::empty());
    }

    let u = compute_uncertainty_u(table, config)?;
    let measured = cols.numeric(table, LogicalField::Measured);
    let mut n_pairs = 0;
    let mut exceeded = 0;
    for rows in groups {
        for (a, &i) in rows.iter().enumerate() {
            for &j in &rows[a + 1..] {
                n_pairs += 1;
                if let (Some(mi), Some(mj), Some(ui), Some(uj)) =
                    (measured[i], measured[j], u[i], u[j])
                {
                    if (mi - mj).abs() > ui + uj {
                        exceeded += 1;
                    }
                }
            }
        }
    }

    tracing::debug!(n_pairs, exceeded, "UN-T3 cross-instrument consistency");
    Ok(CrossInstrument { n_pairs, exceed_rate: rate(exceeded, n_pairs) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::test_support::{config, table};
    use proptest::prelude::*;

    #[test]
    fn test_pairs_within_multi_instrument_groups_only() {
        let t = table(
            &["part_id", "measured", "uncertainty_U", "instrument_id"],
            &[
                &["1", "10.00", "0.01", "A"],
                &["1", "10.05", "0.01", "B"],
                &["1", "10.00", "0.01", "A"],
                &["2", "10.00", "0.01", "A"],
                &["2", "11.00", "0.01", "A"],
                &["3", "10.00", "0.01", "B"],
            ],
        );
        let res = cross_instrument(&t, &config()).unwrap();
        // part 1 has 3 rows and 2 instruments: 3 pairs; parts 2/3 have one instrument
        assert_eq!(res.n_pairs, 3);
        assert!((res.exceed_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_instrument_column() {
        let t = table(&["part_id", "measured"], &[&["1", "1"], &["1", "2"]]);
        assert_eq!(cross_instrument(&t, &config()).unwrap(), CrossInstrument::empty());
    }

    #[test]
    fn test_no_multi_instrument_group() {
        let t = table(
            &["part_id", "measured", "uncertainty_U", "instrument_id"],
            &[&["1", "1", "0.1", "A"], &["2", "1", "0.1", "B"], &["", "1", "0.1", "C"]],
        );
        assert_eq!(cross_instrument(&t, &config()).unwrap(), CrossInstrument::empty());
    }

    #[test]
    fn test_uncertainty_only_needed_when_pairs_exist() {
        let headers = ["part_id", "measured", "instrument_id"];
        let single = table(&headers, &[&["1", "1", "A"], &["1", "2", "A"]]);
        assert_eq!(cross_instrument(&single, &config()).unwrap(), CrossInstrument::empty());

        let paired = table(&headers, &[&["1", "1", "A"], &["1", "2", "B"]]);
        assert!(matches!(
            cross_instrument(&paired, &config()),
            Err(ValidationError::NoUncertaintySource { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_pair_count_matches_group_sizes(
            assignments in proptest::collection::vec((0u8..5, 0u8..3), 0..30)
        ) {
            let rows: Vec<Vec<String>> = assignments
                .iter()
                .map(|(p, i)| vec![p.to_string(), "1.0".into(), "0.1".into(), format!("I{i}")])
                .collect();
            let headers = ["part_id", "measured", "uncertainty_U", "instrument_id"];
            let t = Table::from_rows(headers.iter().map(|s| s.to_string()).collect(), rows);

            let mut expected = 0;
            for part in 0u8..5 {
                let members: Vec<u8> = assignments
                    .iter()
                    .filter(|(p, _)| *p == part)
                    .map(|(_, i)| *i)
                    .collect();
                let distinct: FxHashSet<u8> = members.iter().copied().collect();
                if distinct.len() >= 2 {
                    expected += members.len() * (members.len() - 1) / 2;
                }
            }

            let res = cross_instrument(&t, &config()).unwrap();
            prop_assert_eq!(res.n_pairs, expected);
            prop_assert_eq!(res.exceed_rate.is_none(), expected == 0);
        }
    }
}
