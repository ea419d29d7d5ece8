//! Deterministic synthetic metrology table for demos and smoke tests.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use un_core::Table;

pub const DEFAULT_ROWS: usize = 120;
pub const DEFAULT_SEED: u64 = 42;

const NOMINAL: f64 = 10.0;
const TOL: f64 = 0.05;

pub const COLUMNS: [&str; 10] = [
    "part_id",
    "nominal",
    "tol_lower",
    "tol_upper",
    "measured",
    "true_value",
    "uncertainty_U",
    "instrument_id",
    "accepted",
    "timestamp",
];

/// Generate `rows` records. Same seed, same table.
///
/// Every tenth row shares its `part_id` with an earlier row, every third row
/// is measured on instrument `B`, and only every fifth row carries a
/// `true_value`.
pub fn generate(rows: usize, seed: u64) -> Result<Table> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let true_dist = Normal::new(NOMINAL, 0.01)?;
    let u_dist = Normal::<f64>::new(0.01, 0.002)?;
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let (lsl, usl) = (NOMINAL - TOL, NOMINAL + TOL);

    let mut table = Table::new(COLUMNS.iter().map(|c| c.to_string()).collect());
    for i in 0..rows {
        let true_value = true_dist.sample(&mut rng);
        let u: f64 = u_dist.sample(&mut rng).abs();
        let measured = Normal::new(true_value, u / 2.0)?.sample(&mut rng);

        let part_id = if i % 10 == 0 { i / 2 } else { i };
        let instrument = if i % 3 == 0 { "B" } else { "A" };
        let timestamp = start
            .checked_add_days(Days::new(i as u64))
            .context("timestamp out of range")?;
        let accepted = u8::from((lsl..=usl).contains(&measured));

        table.push_row(vec![
            part_id.to_string(),
            NOMINAL.to_string(),
            TOL.to_string(),
            TOL.to_string(),
            measured.to_string(),
            if i % 5 == 0 { true_value.to_string() } else { String::new() },
            u.to_string(),
            instrument.to_string(),
            accepted.to_string(),
            timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ]);
    }
    Ok(table)
}
