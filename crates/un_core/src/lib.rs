//! # un_core - Metrology Conformance Battery and Anchor Checks
//!
//! Evaluates measured quantities against declared tolerances under
//! measurement uncertainty, and checks externally reported constants against
//! a trusted anchor value.
//!
//! ## Features
//! - Guard-band decision rule (conform / nonconform / indeterminate)
//! - Conformance battery UN-T1 .. UN-T6 over one table and configuration
//! - Anchor resolution from `file:`, paths, `http(s)` and `doi:`/`zenodo:`
//!   with a content-addressed cache and domain-scoped credentials
//! - CT1 anchor compatibility check
//! - Schema sniffing to pick the pipeline for a table

pub mod anchor;
pub mod battery;
pub mod columns;
pub mod config;
pub mod ct1;
pub mod dispatch;
pub mod error;
pub mod guard_band;
pub mod limits;
pub mod table;

pub use anchor::{AnchorAddress, AnchorRecord, AnchorResolver, AuthConfig, AuthStyle};
pub use battery::{run_all, RunOutput, TestOutcome, ValidationReport};
pub use columns::{ColumnMap, LogicalField};
pub use config::{Config, Params};
pub use ct1::{check_against_anchor, run_ct1, Ct1Outcome, Ct1Row, Ct1Summary, ReportedValue};
pub use dispatch::{sniff, DatasetKind};
pub use error::{AnchorError, ConfigError, Ct1Error, ValidationError};
pub use guard_band::{guard_band_decision, Decision};
pub use table::{ColumnRef, Table};
