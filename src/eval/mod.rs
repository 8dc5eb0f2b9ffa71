//! Slice-based fairness evaluation for recommender predictions.
//!
//! # Overview
//!
//! This module layers the fairness engine on top of the rank-metric
//! primitives in [`crate::metrics`]:
//!
//! - [`binning`] — deterministic bucket assignment for continuous counts
//!   (user activity, artist popularity).
//! - [`slicing`] — per-slice metric aggregation and the disparity scorer
//!   (FPED: mean absolute deviation of per-slice rates from the global
//!   rate).
//! - [`checks`] — the named check battery: IR metrics, four FPED slices,
//!   and the embedding-distance miss analysis.
//! - [`harness`] — explicit check registry, runner, and result collection.
//! - [`dataset`] — the immutable per-run dataset container.
//!
//! # Usage
//!
//! ```rust,ignore
//! use receval::eval::dataset::EvalDataset;
//! use receval::eval::harness::{EvalConfig, EvalHarness};
//!
//! let dataset = EvalDataset::from_path("dataset.json")?;
//! let harness = EvalHarness::with_builtin_checks(EvalConfig::default());
//! let results = harness.run_all(&dataset);
//! println!("{}", results.to_json()?);
//! ```
//!
//! # Data flow
//!
//! predictions + ground truth + catalog → metadata joined onto the
//! evaluation index → binning (for continuous attributes) → per-slice means
//! of the per-unit metric → disparity score. Every join is by key value,
//! never by row position, and every filter copies rather than mutates.

pub mod binning;
pub mod checks;
pub mod dataset;
pub mod harness;
pub mod slicing;

pub use binning::{Breakpoints, ACTIVITY_BINS, POPULARITY_BINS};
pub use checks::StatsResult;
pub use dataset::EvalDataset;
pub use harness::{
    CheckCategory, CheckOutcome, CheckRegistry, CheckValue, EvalConfig, EvalHarness, EvalResults,
    TOP_K_CHALLENGE,
};
pub use slicing::{disparity, slice_means, DisparityResult};
