//! Slice aggregation and disparity scoring.
//!
//! The aggregator groups an already-computed per-unit metric by slice label
//! and reports the arithmetic mean per observed slice. The disparity scorer
//! then folds those per-slice means and the global value into a single
//! number: the mean absolute deviation of slices from the global value
//! (false-positive equality difference, FPED, when fed false-positive
//! rates).
//!
//! Grouping only emits observed slice values — a group with zero members is
//! never produced — and iteration order of the result map is not
//! semantically significant.
//!
//! An empty slice set makes disparity mathematically undefined. The
//! reference behavior would propagate NaN; this implementation fails with an
//! explicit no-data error instead so degenerate filters cannot leak NaN into
//! a fairness report unnoticed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Group a per-unit metric by slice label and compute per-slice means.
///
/// `values` and `labels` must be aligned to the same evaluation-unit
/// sequence; a length mismatch is an alignment error.
pub fn slice_means(values: &[f64], labels: &[String]) -> Result<HashMap<String, f64>> {
    if values.len() != labels.len() {
        return Err(Error::misaligned(format!(
            "{} metric values but {} slice labels",
            values.len(),
            labels.len()
        )));
    }

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for (value, label) in values.iter().zip(labels.iter()) {
        let entry = sums.entry(label.clone()).or_insert((0.0, 0));
        entry.0 += *value;
        entry.1 += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(label, (sum, count))| (label, sum / count as f64))
        .collect())
}

/// Disparity of per-slice means around a global value.
///
/// Always co-reports all three views: the scalar disparity score, the
/// scalar global metric, and the full per-slice mapping, so a caller can
/// inspect both the summary and the breakdown from one result.
///
/// Serializes to a flat object whose key set is exactly
/// `{"fped", "fpr"} ∪ {slice labels}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisparityResult {
    /// Mean absolute deviation of per-slice values from the global value.
    pub fped: f64,
    /// The global metric value.
    pub fpr: f64,
    /// Per-slice mean metric, one entry per observed slice.
    #[serde(flatten)]
    pub per_slice: HashMap<String, f64>,
}

/// Compute the disparity score over per-slice means.
///
/// Fails with [`Error::NoData`] when the slice set is empty.
pub fn disparity(per_slice: HashMap<String, f64>, global: f64) -> Result<DisparityResult> {
    if per_slice.is_empty() {
        return Err(Error::no_data("disparity over an empty slice set"));
    }

    let fped = per_slice
        .values()
        .map(|v| (v - global).abs())
        .sum::<f64>()
        / per_slice.len() as f64;

    Ok(DisparityResult {
        fped,
        fpr: global,
        per_slice,
    })
}
