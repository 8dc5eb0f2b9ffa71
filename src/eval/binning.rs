//! Binning policy: mapping continuous counts into ordered buckets.
//!
//! Activity and popularity slices bucket a summed interaction count against
//! a fixed, strictly increasing breakpoint sequence. Buckets are half-open
//! intervals `[b_i, b_{i+1})`, labelled by their lower breakpoint; the
//! lowest bucket absorbs everything below the first breakpoint and the top
//! bucket absorbs everything at or above the last. Out-of-range values are
//! never an error.

use crate::error::{Error, Result};

/// Breakpoints for user-activity binning.
pub const ACTIVITY_BINS: [u64; 4] = [10, 100, 1_000, 10_000];

/// Breakpoints for artist-popularity binning.
pub const POPULARITY_BINS: [u64; 5] = [10, 100, 1_000, 10_000, 100_000];

/// A validated, strictly increasing breakpoint sequence.
///
/// There are exactly `len(breakpoints)` buckets; every value maps to exactly
/// one bucket label and the mapping is monotonic non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoints {
    bounds: Vec<u64>,
}

impl Breakpoints {
    /// Build a breakpoint set, validating non-emptiness and strict ordering.
    pub fn new(bounds: impl Into<Vec<u64>>) -> Result<Self> {
        let bounds = bounds.into();
        if bounds.is_empty() {
            return Err(Error::InvalidBreakpoints("empty breakpoint set".into()));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidBreakpoints(format!(
                "breakpoints must be strictly increasing, got {:?}",
                bounds
            )));
        }
        Ok(Self { bounds })
    }

    /// The fixed activity breakpoint set.
    #[must_use]
    pub fn activity() -> Self {
        // Constants are known-valid.
        Self { bounds: ACTIVITY_BINS.to_vec() }
    }

    /// The fixed popularity breakpoint set.
    #[must_use]
    pub fn popularity() -> Self {
        Self { bounds: POPULARITY_BINS.to_vec() }
    }

    /// Bucket labels, one per bucket, in increasing order.
    #[must_use]
    pub fn labels(&self) -> &[u64] {
        &self.bounds
    }

    /// Bucket label for a value.
    ///
    /// Returns the largest breakpoint `<=` the value, or the first
    /// breakpoint when the value falls below the whole range.
    #[must_use]
    pub fn bucket(&self, value: u64) -> u64 {
        match self.bounds.iter().rposition(|b| *b <= value) {
            Some(pos) => self.bounds[pos],
            None => self.bounds[0],
        }
    }

    /// Bucket label as a slice-category string.
    #[must_use]
    pub fn bucket_label(&self, value: u64) -> String {
        self.bucket(value).to_string()
    }
}
