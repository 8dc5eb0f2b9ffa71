//! Keyed tables for predictions and ground truth.
//!
//! Every evaluation in this crate runs over tables keyed by evaluation unit
//! (a user). Joins are always performed by key value, never by row position:
//! filtering steps (country whitelists, miss sets) produce non-contiguous
//! subsets on either side, so positional alignment would be silently wrong.
//!
//! [`ItemTable`] serves both roles of the data model:
//!
//! - **Predictions**: one row per user, ranked item identifiers,
//!   first-ranked at position 0, at least `k` slots.
//! - **Ground truth**: one row per user, true item identifiers, padded with
//!   [`PAD_ITEM`] where a user has fewer true items than the maximum.
//!
//! Alignment between two tables means *identical key sequences*, checked
//! explicitly with [`ItemTable::check_aligned`]. There is no implicit
//! reindexing anywhere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Evaluation-unit (user) identifier.
pub type UserId = i64;

/// Item identifier.
pub type ItemId = i64;

/// Sentinel padding a ground-truth row out to the maximum true-item count.
///
/// Entries equal to this value are never real items and never match any
/// prediction slot.
pub const PAD_ITEM: ItemId = -1;

/// A table of item-id rows keyed by user id.
///
/// The key sequence is a set: exactly one row per user. Row order is
/// preserved from construction and never reordered by any operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTable {
    keys: Vec<UserId>,
    rows: Vec<Vec<ItemId>>,
}

impl ItemTable {
    /// Build a table from parallel key and row vectors.
    ///
    /// Fails if lengths differ or a key appears twice.
    pub fn new(keys: Vec<UserId>, rows: Vec<Vec<ItemId>>) -> Result<Self> {
        if keys.len() != rows.len() {
            return Err(Error::invalid_table(format!(
                "{} keys but {} rows",
                keys.len(),
                rows.len()
            )));
        }
        let mut seen = HashMap::with_capacity(keys.len());
        for (pos, key) in keys.iter().enumerate() {
            if let Some(prev) = seen.insert(*key, pos) {
                return Err(Error::invalid_table(format!(
                    "duplicate key {} at rows {} and {}",
                    key, prev, pos
                )));
            }
        }
        Ok(Self { keys, rows })
    }

    /// Number of evaluation units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key sequence, in row order.
    #[must_use]
    pub fn keys(&self) -> &[UserId] {
        &self.keys
    }

    /// Rows, in key order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<ItemId>] {
        &self.rows
    }

    /// Iterate `(key, row)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &[ItemId])> {
        self.keys
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Row for a given key, if present.
    #[must_use]
    pub fn row(&self, key: UserId) -> Option<&[ItemId]> {
        // Linear scan is fine for lookup-by-key paths; bulk paths iterate.
        self.keys
            .iter()
            .position(|k| *k == key)
            .map(|pos| self.rows[pos].as_slice())
    }

    /// Non-pad entries of a row.
    #[must_use]
    pub fn true_items(row: &[ItemId]) -> Vec<ItemId> {
        row.iter().copied().filter(|id| *id != PAD_ITEM).collect()
    }

    /// Assert that `self` and `other` share an identical key sequence.
    ///
    /// Every table used in an aggregation must pass this before grouping.
    pub fn check_aligned(&self, other: &ItemTable) -> Result<()> {
        if self.keys != other.keys {
            return Err(Error::misaligned(format!(
                "key sequences differ ({} vs {} rows)",
                self.keys.len(),
                other.keys.len()
            )));
        }
        Ok(())
    }

    /// Keep only rows where `mask` is true.
    ///
    /// The mask must have one entry per row. Callers filtering predictions
    /// and ground truth must apply the *same* mask to both tables to
    /// preserve correspondence; this copies and never mutates in place.
    pub fn filter(&self, mask: &[bool]) -> Result<ItemTable> {
        if mask.len() != self.keys.len() {
            return Err(Error::misaligned(format!(
                "mask has {} entries for {} rows",
                mask.len(),
                self.keys.len()
            )));
        }
        let mut keys = Vec::new();
        let mut rows = Vec::new();
        for (pos, keep) in mask.iter().enumerate() {
            if *keep {
                keys.push(self.keys[pos]);
                rows.push(self.rows[pos].clone());
            }
        }
        Ok(Self { keys, rows })
    }
}

/// A per-evaluation-unit slice assignment, aligned to a table's key sequence.
///
/// Produced by the alignment layer (metadata lookup) or the binning policy,
/// and consumed by the slice aggregator. Exactly one label per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceAssignment {
    keys: Vec<UserId>,
    labels: Vec<String>,
}

impl SliceAssignment {
    /// Build an assignment from parallel key and label vectors.
    pub fn new(keys: Vec<UserId>, labels: Vec<String>) -> Result<Self> {
        if keys.len() != labels.len() {
            return Err(Error::misaligned(format!(
                "{} keys but {} labels",
                keys.len(),
                labels.len()
            )));
        }
        Ok(Self { keys, labels })
    }

    /// Number of labelled units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no units are labelled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key sequence, in row order.
    #[must_use]
    pub fn keys(&self) -> &[UserId] {
        &self.keys
    }

    /// Labels, in key order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Assert that this assignment covers exactly the key sequence of `table`.
    pub fn check_aligned(&self, table: &ItemTable) -> Result<()> {
        if self.keys != table.keys {
            return Err(Error::misaligned(format!(
                "slice assignment covers {} units, table has {}",
                self.keys.len(),
                table.keys.len()
            )));
        }
        Ok(())
    }

    /// Keep only entries where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<SliceAssignment> {
        if mask.len() != self.keys.len() {
            return Err(Error::misaligned(format!(
                "mask has {} entries for {} labels",
                mask.len(),
                self.keys.len()
            )));
        }
        let mut keys = Vec::new();
        let mut labels = Vec::new();
        for (pos, keep) in mask.iter().enumerate() {
            if *keep {
                keys.push(self.keys[pos]);
                labels.push(self.labels[pos].clone());
            }
        }
        Ok(Self { keys, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(keys: &[UserId]) -> ItemTable {
        let rows = keys.iter().map(|k| vec![*k * 10, PAD_ITEM]).collect();
        ItemTable::new(keys.to_vec(), rows).unwrap()
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = ItemTable::new(vec![1, 2, 1], vec![vec![]; 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn rejects_ragged_construction() {
        let err = ItemTable::new(vec![1, 2], vec![vec![5]]).unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn alignment_requires_identical_key_sequence() {
        let a = table(&[1, 2, 3]);
        let b = table(&[1, 2, 3]);
        assert!(a.check_aligned(&b).is_ok());

        // Same key set, different order: still misaligned.
        let c = table(&[3, 2, 1]);
        assert!(matches!(a.check_aligned(&c), Err(Error::Misaligned(_))));
    }

    #[test]
    fn filter_preserves_correspondence() {
        let preds = table(&[1, 2, 3, 4]);
        let truth = table(&[1, 2, 3, 4]);
        let mask = [true, false, true, false];

        let preds = preds.filter(&mask).unwrap();
        let truth = truth.filter(&mask).unwrap();
        assert_eq!(preds.keys(), &[1, 3]);
        assert!(preds.check_aligned(&truth).is_ok());
    }

    #[test]
    fn filter_rejects_wrong_mask_length() {
        let t = table(&[1, 2, 3]);
        assert!(matches!(t.filter(&[true]), Err(Error::Misaligned(_))));
    }

    #[test]
    fn true_items_drop_padding() {
        assert_eq!(ItemTable::true_items(&[5, PAD_ITEM, 7, PAD_ITEM]), vec![5, 7]);
        assert!(ItemTable::true_items(&[PAD_ITEM]).is_empty());
    }

    #[test]
    fn slice_assignment_checks_coverage() {
        let t = table(&[1, 2]);
        let ok = SliceAssignment::new(vec![1, 2], vec!["a".into(), "b".into()]).unwrap();
        assert!(ok.check_aligned(&t).is_ok());

        let bad = SliceAssignment::new(vec![2, 1], vec!["a".into(), "b".into()]).unwrap();
        assert!(matches!(bad.check_aligned(&t), Err(Error::Misaligned(_))));
    }

    #[test]
    fn row_lookup_is_by_key_not_position() {
        let t = ItemTable::new(vec![10, 20], vec![vec![1], vec![2]]).unwrap();
        assert_eq!(t.row(20), Some(&[2][..]));
        assert_eq!(t.row(99), None);
    }
}
