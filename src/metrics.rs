//! Rank-metric primitives over aligned prediction/truth tables.
//!
//! All functions here take a prediction table and a ground-truth table that
//! must share an identical key sequence; every entry point asserts that
//! before computing. Shapes follow the tensor convention of the slicing
//! layer:
//!
//! - [`hits_at_k`] / [`false_positives_at_k`] produce, per unit, a
//!   `k × M` matrix over (prediction slot, true item).
//! - [`rr_at_k`] reduces to one value per unit.
//! - [`hit_rate_at_k`] / [`mrr_at_k`] reduce to a single scalar.
//!
//! The padding sentinel [`PAD_ITEM`] never matches any prediction slot, so
//! versus a pad entry every slot is a "false positive"; downstream `min`
//! reductions across the true-item dimension make pads vanish whenever a
//! real true item matches.

use crate::error::Result;
use crate::table::{ItemTable, PAD_ITEM};

/// Per-unit `k × M` hit matrix: `true` where prediction slot `s` equals
/// true item `m`. Pad entries never hit.
pub fn hits_at_k(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<Vec<Vec<Vec<bool>>>> {
    preds.check_aligned(truth)?;

    let tensor = preds
        .rows()
        .iter()
        .zip(truth.rows().iter())
        .map(|(pred_row, truth_row)| {
            pred_row
                .iter()
                .take(k)
                .map(|slot| {
                    truth_row
                        .iter()
                        .map(|item| *item != PAD_ITEM && slot == item)
                        .collect()
                })
                .collect()
        })
        .collect();
    Ok(tensor)
}

/// Per-unit `k × M` false-positive matrix: `1` where prediction slot `s`
/// does *not* match true item `m`. Pad entries are unmatchable and always
/// contribute `1`.
pub fn false_positives_at_k(
    preds: &ItemTable,
    truth: &ItemTable,
    k: usize,
) -> Result<Vec<Vec<Vec<u8>>>> {
    let hits = hits_at_k(preds, truth, k)?;
    let tensor = hits
        .into_iter()
        .map(|unit| {
            unit.into_iter()
                .map(|slot| slot.into_iter().map(|hit| u8::from(!hit)).collect())
                .collect()
        })
        .collect();
    Ok(tensor)
}

/// Per-unit false-positive value: `min` across the true-item dimension,
/// then mean across the `k` slots.
///
/// The `min` collapses each (unit, slot) pair to 1 only if *no* true item
/// matches at that slot; the slot mean then gives the unit's false-positive
/// rate at `k`. This is the per-unit value fed into slice aggregation.
pub fn fp_rate_per_unit(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<Vec<f64>> {
    let tensor = false_positives_at_k(preds, truth, k)?;
    let rates = tensor
        .iter()
        .map(|unit| {
            if unit.is_empty() {
                return 0.0;
            }
            let slot_sum: u64 = unit
                .iter()
                .map(|slot| u64::from(slot.iter().copied().min().unwrap_or(1)))
                .sum();
            slot_sum as f64 / unit.len() as f64
        })
        .collect();
    Ok(rates)
}

/// Scalar false-positive rate at `k`: mean of [`fp_rate_per_unit`] over all
/// units (equivalently, mean over unit and slot of the min-reduced tensor).
pub fn fp_rate_at_k(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<f64> {
    let per_unit = fp_rate_per_unit(preds, truth, k)?;
    Ok(mean(&per_unit))
}

/// Per-unit reciprocal rank: `1 / rank` of the first slot (1-based) hitting
/// any true item within the top `k`, or 0.0 when no slot hits.
pub fn rr_at_k(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<Vec<f64>> {
    preds.check_aligned(truth)?;

    let rr = preds
        .rows()
        .iter()
        .zip(truth.rows().iter())
        .map(|(pred_row, truth_row)| {
            pred_row
                .iter()
                .take(k)
                .position(|slot| truth_row.iter().any(|item| *item != PAD_ITEM && item == slot))
                .map_or(0.0, |pos| 1.0 / (pos as f64 + 1.0))
        })
        .collect();
    Ok(rr)
}

/// Mean reciprocal rank at `k` over all units.
pub fn mrr_at_k(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<f64> {
    let rr = rr_at_k(preds, truth, k)?;
    Ok(mean(&rr))
}

/// Per-unit hit indicator: whether any top-`k` slot matches any true item.
pub fn hit_per_unit(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<Vec<bool>> {
    preds.check_aligned(truth)?;

    let hits = preds
        .rows()
        .iter()
        .zip(truth.rows().iter())
        .map(|(pred_row, truth_row)| {
            pred_row
                .iter()
                .take(k)
                .any(|slot| truth_row.iter().any(|item| *item != PAD_ITEM && item == slot))
        })
        .collect();
    Ok(hits)
}

/// Hit rate at `k`: fraction of units with at least one top-`k` hit.
pub fn hit_rate_at_k(preds: &ItemTable, truth: &ItemTable, k: usize) -> Result<f64> {
    let hits = hit_per_unit(preds, truth, k)?;
    if hits.is_empty() {
        return Ok(0.0);
    }
    let hit_count = hits.iter().filter(|h| **h).count();
    Ok(hit_count as f64 / hits.len() as f64)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ItemTable;

    fn tables(preds: Vec<Vec<i64>>, truth: Vec<Vec<i64>>) -> (ItemTable, ItemTable) {
        let keys: Vec<i64> = (0..preds.len() as i64).collect();
        (
            ItemTable::new(keys.clone(), preds).unwrap(),
            ItemTable::new(keys, truth).unwrap(),
        )
    }

    #[test]
    fn hit_at_slot_zero_scores_perfectly() {
        // predictions = [[5,2,3]], truth = [[5,-1,-1]], k=3
        let (preds, truth) = tables(vec![vec![5, 2, 3]], vec![vec![5, -1, -1]]);
        assert_eq!(hit_rate_at_k(&preds, &truth, 3).unwrap(), 1.0);
        assert_eq!(mrr_at_k(&preds, &truth, 3).unwrap(), 1.0);
    }

    #[test]
    fn complete_miss_scores_zero() {
        // predictions = [[2,3,4]], truth = [[5,-1,-1]], k=3
        let (preds, truth) = tables(vec![vec![2, 3, 4]], vec![vec![5, -1, -1]]);
        assert_eq!(hit_rate_at_k(&preds, &truth, 3).unwrap(), 0.0);
        assert_eq!(mrr_at_k(&preds, &truth, 3).unwrap(), 0.0);
        assert_eq!(hit_per_unit(&preds, &truth, 3).unwrap(), vec![false]);
    }

    #[test]
    fn reciprocal_rank_uses_first_hit() {
        let (preds, truth) = tables(vec![vec![9, 9, 5, 5]], vec![vec![5, -1]]);
        let rr = rr_at_k(&preds, &truth, 4).unwrap();
        assert!((rr[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn cutoff_limits_visible_slots() {
        // The hit sits at slot 2, outside k=2.
        let (preds, truth) = tables(vec![vec![9, 9, 5]], vec![vec![5]]);
        assert_eq!(hit_rate_at_k(&preds, &truth, 2).unwrap(), 0.0);
        assert_eq!(hit_rate_at_k(&preds, &truth, 3).unwrap(), 1.0);
    }

    #[test]
    fn pad_never_matches() {
        // A prediction of -1 must not "hit" a pad entry.
        let (preds, truth) = tables(vec![vec![-1, 2]], vec![vec![7, -1]]);
        assert_eq!(hit_rate_at_k(&preds, &truth, 2).unwrap(), 0.0);
    }

    #[test]
    fn fp_tensor_min_collapses_pads() {
        // Slot 0 hits the real true item; pads contribute 1 but the min
        // across the true-item dimension erases them.
        let (preds, truth) = tables(vec![vec![5, 2]], vec![vec![5, -1, -1]]);
        let per_unit = fp_rate_per_unit(&preds, &truth, 2).unwrap();
        // slot 0: min(0,1,1)=0; slot 1: min(1,1,1)=1 -> rate 0.5
        assert!((per_unit[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fp_rate_is_one_for_complete_miss() {
        let (preds, truth) = tables(vec![vec![2, 3]], vec![vec![5, -1]]);
        assert_eq!(fp_rate_at_k(&preds, &truth, 2).unwrap(), 1.0);
    }

    #[test]
    fn misaligned_tables_are_rejected() {
        let preds = ItemTable::new(vec![1, 2], vec![vec![5], vec![6]]).unwrap();
        let truth = ItemTable::new(vec![2, 1], vec![vec![5], vec![6]]).unwrap();
        assert!(hits_at_k(&preds, &truth, 1).is_err());
        assert!(rr_at_k(&preds, &truth, 1).is_err());
    }

    #[test]
    fn tensor_shape_is_slots_by_true_items() {
        let (preds, truth) = tables(vec![vec![1, 2, 3, 4]], vec![vec![2, 9, -1]]);
        let tensor = hits_at_k(&preds, &truth, 3).unwrap();
        assert_eq!(tensor.len(), 1);
        assert_eq!(tensor[0].len(), 3); // k slots
        assert_eq!(tensor[0][0].len(), 3); // M true-item entries incl. pad
        assert!(tensor[0][1][0]); // slot 1 (=2) hits true item 0 (=2)
    }
}
