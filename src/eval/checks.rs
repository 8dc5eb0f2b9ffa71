//! The named metric checks.
//!
//! Each check is a pure function of the full dataset plus the run
//! configuration. A check does its own filtering, metadata joins, and
//! binning, then delegates to the slice aggregator and disparity scorer.
//! Nothing here mutates the dataset: whitelist filtering copies tables, and
//! slice assignments are derived fresh on every invocation.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::catalog::UNKNOWN_CATEGORY;
use crate::error::{Error, Result};
use crate::eval::binning::Breakpoints;
use crate::eval::dataset::EvalDataset;
use crate::eval::harness::EvalConfig;
use crate::eval::slicing::{disparity, slice_means, DisparityResult};
use crate::metrics::{fp_rate_per_unit, hit_per_unit, hit_rate_at_k, mrr_at_k, rr_at_k};
use crate::similarity::cosine_similarity;
use crate::table::{ItemTable, SliceAssignment, PAD_ITEM};

/// Countries with enough evaluation units to slice on.
///
/// `"NaN"` (the missing-country fold) is deliberately part of the list, so
/// users with an absent country form their own slice instead of being
/// dropped. A country that is present but unlisted is dropped by the
/// whitelist filter.
static COUNTRY_WHITELIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "US", "RU", "DE", "UK", "PL", "BR", "FI", "NL", "ES", "SE", "UA", "CA", "FR",
        UNKNOWN_CATEGORY,
    ]
    .into_iter()
    .collect()
});

/// Shape-of-the-dataset summary returned by the `stats` check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResult {
    /// Number of distinct evaluation units.
    pub num_users: usize,
    /// Maximum count of true items over all units.
    pub max_items: usize,
    /// Minimum count of true items over all units.
    pub min_items: usize,
}

/// Count distinct users and the max/min true-item counts per unit.
///
/// True items are entries not equal to the padding sentinel.
pub fn stats(ds: &EvalDataset) -> Result<StatsResult> {
    let truth = ds.truth();
    if truth.is_empty() {
        return Err(Error::no_data("stats over an empty ground-truth table"));
    }

    let counts: Vec<usize> = truth
        .rows()
        .iter()
        .map(|row| row.iter().filter(|id| **id != PAD_ITEM).count())
        .collect();

    Ok(StatsResult {
        num_users: truth.len(),
        max_items: counts.iter().copied().max().unwrap_or(0),
        min_items: counts.iter().copied().min().unwrap_or(0),
    })
}

/// Hit rate over the full evaluation set at the configured cutoff.
pub fn hit_rate(ds: &EvalDataset, config: &EvalConfig) -> Result<f64> {
    hit_rate_at_k(ds.predictions(), ds.truth(), config.top_k)
}

/// Mean reciprocal rank over the full evaluation set at the configured
/// cutoff.
pub fn mrr(ds: &EvalDataset, config: &EvalConfig) -> Result<f64> {
    mrr_at_k(ds.predictions(), ds.truth(), config.top_k)
}

/// Per-slice MRR, returned as a JSON-serializable `slice -> mean rr` map.
///
/// A diagnostic companion to the disparity checks: same grouping, but over
/// reciprocal rank instead of false positives and without the deviation
/// fold.
pub fn mrr_per_slice(
    preds: &ItemTable,
    truth: &ItemTable,
    slices: &SliceAssignment,
    k: usize,
) -> Result<HashMap<String, f64>> {
    slices.check_aligned(truth)?;
    let rr = rr_at_k(preds, truth, k)?;
    slice_means(&rr, slices.labels())
}

/// Shared core of the FPED checks: per-unit false-positive rates, grouped
/// by the slice assignment, folded into a disparity score.
fn fp_disparity(
    preds: &ItemTable,
    truth: &ItemTable,
    slices: &SliceAssignment,
    k: usize,
) -> Result<DisparityResult> {
    slices.check_aligned(truth)?;
    let fp = fp_rate_per_unit(preds, truth, k)?;
    let global = if fp.is_empty() {
        return Err(Error::no_data("false-positive rate over zero units"));
    } else {
        fp.iter().sum::<f64>() / fp.len() as f64
    };
    let per_slice = slice_means(&fp, slices.labels())?;
    disparity(per_slice, global)
}

/// FPED sliced by user country, restricted to the fixed country whitelist.
///
/// Missing countries are folded into the `"NaN"` category *before*
/// filtering, so only truly absent values become `"NaN"`; an unlisted but
/// present country is dropped. The whitelist mask is applied identically to
/// predictions, ground truth, and the slice assignment.
pub fn fped_country(ds: &EvalDataset, config: &EvalConfig) -> Result<DisparityResult> {
    let truth = ds.truth();
    let labels: Vec<String> = truth
        .keys()
        .iter()
        .map(|user| ds.catalog().country_label(*user))
        .collect();
    let mask: Vec<bool> = labels
        .iter()
        .map(|label| COUNTRY_WHITELIST.contains(label.as_str()))
        .collect();

    let dropped = mask.iter().filter(|keep| !**keep).count();
    if dropped > 0 {
        log::info!("fped_country: dropped {} units outside the country whitelist", dropped);
    }

    let preds = ds.predictions().filter(&mask)?;
    let truth = truth.filter(&mask)?;
    let slices = SliceAssignment::new(truth.keys().to_vec(), apply_mask(labels, &mask))?;
    fp_disparity(&preds, &truth, &slices, config.top_k)
}

/// FPED sliced by user activity bucket.
///
/// Activity is the summed training interaction count per user, bucketed
/// with the activity breakpoints. Users absent from the training log sum to
/// zero and land in the lowest bucket.
pub fn fped_user_activity(ds: &EvalDataset, config: &EvalConfig) -> Result<DisparityResult> {
    let truth = ds.truth();
    let bins = Breakpoints::activity();
    let sums = ds.train().activity_by_user(truth.keys());

    let labels: Vec<String> = truth
        .keys()
        .iter()
        .map(|user| bins.bucket_label(sums.get(user).copied().unwrap_or(0)))
        .collect();
    let slices = SliceAssignment::new(truth.keys().to_vec(), labels)?;
    fp_disparity(ds.predictions(), truth, &slices, config.top_k)
}

/// FPED sliced by the popularity bucket of the true item's artist.
///
/// Each unit's first true item is mapped to its artist (lookup by item id,
/// not by unit id); artist popularity is the summed training interaction
/// count for that artist, bucketed with the popularity breakpoints. The
/// lookup is per ground-truth row, so units sharing an artist keep their
/// own (duplicate) label.
pub fn fped_artist_popularity(ds: &EvalDataset, config: &EvalConfig) -> Result<DisparityResult> {
    let truth = ds.truth();
    let bins = Breakpoints::popularity();

    let mut artists = Vec::with_capacity(truth.len());
    for (user, row) in truth.iter() {
        let item = row
            .iter()
            .copied()
            .find(|id| *id != PAD_ITEM)
            .ok_or_else(|| {
                Error::no_data(format!("user {} has no true items to map to an artist", user))
            })?;
        artists.push(ds.catalog().artist_of(item)?);
    }

    let sums = ds.train().popularity_by_artist(&artists);
    let labels: Vec<String> = artists
        .iter()
        .map(|artist| bins.bucket_label(sums.get(artist).copied().unwrap_or(0)))
        .collect();
    let slices = SliceAssignment::new(truth.keys().to_vec(), labels)?;
    fp_disparity(ds.predictions(), truth, &slices, config.top_k)
}

/// FPED sliced directly by the raw gender attribute.
///
/// No binning and no whitelist: every unit participates, with missing
/// values folded into the `"NaN"` category rather than dropped.
pub fn fped_gender(ds: &EvalDataset, config: &EvalConfig) -> Result<DisparityResult> {
    let truth = ds.truth();
    let labels: Vec<String> = truth
        .keys()
        .iter()
        .map(|user| ds.catalog().gender_label(*user))
        .collect();
    let slices = SliceAssignment::new(truth.keys().to_vec(), labels)?;
    fp_disparity(ds.predictions(), truth, &slices, config.top_k)
}

/// Mean cosine similarity between the true item and the top prediction,
/// over units where the top-k missed entirely.
///
/// A "how wrong were the misses" signal: higher means the model's failures
/// at least landed near the right region of the embedding space. Fails with
/// a no-data error when there are no misses (nothing to score).
pub fn being_less_wrong(ds: &EvalDataset, config: &EvalConfig) -> Result<f64> {
    let preds = ds.predictions();
    let truth = ds.truth();

    let hits = hit_per_unit(preds, truth, config.top_k)?;
    let miss_mask: Vec<bool> = hits.iter().map(|hit| !hit).collect();

    let miss_preds = preds.filter(&miss_mask)?;
    let miss_truth = truth.filter(&miss_mask)?;
    if miss_truth.is_empty() {
        return Err(Error::no_data("no missed predictions to score"));
    }

    let mut sims = Vec::with_capacity(miss_truth.len());
    for ((user, truth_row), (_, pred_row)) in miss_truth.iter().zip(miss_preds.iter()) {
        let true_item = truth_row
            .iter()
            .copied()
            .find(|id| *id != PAD_ITEM)
            .ok_or_else(|| Error::no_data(format!("user {} has no true items", user)))?;
        let top_pred = pred_row
            .first()
            .copied()
            .ok_or_else(|| Error::no_data(format!("user {} has an empty prediction row", user)))?;

        let gt_vec = ds.embeddings().require(true_item)?;
        let pred_vec = ds.embeddings().require(top_pred)?;
        sims.push(cosine_similarity(gt_vec, pred_vec));
    }

    Ok(sims.iter().sum::<f64>() / sims.len() as f64)
}

fn apply_mask(values: Vec<String>, mask: &[bool]) -> Vec<String> {
    values
        .into_iter()
        .zip(mask.iter())
        .filter_map(|(value, keep)| keep.then_some(value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Catalog, EmbeddingMatrix, Interaction, InteractionLog, ItemRecord, UserRecord,
    };
    use crate::table::ItemTable;

    fn user(country: Option<&str>, gender: Option<&str>) -> UserRecord {
        UserRecord {
            country: country.map(String::from),
            gender: gender.map(String::from),
        }
    }

    /// Four users: two in DE, one in US, one with no country. Users 1 and 2
    /// get perfect top-1 predictions; users 3 and 4 miss completely.
    fn dataset() -> EvalDataset {
        let keys = vec![1, 2, 3, 4];
        let preds = ItemTable::new(
            keys.clone(),
            vec![vec![10, 11, 12], vec![20, 21, 22], vec![98, 97, 96], vec![95, 94, 93]],
        )
        .unwrap();
        let truth = ItemTable::new(
            keys,
            vec![
                vec![10, PAD_ITEM],
                vec![20, PAD_ITEM],
                vec![30, PAD_ITEM],
                vec![40, PAD_ITEM],
            ],
        )
        .unwrap();

        let mut users = HashMap::new();
        users.insert(1, user(Some("DE"), Some("f")));
        users.insert(2, user(Some("DE"), Some("m")));
        users.insert(3, user(Some("US"), None));
        users.insert(4, user(None, Some("f")));

        let mut items = HashMap::new();
        for (item, artist) in [(10, 100), (20, 100), (30, 200), (40, 300)] {
            items.insert(item, ItemRecord { artist_id: artist });
        }

        let train = InteractionLog::new(vec![
            Interaction { user_id: 1, item_id: 10, artist_id: 100, count: 5 },
            Interaction { user_id: 2, item_id: 20, artist_id: 100, count: 250 },
            Interaction { user_id: 3, item_id: 30, artist_id: 200, count: 40 },
            Interaction { user_id: 4, item_id: 40, artist_id: 300, count: 99_999 },
        ]);

        let mut embeddings = EmbeddingMatrix::new(2);
        for (item, vector) in [
            (30, vec![1.0, 0.0]),
            (98, vec![1.0, 0.0]),
            (40, vec![0.0, 1.0]),
            (95, vec![1.0, 0.0]),
        ] {
            embeddings.insert(item, vector).unwrap();
        }

        EvalDataset::new(preds, truth, train, Catalog::new(users, items), embeddings).unwrap()
    }

    fn config() -> EvalConfig {
        EvalConfig { top_k: 3 }
    }

    #[test]
    fn stats_counts_users_and_true_items() {
        let result = stats(&dataset()).unwrap();
        assert_eq!(result.num_users, 4);
        assert_eq!(result.max_items, 1);
        assert_eq!(result.min_items, 1);
    }

    #[test]
    fn hit_rate_and_mrr_over_the_full_set() {
        let ds = dataset();
        assert!((hit_rate(&ds, &config()).unwrap() - 0.5).abs() < 1e-12);
        assert!((mrr(&ds, &config()).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fped_country_folds_missing_and_keeps_nan_slice() {
        let result = fped_country(&dataset(), &config()).unwrap();
        // DE, US, NaN all whitelisted; nothing dropped.
        let mut slices: Vec<&str> = result.per_slice.keys().map(String::as_str).collect();
        slices.sort_unstable();
        assert_eq!(slices, vec!["DE", "NaN", "US"]);
        // DE units hit (fp 2/3 each), US and NaN units miss everything.
        assert!((result.per_slice["DE"] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.per_slice["US"], 1.0);
        assert_eq!(result.per_slice["NaN"], 1.0);
    }

    #[test]
    fn fped_country_drops_unlisted_countries() {
        let mut ds = dataset();
        // Rebuild with user 3 in an unlisted country.
        let mut users = HashMap::new();
        users.insert(1, user(Some("DE"), None));
        users.insert(2, user(Some("DE"), None));
        users.insert(3, user(Some("IT"), None));
        users.insert(4, user(None, None));
        ds = EvalDataset::new(
            ds.predictions().clone(),
            ds.truth().clone(),
            ds.train().clone(),
            Catalog::new(users, HashMap::new()),
            EmbeddingMatrix::new(2),
        )
        .unwrap();

        let result = fped_country(&ds, &config()).unwrap();
        assert!(!result.per_slice.contains_key("IT"));
        assert!(result.per_slice.contains_key("NaN"));
        assert_eq!(result.per_slice.len(), 2);
    }

    #[test]
    fn fped_user_activity_buckets_training_counts() {
        let result = fped_user_activity(&dataset(), &config()).unwrap();
        // counts 5, 250, 40, 99999 -> buckets 10, 100, 10, 10000
        let mut slices: Vec<&str> = result.per_slice.keys().map(String::as_str).collect();
        slices.sort_unstable();
        assert_eq!(slices, vec!["10", "100", "10000"]);
        // bucket "10" holds users 1 (hit) and 3 (miss).
        assert!((result.per_slice["10"] - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn fped_artist_popularity_looks_up_by_item_not_unit() {
        let result = fped_artist_popularity(&dataset(), &config()).unwrap();
        // artist 100 popularity 255 -> bucket 100; artist 200 -> 40 -> 10;
        // artist 300 -> 99999 -> 10000.
        let mut slices: Vec<&str> = result.per_slice.keys().map(String::as_str).collect();
        slices.sort_unstable();
        assert_eq!(slices, vec!["10", "100", "10000"]);
        // Users 1 and 2 share artist 100: duplicates preserved, slice mean
        // over both units.
        assert!((result.per_slice["100"] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn fped_gender_keeps_missing_as_nan_slice() {
        let result = fped_gender(&dataset(), &config()).unwrap();
        let mut slices: Vec<&str> = result.per_slice.keys().map(String::as_str).collect();
        slices.sort_unstable();
        assert_eq!(slices, vec!["NaN", "f", "m"]);
    }

    #[test]
    fn disparity_keys_are_fped_fpr_and_slices() {
        let result = fped_gender(&dataset(), &config()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("fped"));
        assert!(obj.contains_key("fpr"));
        assert_eq!(obj.len(), 2 + result.per_slice.len());
    }

    #[test]
    fn being_less_wrong_scores_only_misses() {
        let ds = dataset();
        // Misses: user 3 (truth 30 vs top pred 98, parallel vectors -> 1.0)
        // and user 4 (truth 40 vs top pred 95, orthogonal -> 0.0).
        let score = being_less_wrong(&ds, &config()).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn being_less_wrong_fails_without_misses() {
        let keys = vec![1];
        let preds = ItemTable::new(keys.clone(), vec![vec![10, 11]]).unwrap();
        let truth = ItemTable::new(keys, vec![vec![10, PAD_ITEM]]).unwrap();
        let ds = EvalDataset::new(
            preds,
            truth,
            InteractionLog::default(),
            Catalog::default(),
            EmbeddingMatrix::new(2),
        )
        .unwrap();
        let err = being_less_wrong(&ds, &EvalConfig { top_k: 2 }).unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn mrr_per_slice_groups_reciprocal_ranks() {
        let ds = dataset();
        let labels: Vec<String> = ds
            .truth()
            .keys()
            .iter()
            .map(|u| ds.catalog().country_label(*u))
            .collect();
        let slices = SliceAssignment::new(ds.truth().keys().to_vec(), labels).unwrap();
        let means = mrr_per_slice(ds.predictions(), ds.truth(), &slices, 3).unwrap();
        assert!((means["DE"] - 1.0).abs() < 1e-12);
        assert_eq!(means["US"], 0.0);
    }
}
