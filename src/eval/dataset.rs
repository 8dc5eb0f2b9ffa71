//! The evaluation dataset container.
//!
//! Bundles everything a run needs: predictions, ground truth, the training
//! interaction log, catalog metadata, and the item embedding matrix. All of
//! it is immutable for the duration of a run; checks derive fresh slice
//! assignments and aggregates on every invocation and never mutate the
//! shared tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::catalog::{Catalog, EmbeddingMatrix, InteractionLog, Interaction, ItemRecord, UserRecord};
use crate::error::{Error, Result};
use crate::table::{ItemId, ItemTable, UserId};

/// One evaluation run's worth of aligned tables and reference data.
#[derive(Debug, Clone)]
pub struct EvalDataset {
    predictions: ItemTable,
    truth: ItemTable,
    train: InteractionLog,
    catalog: Catalog,
    embeddings: EmbeddingMatrix,
}

impl EvalDataset {
    /// Assemble a dataset, validating prediction/truth alignment up front.
    pub fn new(
        predictions: ItemTable,
        truth: ItemTable,
        train: InteractionLog,
        catalog: Catalog,
        embeddings: EmbeddingMatrix,
    ) -> Result<Self> {
        predictions.check_aligned(&truth)?;
        Ok(Self {
            predictions,
            truth,
            train,
            catalog,
            embeddings,
        })
    }

    /// Ranked predictions, one row per evaluation unit.
    #[must_use]
    pub fn predictions(&self) -> &ItemTable {
        &self.predictions
    }

    /// Held-out ground truth, aligned with the predictions.
    #[must_use]
    pub fn truth(&self) -> &ItemTable {
        &self.truth
    }

    /// Training interaction log.
    #[must_use]
    pub fn train(&self) -> &InteractionLog {
        &self.train
    }

    /// User/item metadata.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Item embedding matrix.
    #[must_use]
    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    /// Load a dataset from its JSON file representation.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: DatasetFile = serde_json::from_str(raw)?;
        file.into_dataset()
    }
}

/// On-disk JSON representation of an [`EvalDataset`].
///
/// Kept separate from the validated in-memory types so deserialization
/// cannot bypass table invariants (unique keys, alignment, embedding
/// dimensions).
#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetFile {
    /// `user_id -> ranked predicted item ids`, in evaluation order.
    pub predictions: Vec<(UserId, Vec<ItemId>)>,
    /// `user_id -> true item ids` (padded with -1), same order.
    pub truth: Vec<(UserId, Vec<ItemId>)>,
    /// Training interactions.
    pub train: Vec<Interaction>,
    /// User metadata.
    pub users: HashMap<UserId, UserRecord>,
    /// Item metadata.
    pub items: HashMap<ItemId, ItemRecord>,
    /// Embedding dimension.
    pub embedding_dim: usize,
    /// `item_id -> embedding vector`.
    pub embeddings: HashMap<ItemId, Vec<f32>>,
}

impl DatasetFile {
    /// Validate and convert into an [`EvalDataset`].
    pub fn into_dataset(self) -> Result<EvalDataset> {
        let (pred_keys, pred_rows) = self.predictions.into_iter().unzip();
        let predictions = ItemTable::new(pred_keys, pred_rows)?;

        let (truth_keys, truth_rows) = self.truth.into_iter().unzip();
        let truth = ItemTable::new(truth_keys, truth_rows)?;

        let mut embeddings = EmbeddingMatrix::new(self.embedding_dim);
        for (item, vector) in self.embeddings {
            embeddings.insert(item, vector)?;
        }

        if self.users.is_empty() && self.items.is_empty() {
            log::warn!("dataset has an empty catalog; attribute slices will all be \"NaN\"");
        }

        EvalDataset::new(
            predictions,
            truth,
            InteractionLog::new(self.train),
            Catalog::new(self.users, self.items),
            embeddings,
        )
        .map_err(|e| Error::dataset(format!("invalid dataset file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> String {
        serde_json::json!({
            "predictions": [[1, [5, 2, 3]]],
            "truth": [[1, [5, -1, -1]]],
            "train": [
                {"user_id": 1, "item_id": 5, "artist_id": 7, "count": 12}
            ],
            "users": {"1": {"country": "DE", "gender": "f"}},
            "items": {"5": {"artist_id": 7}},
            "embedding_dim": 2,
            "embeddings": {"5": [1.0, 0.0], "2": [0.0, 1.0]}
        })
        .to_string()
    }

    #[test]
    fn parses_and_validates_a_minimal_dataset() {
        let ds = EvalDataset::from_json_str(&minimal_json()).unwrap();
        assert_eq!(ds.predictions().len(), 1);
        assert_eq!(ds.truth().len(), 1);
        assert_eq!(ds.embeddings().dim(), 2);
        assert_eq!(ds.catalog().country_label(1), "DE");
    }

    #[test]
    fn rejects_misaligned_prediction_and_truth_keys() {
        let raw = serde_json::json!({
            "predictions": [[1, [5]]],
            "truth": [[2, [5]]],
            "train": [],
            "users": {},
            "items": {},
            "embedding_dim": 2,
            "embeddings": {}
        })
        .to_string();
        let err = EvalDataset::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn rejects_wrong_embedding_dimension() {
        let raw = serde_json::json!({
            "predictions": [[1, [5]]],
            "truth": [[1, [5]]],
            "train": [],
            "users": {},
            "items": {},
            "embedding_dim": 3,
            "embeddings": {"5": [1.0, 0.0]}
        })
        .to_string();
        assert!(EvalDataset::from_json_str(&raw).is_err());
    }
}
