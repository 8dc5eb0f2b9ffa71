//! Catalog metadata, training interactions, and the embedding matrix.
//!
//! All of this is read-only reference data for an evaluation run. Unlike the
//! prediction/truth tables it is *not* aligned by evaluation-unit index:
//! user attributes are looked up by user id, item attributes by item id.
//! Those are two distinct join keys and must not be confused.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::table::{ItemId, UserId};

/// Category label standing in for a missing attribute value.
///
/// Absent metadata is mapped to this explicit category, never silently
/// dropped; whitelists may then keep or exclude it like any other value.
pub const UNKNOWN_CATEGORY: &str = "NaN";

/// Attributes of a single user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    /// Two-letter country code, when known.
    #[serde(default)]
    pub country: Option<String>,
    /// Self-reported gender, when known.
    #[serde(default)]
    pub gender: Option<String>,
}

/// Attributes of a single item (track).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Artist the item belongs to.
    pub artist_id: i64,
}

/// User and item metadata keyed by identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    users: HashMap<UserId, UserRecord>,
    items: HashMap<ItemId, ItemRecord>,
}

impl Catalog {
    /// Build a catalog from user and item maps.
    #[must_use]
    pub fn new(users: HashMap<UserId, UserRecord>, items: HashMap<ItemId, ItemRecord>) -> Self {
        Self { users, items }
    }

    /// User attributes, if the user is in the catalog.
    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    /// Item attributes, if the item is in the catalog.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.items.get(&id)
    }

    /// Country label for a user, with missing values folded into
    /// [`UNKNOWN_CATEGORY`].
    #[must_use]
    pub fn country_label(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .and_then(|u| u.country.clone())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
    }

    /// Gender label for a user, with missing values folded into
    /// [`UNKNOWN_CATEGORY`].
    #[must_use]
    pub fn gender_label(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .and_then(|u| u.gender.clone())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
    }

    /// Artist of an item. Fails loudly on an unknown item: a ground-truth
    /// item missing from the catalog would otherwise corrupt the popularity
    /// slicing silently.
    pub fn artist_of(&self, item: ItemId) -> Result<i64> {
        self.items
            .get(&item)
            .map(|rec| rec.artist_id)
            .ok_or(Error::UnknownItem(item))
    }

    /// Number of users in the catalog.
    #[must_use]
    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    /// Number of items in the catalog.
    #[must_use]
    pub fn num_items(&self) -> usize {
        self.items.len()
    }
}

/// One training interaction row: a user played an item some number of times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// User who interacted.
    pub user_id: UserId,
    /// Item interacted with.
    pub item_id: ItemId,
    /// Artist of the item, denormalized onto the row.
    pub artist_id: i64,
    /// Interaction count (play count).
    pub count: u64,
}

/// The training interaction log, used to derive activity and popularity
/// counts for binned slicing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionLog {
    rows: Vec<Interaction>,
}

impl InteractionLog {
    /// Build a log from interaction rows.
    #[must_use]
    pub fn new(rows: Vec<Interaction>) -> Self {
        Self { rows }
    }

    /// Interaction rows.
    #[must_use]
    pub fn rows(&self) -> &[Interaction] {
        &self.rows
    }

    /// Total interaction count per user, restricted to `users`.
    ///
    /// Users with no training rows sum to zero.
    #[must_use]
    pub fn activity_by_user(&self, users: &[UserId]) -> HashMap<UserId, u64> {
        let mut sums: HashMap<UserId, u64> = users.iter().map(|u| (*u, 0)).collect();
        for row in &self.rows {
            if let Some(total) = sums.get_mut(&row.user_id) {
                *total += row.count;
            }
        }
        sums
    }

    /// Total interaction count per artist, restricted to `artists`.
    ///
    /// Artists with no training rows sum to zero.
    #[must_use]
    pub fn popularity_by_artist(&self, artists: &[i64]) -> HashMap<i64, u64> {
        let mut sums: HashMap<i64, u64> = artists.iter().map(|a| (*a, 0)).collect();
        for row in &self.rows {
            if let Some(total) = sums.get_mut(&row.artist_id) {
                *total += row.count;
            }
        }
        sums
    }
}

/// Dense item embeddings, loaded once per run and shared read-only across
/// checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dim: usize,
    vectors: HashMap<ItemId, Vec<f32>>,
}

impl EmbeddingMatrix {
    /// Create an empty matrix for vectors of dimension `dim`.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: HashMap::new(),
        }
    }

    /// Embedding dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True when no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Insert a vector, validating its dimension.
    pub fn insert(&mut self, item: ItemId, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::EmbeddingDim {
                expected: self.dim,
                got: vector.len(),
            });
        }
        self.vectors.insert(item, vector);
        Ok(())
    }

    /// Vector for an item, if present.
    #[must_use]
    pub fn get(&self, item: ItemId) -> Option<&[f32]> {
        self.vectors.get(&item).map(Vec::as_slice)
    }

    /// Vector for an item, failing on absence.
    pub fn require(&self, item: ItemId) -> Result<&[f32]> {
        self.get(item).ok_or(Error::MissingEmbedding(item))
    }
}
