//! # receval
//!
//! Evaluation harness for recommender-system predictions: standard IR
//! metrics plus fairness diagnostics sliced by population attributes.
//!
//! - **Rank metrics**: hit rate, MRR, per-unit reciprocal rank, and the
//!   false-positive tensor, all at a configurable top-K cutoff.
//! - **Fairness slices**: false-positive equality difference (FPED) by
//!   country, gender, user-activity bucket, and artist-popularity bucket.
//! - **Behavioral checks**: embedding-distance scoring of missed
//!   predictions ("being less wrong").
//!
//! ## Quick Start
//!
//! ```rust
//! use receval::eval::{EvalConfig, EvalHarness};
//! use receval::eval::dataset::EvalDataset;
//! use receval::catalog::{Catalog, EmbeddingMatrix, InteractionLog};
//! use receval::table::ItemTable;
//!
//! let keys = vec![1, 2];
//! let predictions = ItemTable::new(keys.clone(), vec![vec![5, 2, 3], vec![9, 8, 7]]).unwrap();
//! let truth = ItemTable::new(keys, vec![vec![5, -1], vec![8, -1]]).unwrap();
//!
//! let dataset = EvalDataset::new(
//!     predictions,
//!     truth,
//!     InteractionLog::default(),
//!     Catalog::default(),
//!     EmbeddingMatrix::new(2),
//! ).unwrap();
//!
//! let harness = EvalHarness::with_builtin_checks(EvalConfig { top_k: 3 });
//! let results = harness.run_all(&dataset);
//! assert_eq!(results.outcomes.len(), 8);
//! ```
//!
//! ## Design
//!
//! - **Explicit alignment**: predictions, ground truth, and slice
//!   assignments are keyed tables; every aggregation asserts identical key
//!   sequences instead of trusting row positions. Misalignment fails
//!   loudly.
//! - **Explicit registry**: the check battery is an explicit list of
//!   (name, category, function) registrations, not discovered at runtime.
//! - **Explicit degenerate handling**: empty slice sets and empty miss sets
//!   are reported as no-data errors, never as silent NaN.
//!
//! All evaluation is single-threaded, synchronous batch computation over
//! immutable in-memory tables.

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod similarity;
pub mod table;

pub use error::{Error, Result};
pub use eval::{EvalConfig, EvalHarness, EvalResults};
pub use table::{ItemTable, SliceAssignment, PAD_ITEM};
