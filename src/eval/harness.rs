//! Evaluation harness: explicit check registry and battery runner.
//!
//! Checks are registered by name with a category tag and a plain function
//! reference — the registry is built by explicit registration calls at
//! startup, never by runtime attribute scanning, so the full battery is
//! visible in one place ([`CheckRegistry::with_builtin_checks`]).
//!
//! The runner executes each check against a shared read-only dataset and
//! collects a [`CheckOutcome`] per check: either a value or an error
//! string, plus timing. A failing check never aborts the battery.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::eval::checks::{self, StatsResult};
use crate::eval::dataset::EvalDataset;
use crate::eval::slicing::DisparityResult;

/// Challenge-defined evaluation cutoff: the top-K depth at which hit/miss
/// and false-positive determinations are made.
pub const TOP_K_CHALLENGE: usize = 20;

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Cutoff rank depth consumed by every ranking-based check.
    pub top_k: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { top_k: TOP_K_CHALLENGE }
    }
}

/// Category tag attached to each registered check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    /// Dataset shape summaries.
    Stats,
    /// Standard information-retrieval metrics.
    Ranking,
    /// Slice-based disparity diagnostics.
    Fairness,
    /// Behavioral checks beyond rank metrics.
    Behavioral,
}

/// Value produced by a successful check.
///
/// Serializes untagged: scalars as numbers, structured results as flat
/// objects, matching what a report consumer expects per check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    /// A single scalar metric.
    Scalar(f64),
    /// The `stats` summary.
    Stats(StatsResult),
    /// A disparity result (fped + fpr + per-slice means).
    Disparity(DisparityResult),
}

/// Signature of a registered check.
pub type CheckFn = fn(&EvalDataset, &EvalConfig) -> Result<CheckValue>;

/// A named check with its category tag.
#[derive(Clone)]
pub struct CheckSpec {
    /// Registry name, unique within a registry.
    pub name: &'static str,
    /// Category tag.
    pub category: CheckCategory,
    /// The check function.
    pub run: CheckFn,
}

/// Registry mapping check names to functions.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<CheckSpec>,
}

impl CheckRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the full built-in battery.
    #[must_use]
    pub fn with_builtin_checks() -> Self {
        let mut registry = Self::new();
        registry.register("stats", CheckCategory::Stats, |ds, _| {
            checks::stats(ds).map(CheckValue::Stats)
        });
        registry.register("hit_rate_at_20", CheckCategory::Ranking, |ds, cfg| {
            checks::hit_rate(ds, cfg).map(CheckValue::Scalar)
        });
        registry.register("mrr_at_20", CheckCategory::Ranking, |ds, cfg| {
            checks::mrr(ds, cfg).map(CheckValue::Scalar)
        });
        registry.register("fped_country", CheckCategory::Fairness, |ds, cfg| {
            checks::fped_country(ds, cfg).map(CheckValue::Disparity)
        });
        registry.register("fped_user_activity", CheckCategory::Fairness, |ds, cfg| {
            checks::fped_user_activity(ds, cfg).map(CheckValue::Disparity)
        });
        registry.register("fped_artist_popularity", CheckCategory::Fairness, |ds, cfg| {
            checks::fped_artist_popularity(ds, cfg).map(CheckValue::Disparity)
        });
        registry.register("fped_gender", CheckCategory::Fairness, |ds, cfg| {
            checks::fped_gender(ds, cfg).map(CheckValue::Disparity)
        });
        registry.register("being_less_wrong", CheckCategory::Behavioral, |ds, cfg| {
            checks::being_less_wrong(ds, cfg).map(CheckValue::Scalar)
        });
        registry
    }

    /// Register a check.
    pub fn register(&mut self, name: &'static str, category: CheckCategory, run: CheckFn) {
        debug_assert!(
            self.get(name).is_none(),
            "check {} registered twice",
            name
        );
        self.checks.push(CheckSpec { name, category, run });
    }

    /// Look up a check by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CheckSpec> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Registered check names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name).collect()
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// True when no checks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Iterate over registered checks.
    pub fn iter(&self) -> impl Iterator<Item = &CheckSpec> {
        self.checks.iter()
    }
}

/// Outcome of running one check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check name.
    pub name: String,
    /// Category tag.
    pub category: CheckCategory,
    /// Value when the check succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CheckValue>,
    /// Error message when the check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent in the check.
    pub duration_ms: f64,
}

impl CheckOutcome {
    /// True when the check produced a value.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }
}

/// Results of a full battery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResults {
    /// Configuration used for the run.
    pub config: EvalConfig,
    /// One outcome per executed check, in execution order.
    pub outcomes: Vec<CheckOutcome>,
}

impl EvalResults {
    /// Outcome for a named check, if it was executed.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Number of failed checks.
    #[must_use]
    pub fn num_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Serialize the results as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Main evaluation harness.
pub struct EvalHarness {
    config: EvalConfig,
    registry: CheckRegistry,
}

impl EvalHarness {
    /// Create a harness with the given config and an empty registry.
    #[must_use]
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            registry: CheckRegistry::new(),
        }
    }

    /// Create a harness with the full built-in battery.
    #[must_use]
    pub fn with_builtin_checks(config: EvalConfig) -> Self {
        Self {
            config,
            registry: CheckRegistry::with_builtin_checks(),
        }
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Read-only registry access.
    #[must_use]
    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Mutable registry access, for registering custom checks.
    pub fn registry_mut(&mut self) -> &mut CheckRegistry {
        &mut self.registry
    }

    /// Run every registered check against the dataset.
    #[must_use]
    pub fn run_all(&self, dataset: &EvalDataset) -> EvalResults {
        let specs: Vec<CheckSpec> = self.registry.iter().cloned().collect();
        self.run_specs(&specs, dataset)
    }

    /// Run a named subset of the registered checks.
    ///
    /// Fails before executing anything if any name is unknown.
    pub fn run_named(&self, names: &[&str], dataset: &EvalDataset) -> Result<EvalResults> {
        let mut specs = Vec::with_capacity(names.len());
        for name in names {
            let spec = self
                .registry
                .get(name)
                .ok_or_else(|| Error::UnknownCheck((*name).to_string()))?;
            specs.push(spec.clone());
        }
        Ok(self.run_specs(&specs, dataset))
    }

    fn run_specs(&self, specs: &[CheckSpec], dataset: &EvalDataset) -> EvalResults {
        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            log::info!("running check {}", spec.name);
            let start = Instant::now();
            let result = (spec.run)(dataset, &self.config);
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

            let outcome = match result {
                Ok(value) => CheckOutcome {
                    name: spec.name.to_string(),
                    category: spec.category,
                    value: Some(value),
                    error: None,
                    duration_ms,
                },
                Err(e) => {
                    log::warn!("check {} failed: {}", spec.name, e);
                    CheckOutcome {
                        name: spec.name.to_string(),
                        category: spec.category,
                        value: None,
                        error: Some(e.to_string()),
                        duration_ms,
                    }
                }
            };
            outcomes.push(outcome);
        }

        EvalResults {
            config: self.config.clone(),
            outcomes,
        }
    }
}
