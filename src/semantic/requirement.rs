//! Cross-view measure requirements of one base model.

use std::collections::{BTreeMap, BTreeSet};

/// Target model → measures the base model's metrics read from it.
///
/// Never holds an entry for the base model itself: same-view measures are
/// referenced locally and need no exposure on a join.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricRequirement {
    base: String,
    measures: BTreeMap<String, BTreeSet<String>>,
}

impl MetricRequirement {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            measures: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Record that `measure` is needed from `model`. Returns false for
    /// measures owned by the base model, which are not recorded.
    pub fn require(&mut self, model: &str, measure: &str) -> bool {
        if model == self.base {
            return false;
        }
        self.measures
            .entry(model.to_string())
            .or_default()
            .insert(measure.to_string());
        true
    }

    /// Merge every entry of `other` into this requirement.
    pub fn merge(&mut self, other: &MetricRequirement) {
        for (model, measures) in &other.measures {
            for measure in measures {
                self.require(model, measure);
            }
        }
    }

    /// Sorted, deduplicated measures required from `model`.
    pub fn measures_for(&self, model: &str) -> impl Iterator<Item = &str> {
        self.measures
            .get(model)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Models with at least one required measure, sorted.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.measures.keys().map(String::as_str)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.measures.contains_key(model)
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }
}
