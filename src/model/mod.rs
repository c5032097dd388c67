//! Semantic-layer model types.
//!
//! These are the parsed, immutable inputs of a generation run: semantic
//! models (entities, dimensions, measures) and the metrics declared across
//! them.

pub mod loader;
pub mod metric;
pub mod semantic_model;

pub use metric::{
    ConversionCalculation, ConversionParams, DisplayMeta, Metric, MetricInput, MetricKind,
    MetricType,
};
pub use semantic_model::{
    AggregationType, Dimension, DimensionKind, Entity, EntityRole, Measure, SemanticModel,
    TimeGranularity,
};

use crate::semantic::SemanticError;

/// Everything parsed from a semantic-layer project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub models: Vec<SemanticModel>,
    pub metrics: Vec<Metric>,
    /// Metrics dropped at the parse boundary (unknown type tags).
    pub rejected: Vec<SemanticError>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: SemanticModel) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Merge another project's records into this one.
    pub fn extend(&mut self, other: Project) {
        self.models.extend(other.models);
        self.metrics.extend(other.metrics);
        self.rejected.extend(other.rejected);
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}
