//! Error types for metric resolution and validation.
//!
//! Every variant is static configuration trouble scoped to one metric: in
//! lenient runs the metric is skipped and the error is reported, in strict
//! runs the first one aborts generation. Messages always name the metric,
//! the model(s) involved and a concrete remedy.

use thiserror::Error;

/// Result type for semantic operations.
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Discriminant of a [`SemanticError`], for reports and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnresolvedPrimaryEntity,
    UnreachableMeasure,
    UnknownMeasureReference,
    UnsupportedMetricType,
    UnknownMetricReference,
    CircularMetricReference,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnresolvedPrimaryEntity => "unresolved_primary_entity",
            ErrorKind::UnreachableMeasure => "unreachable_measure",
            ErrorKind::UnknownMeasureReference => "unknown_measure_reference",
            ErrorKind::UnsupportedMetricType => "unsupported_metric_type",
            ErrorKind::UnknownMetricReference => "unknown_metric_reference",
            ErrorKind::CircularMetricReference => "circular_metric_reference",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while resolving, validating or composing a metric.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticError {
    /// No explicit primary entity and none could be inferred.
    #[error(
        "Metric '{metric}' has no resolvable primary entity: {reason}. \
         Add `meta: {{primary_entity: <entity>}}` to the metric definition."
    )]
    UnresolvedPrimaryEntity { metric: String, reason: String },

    /// A required measure lives in a model the anchor cannot join to.
    #[error(
        "Metric '{metric}' requires measure '{measure}' from model '{model}', \
         which is not reachable from anchor model '{anchor_model}'. Either change the \
         metric's primary entity to one whose model can reach '{model}', or add a \
         foreign entity that joins '{anchor_model}' to '{model}'."
    )]
    UnreachableMeasure {
        metric: String,
        measure: String,
        model: String,
        anchor_model: String,
    },

    /// A measure name that no semantic model defines.
    #[error(
        "Metric '{metric}' references measure '{measure}', which no semantic model defines. \
         Fix the measure name or add it to a semantic model."
    )]
    UnknownMeasureReference { metric: String, measure: String },

    /// A metric type tag outside the supported set.
    #[error(
        "Metric '{metric}' has unsupported type '{type_tag}'. \
         Use one of: simple, ratio, derived, conversion."
    )]
    UnsupportedMetricType { metric: String, type_tag: String },

    /// A derived metric references a metric that does not exist.
    #[error(
        "Metric '{metric}' references metric '{reference}', which is not defined. \
         Fix the reference or define the metric."
    )]
    UnknownMetricReference { metric: String, reference: String },

    /// Derived metrics that reference each other in a loop.
    #[error(
        "Metric '{metric}' is part of a reference cycle: {}. Break the cycle.",
        .cycle.join(" -> ")
    )]
    CircularMetricReference { metric: String, cycle: Vec<String> },
}

impl SemanticError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SemanticError::UnresolvedPrimaryEntity { .. } => ErrorKind::UnresolvedPrimaryEntity,
            SemanticError::UnreachableMeasure { .. } => ErrorKind::UnreachableMeasure,
            SemanticError::UnknownMeasureReference { .. } => ErrorKind::UnknownMeasureReference,
            SemanticError::UnsupportedMetricType { .. } => ErrorKind::UnsupportedMetricType,
            SemanticError::UnknownMetricReference { .. } => ErrorKind::UnknownMetricReference,
            SemanticError::CircularMetricReference { .. } => ErrorKind::CircularMetricReference,
        }
    }

    /// The metric this error is about.
    pub fn metric(&self) -> &str {
        match self {
            SemanticError::UnresolvedPrimaryEntity { metric, .. }
            | SemanticError::UnreachableMeasure { metric, .. }
            | SemanticError::UnknownMeasureReference { metric, .. }
            | SemanticError::UnsupportedMetricType { metric, .. }
            | SemanticError::UnknownMetricReference { metric, .. }
            | SemanticError::CircularMetricReference { metric, .. } => metric,
        }
    }

    /// Semantic models named by this error.
    pub fn models(&self) -> Vec<&str> {
        match self {
            SemanticError::UnreachableMeasure {
                model,
                anchor_model,
                ..
            } => vec![model.as_str(), anchor_model.as_str()],
            _ => Vec::new(),
        }
    }
}
