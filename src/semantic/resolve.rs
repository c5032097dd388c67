//! Primary-entity resolution.
//!
//! Decides which model anchors a metric. An explicit override always wins;
//! otherwise only ratio metrics are inferred, from the model owning the
//! denominator measure (the denominator defines the grain). Every other
//! metric type must declare its primary entity.

use crate::model::{Metric, MetricKind, SemanticModel};

use super::error::{SemanticError, SemanticResult};
use super::index::ModelIndex;

/// How the anchor entity was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSource {
    Explicit,
    InferredFromDenominator,
}

/// The resolved anchor of a metric.
#[derive(Debug, Clone, Copy)]
pub struct Anchor<'a> {
    pub entity: &'a str,
    pub model: &'a SemanticModel,
    pub source: AnchorSource,
}

/// Resolve the primary entity name for `metric`.
pub fn resolve_primary_entity<'a>(
    metric: &'a Metric,
    index: &ModelIndex<'a>,
) -> SemanticResult<&'a str> {
    if let Some(entity) = &metric.primary_entity {
        return Ok(entity.as_str());
    }

    match &metric.kind {
        MetricKind::Ratio { denominator, .. } => {
            let owner = index.model_for_measure(denominator).ok_or_else(|| {
                SemanticError::UnknownMeasureReference {
                    metric: metric.name.clone(),
                    measure: denominator.clone(),
                }
            })?;
            owner
                .primary_entity()
                .map(|entity| entity.name.as_str())
                .ok_or_else(|| SemanticError::UnresolvedPrimaryEntity {
                    metric: metric.name.clone(),
                    reason: format!(
                        "denominator measure '{}' belongs to model '{}', which declares no primary entity",
                        denominator, owner.name
                    ),
                })
        }
        MetricKind::Simple { .. } | MetricKind::Derived { .. } | MetricKind::Conversion(_) => {
            Err(SemanticError::UnresolvedPrimaryEntity {
                metric: metric.name.clone(),
                reason: format!(
                    "{} metrics are never inferred and need an explicit primary entity",
                    metric.metric_type()
                ),
            })
        }
    }
}

/// Resolve the anchor entity and the model declaring it.
pub fn resolve_anchor<'a>(metric: &'a Metric, index: &ModelIndex<'a>) -> SemanticResult<Anchor<'a>> {
    let entity = resolve_primary_entity(metric, index)?;
    let source = if metric.primary_entity.is_some() {
        AnchorSource::Explicit
    } else {
        AnchorSource::InferredFromDenominator
    };

    let model = index
        .model_for_entity(entity)
        .ok_or_else(|| SemanticError::UnresolvedPrimaryEntity {
            metric: metric.name.clone(),
            reason: format!("no semantic model declares '{}' as its primary entity", entity),
        })?;

    tracing::debug!(metric = %metric.name, entity, model = %model.name, ?source, "metric anchored");
    Ok(Anchor {
        entity,
        model,
        source,
    })
}
