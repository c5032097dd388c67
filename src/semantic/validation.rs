//! Connectivity validation.
//!
//! A metric anchored on a model can only read measures from that model or
//! from models joined into the model's [`JoinGraph`]. These checks are pure
//! and can be re-run freely.

use std::collections::BTreeSet;

use crate::model::{Metric, SemanticModel};

use super::error::{SemanticError, SemanticResult};
use super::index::ModelIndex;
use super::join_graph::JoinGraph;
use super::requirement::MetricRequirement;

/// Check that every measure in `measures` is reachable from `anchor_model`.
///
/// Measures are checked in sorted order and the first violation is returned.
pub fn validate_connectivity(
    metric: &Metric,
    measures: &BTreeSet<String>,
    anchor_model: &SemanticModel,
    join_graph: &JoinGraph,
    index: &ModelIndex<'_>,
) -> SemanticResult<()> {
    debug_assert_eq!(join_graph.base(), anchor_model.name);

    for measure in measures {
        let owner = index.model_for_measure(measure).ok_or_else(|| {
            SemanticError::UnknownMeasureReference {
                metric: metric.name.clone(),
                measure: measure.clone(),
            }
        })?;

        if !join_graph.reaches(&owner.name) {
            return Err(SemanticError::UnreachableMeasure {
                metric: metric.name.clone(),
                measure: measure.clone(),
                model: owner.name.clone(),
                anchor_model: anchor_model.name.clone(),
            });
        }
    }
    Ok(())
}

/// Group validated measures by owning model, dropping the anchor's own.
pub fn required_measures(
    measures: &BTreeSet<String>,
    anchor_model: &SemanticModel,
    index: &ModelIndex<'_>,
) -> MetricRequirement {
    let mut requirement = MetricRequirement::new(anchor_model.name.as_str());
    for measure in measures {
        if let Some(owner) = index.model_for_measure(measure) {
            requirement.require(&owner.name, measure);
        }
    }
    requirement
}
