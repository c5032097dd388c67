//! Field exposure on explore joins.
//!
//! A joined view exposes its `dimensions_only` set by default. Measures are
//! added only when a validated metric of the base model requires them from
//! that specific view, so measures never leak onto joins that don't need them.

use std::collections::BTreeSet;

use crate::semantic::{JoinGraph, MetricRequirement};

use super::{Join, ViewNaming};

/// Name of the set every view defines over its non-measure fields.
pub const DIMENSIONS_ONLY_SET: &str = "dimensions_only";

/// Field list for the join to `target_model`: the default set followed by the
/// sorted, deduplicated measures required from it.
pub fn join_fields(
    target_model: &str,
    requirement: &MetricRequirement,
    naming: &ViewNaming,
) -> Vec<String> {
    let view = naming.view_name(target_model);
    let measures: BTreeSet<&str> = requirement.measures_for(target_model).collect();

    let mut fields = Vec::with_capacity(measures.len() + 1);
    fields.push(format!("{}.{}*", view, DIMENSIONS_ONLY_SET));
    fields.extend(measures.into_iter().map(|m| format!("{}.{}", view, m)));
    fields
}

/// One join per join-graph entry, in hop order.
pub fn build_joins(
    graph: &JoinGraph,
    requirement: &MetricRequirement,
    naming: &ViewNaming,
) -> Vec<Join> {
    debug_assert_eq!(graph.base(), requirement.base());

    graph
        .joins()
        .into_iter()
        .map(|entry| {
            let predicate = &entry.predicate;
            let sql_on = format!(
                "${{{}.{}}} = ${{{}.{}}}",
                naming.view_name(&predicate.from_model),
                predicate.from_entity,
                naming.view_name(&predicate.to_model),
                predicate.to_entity
            );
            Join {
                view: naming.view_name(&entry.target),
                sql_on,
                relationship: entry.cardinality,
                join_type: "left_outer".to_string(),
                hop_count: entry.hop_count,
                fields: join_fields(&entry.target, requirement, naming),
            }
        })
        .collect()
}
