//! Measure dependency extraction.
//!
//! Flattens a metric into the set of measure names it ultimately reads.
//! Derived metrics are followed through their nested metric references down
//! to measures; the metric names themselves never appear in the result.

use std::collections::{BTreeSet, HashMap};

use crate::model::{Metric, MetricKind};

use super::error::{SemanticError, SemanticResult};

/// Name lookup over every parsed metric.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog<'a> {
    metrics: HashMap<&'a str, &'a Metric>,
}

impl<'a> MetricCatalog<'a> {
    /// Index metrics by name. When a name repeats, the first definition wins.
    pub fn new(metrics: &'a [Metric]) -> Self {
        let mut by_name = HashMap::new();
        for metric in metrics {
            if by_name.contains_key(metric.name.as_str()) {
                tracing::warn!(metric = %metric.name, "duplicate metric definition ignored");
                continue;
            }
            by_name.insert(metric.name.as_str(), metric);
        }
        Self { metrics: by_name }
    }

    pub fn get(&self, name: &str) -> Option<&'a Metric> {
        self.metrics.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Measures `metric` depends on.
pub fn extract_measures(
    metric: &Metric,
    catalog: &MetricCatalog<'_>,
) -> SemanticResult<BTreeSet<String>> {
    let mut measures = BTreeSet::new();
    let mut stack = vec![metric.name.clone()];
    collect(metric, &metric.name, catalog, &mut stack, &mut measures)?;
    Ok(measures)
}

fn collect(
    metric: &Metric,
    root: &str,
    catalog: &MetricCatalog<'_>,
    stack: &mut Vec<String>,
    measures: &mut BTreeSet<String>,
) -> SemanticResult<()> {
    match &metric.kind {
        MetricKind::Simple { measure } => {
            measures.insert(measure.clone());
        }
        MetricKind::Ratio {
            numerator,
            denominator,
        } => {
            measures.insert(numerator.clone());
            measures.insert(denominator.clone());
        }
        MetricKind::Conversion(params) => {
            measures.insert(params.base_measure.clone());
            measures.insert(params.conversion_measure.clone());
        }
        MetricKind::Derived { metrics, .. } => {
            for input in metrics {
                if let Some(pos) = stack.iter().position(|name| *name == input.name) {
                    let mut cycle = stack[pos..].to_vec();
                    cycle.push(input.name.clone());
                    return Err(SemanticError::CircularMetricReference {
                        metric: root.to_string(),
                        cycle,
                    });
                }

                let nested = catalog.get(&input.name).ok_or_else(|| {
                    SemanticError::UnknownMetricReference {
                        metric: root.to_string(),
                        reference: input.name.clone(),
                    }
                })?;

                stack.push(input.name.clone());
                collect(nested, root, catalog, stack, measures)?;
                stack.pop();
            }
        }
    }
    Ok(())
}
