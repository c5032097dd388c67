//! Cross-view SQL composition for metric measures.
//!
//! Measures owned by the anchor model render as bare field references
//! (`${revenue}`); measures from joined models are qualified with their view
//! (`${orders.revenue}`) and collected into `required_fields`.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{ConversionCalculation, Metric, MetricKind, SemanticModel};
use crate::semantic::{MetricCatalog, ModelIndex, SemanticError, SemanticResult};

use super::ViewNaming;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// SQL for one metric plus the cross-view fields it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedSql {
    pub sql: String,
    pub required_fields: Vec<String>,
}

/// Renders metric SQL relative to an anchor model.
pub struct SqlComposer<'c, 'a> {
    index: &'c ModelIndex<'a>,
    catalog: &'c MetricCatalog<'a>,
    naming: &'c ViewNaming,
}

impl<'c, 'a> SqlComposer<'c, 'a> {
    pub fn new(
        index: &'c ModelIndex<'a>,
        catalog: &'c MetricCatalog<'a>,
        naming: &'c ViewNaming,
    ) -> Self {
        Self {
            index,
            catalog,
            naming,
        }
    }

    /// Compose the SQL expression of `metric` as seen from `anchor_model`.
    ///
    /// Expects the metric to have passed connectivity validation; unknown
    /// names are still reported rather than rendered.
    pub fn compose(&self, metric: &Metric, anchor_model: &SemanticModel) -> SemanticResult<ComposedSql> {
        let mut required = BTreeSet::new();
        let mut stack = vec![metric.name.clone()];
        let sql = self.render(metric, &metric.name, anchor_model, &mut required, &mut stack)?;

        Ok(ComposedSql {
            sql,
            required_fields: required.into_iter().collect(),
        })
    }

    fn render(
        &self,
        metric: &Metric,
        root: &str,
        anchor: &SemanticModel,
        required: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
    ) -> SemanticResult<String> {
        match &metric.kind {
            MetricKind::Simple { measure } => self.measure_ref(root, measure, anchor, required),
            MetricKind::Ratio {
                numerator,
                denominator,
            } => {
                let numerator = self.measure_ref(root, numerator, anchor, required)?;
                let denominator = self.measure_ref(root, denominator, anchor, required)?;
                Ok(safe_divide(&numerator, &denominator))
            }
            MetricKind::Conversion(params) => {
                let conversions =
                    self.measure_ref(root, &params.conversion_measure, anchor, required)?;
                match params.calculation {
                    ConversionCalculation::Conversions => Ok(conversions),
                    ConversionCalculation::ConversionRate => {
                        let base = self.measure_ref(root, &params.base_measure, anchor, required)?;
                        Ok(safe_divide(&conversions, &base))
                    }
                }
            }
            MetricKind::Derived { expr, metrics } => {
                let mut substitutions: HashMap<&str, String> = HashMap::new();

                for input in metrics {
                    if input.has_offset() {
                        tracing::warn!(
                            metric = root,
                            input = %input.name,
                            "time offsets cannot be expressed in LookML and are ignored"
                        );
                    }
                    if let Some(pos) = stack.iter().position(|name| *name == input.name) {
                        let mut cycle = stack[pos..].to_vec();
                        cycle.push(input.name.clone());
                        return Err(SemanticError::CircularMetricReference {
                            metric: root.to_string(),
                            cycle,
                        });
                    }
                    let nested = self.catalog.get(&input.name).ok_or_else(|| {
                        SemanticError::UnknownMetricReference {
                            metric: root.to_string(),
                            reference: input.name.clone(),
                        }
                    })?;

                    stack.push(input.name.clone());
                    let rendered = self.render(nested, root, anchor, required, stack)?;
                    stack.pop();

                    let rendered = match nested.kind {
                        MetricKind::Simple { .. } => rendered,
                        _ => format!("({})", rendered),
                    };
                    substitutions.insert(input.reference_name(), rendered);
                }

                let sql = IDENTIFIER.replace_all(expr, |caps: &Captures| {
                    let ident = &caps[0];
                    substitutions
                        .get(ident)
                        .cloned()
                        .unwrap_or_else(|| ident.to_string())
                });
                Ok(sql.into_owned())
            }
        }
    }

    fn measure_ref(
        &self,
        root: &str,
        measure: &str,
        anchor: &SemanticModel,
        required: &mut BTreeSet<String>,
    ) -> SemanticResult<String> {
        let owner = self.index.model_for_measure(measure).ok_or_else(|| {
            SemanticError::UnknownMeasureReference {
                metric: root.to_string(),
                measure: measure.to_string(),
            }
        })?;

        if owner.name == anchor.name {
            return Ok(format!("${{{}}}", measure));
        }

        let field = format!("{}.{}", self.naming.view_name(&owner.name), measure);
        let reference = format!("${{{}}}", field);
        required.insert(field);
        Ok(reference)
    }
}

fn safe_divide(numerator: &str, denominator: &str) -> String {
    format!("1.0 * {} / NULLIF({}, 0)", numerator, denominator)
}
