//! dbt-style YAML parsing.
//!
//! Deserializes into raw serde records first, then converts them into the
//! model types, reporting missing and invalid fields with their context.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::config::first_present;
use crate::model::{
    AggregationType, ConversionCalculation, ConversionParams, Dimension, DimensionKind,
    DisplayMeta, Entity, Measure, Metric, MetricInput, MetricKind, MetricType, Project,
    SemanticModel, TimeGranularity,
};
use crate::semantic::SemanticError;

use super::{LoadError, LoadResult};

static REF_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*ref\(\s*['"]([^'"]+)['"]\s*\)\s*$"#).unwrap()
});

#[derive(Debug, Default, Deserialize)]
struct RawFile {
    #[serde(default)]
    semantic_models: Vec<RawSemanticModel>,
    #[serde(default)]
    metrics: Vec<RawMetric>,
}

#[derive(Debug, Deserialize)]
struct RawSemanticModel {
    name: String,
    model: Option<String>,
    description: Option<String>,
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    dimensions: Vec<RawDimension>,
    #[serde(default)]
    measures: Vec<RawMeasure>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    name: String,
    #[serde(rename = "type")]
    entity_type: Option<String>,
    expr: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawDimension {
    name: String,
    #[serde(rename = "type")]
    dimension_type: Option<String>,
    expr: Option<Value>,
    label: Option<String>,
    description: Option<String>,
    type_params: Option<RawDimensionParams>,
}

#[derive(Debug, Deserialize)]
struct RawDimensionParams {
    time_granularity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMeasure {
    name: String,
    agg: Option<String>,
    expr: Option<Value>,
    label: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    primary_entity: Option<String>,
    value_format_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    meta: RawMeta,
}

#[derive(Debug, Deserialize)]
struct RawMetric {
    name: String,
    #[serde(rename = "type")]
    metric_type: Option<String>,
    label: Option<String>,
    description: Option<String>,
    #[serde(default)]
    type_params: RawTypeParams,
    #[serde(default)]
    meta: RawMeta,
    #[serde(default)]
    config: RawConfig,
}

/// Measure references may be a bare name or `{ name: ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMeasureRef {
    Name(String),
    Full { name: String },
}

impl RawMeasureRef {
    fn into_name(self) -> String {
        match self {
            RawMeasureRef::Name(name) | RawMeasureRef::Full { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMetricInput {
    Name(String),
    Full {
        name: String,
        alias: Option<String>,
        offset_window: Option<String>,
        offset_to_grain: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawTypeParams {
    measure: Option<RawMeasureRef>,
    numerator: Option<RawMeasureRef>,
    denominator: Option<RawMeasureRef>,
    expr: Option<Value>,
    #[serde(default)]
    metrics: Vec<RawMetricInput>,
    conversion_type_params: Option<RawConversionParams>,
}

#[derive(Debug, Deserialize)]
struct RawConversionParams {
    entity: Option<String>,
    base_measure: Option<RawMeasureRef>,
    conversion_measure: Option<RawMeasureRef>,
    calculation: Option<String>,
    window: Option<String>,
}

/// Parse one YAML document into a project.
pub(super) fn parse_str(content: &str, filename: &str) -> LoadResult<Project> {
    if content.trim().is_empty() {
        return Ok(Project::new());
    }
    let raw: RawFile = serde_yaml::from_str(content).map_err(|source| LoadError::Yaml {
        file: filename.to_string(),
        source,
    })?;

    let mut project = Project::new();
    for model in raw.semantic_models {
        project.models.push(convert_model(model)?);
    }
    for metric in raw.metrics {
        match convert_metric(metric)? {
            Ok(metric) => project.metrics.push(metric),
            Err(rejected) => {
                tracing::warn!(file = filename, "{}", rejected);
                project.rejected.push(rejected);
            }
        }
    }
    Ok(project)
}

fn convert_model(raw: RawSemanticModel) -> LoadResult<SemanticModel> {
    let context = format!("semantic model '{}'", raw.name);
    let mut model = SemanticModel::new(&raw.name);
    model.relation = raw.model.as_deref().map(parse_relation);
    model.description = raw.description;

    for entity in raw.entities {
        let entity_type = entity.entity_type.ok_or_else(|| LoadError::MissingField {
            field: format!("entities.{}.type", entity.name),
            context: context.clone(),
        })?;
        let converted = match entity_type.to_ascii_lowercase().as_str() {
            "primary" => Entity::primary(&entity.name),
            "foreign" => Entity::foreign(&entity.name),
            "unique" | "natural" => {
                tracing::warn!(
                    model = %raw.name,
                    entity = %entity.name,
                    entity_type = %entity_type,
                    "entity type does not form joins; skipping"
                );
                continue;
            }
            other => {
                return Err(LoadError::InvalidValue {
                    field: format!("entities.{}.type", entity.name),
                    context,
                    message: format!("unknown entity type '{}'", other),
                })
            }
        };
        model.entities.push(match entity.expr.as_ref().and_then(scalar_string) {
            Some(expr) => converted.with_expr(expr),
            None => converted,
        });
    }

    for dim in raw.dimensions {
        let kind = match dim.dimension_type.as_deref().map(str::to_ascii_lowercase) {
            None => DimensionKind::Categorical,
            Some(t) if t == "categorical" => DimensionKind::Categorical,
            Some(t) if t == "time" => {
                let granularity = dim
                    .type_params
                    .as_ref()
                    .and_then(|p| p.time_granularity.as_deref());
                let granularity = match granularity {
                    None => TimeGranularity::Day,
                    Some(g) => TimeGranularity::parse(g).ok_or_else(|| LoadError::InvalidValue {
                        field: format!("dimensions.{}.type_params.time_granularity", dim.name),
                        context: context.clone(),
                        message: format!("unknown granularity '{}'", g),
                    })?,
                };
                DimensionKind::Time { granularity }
            }
            Some(other) => {
                return Err(LoadError::InvalidValue {
                    field: format!("dimensions.{}.type", dim.name),
                    context,
                    message: format!("unknown dimension type '{}'", other),
                })
            }
        };
        model.dimensions.push(Dimension {
            name: dim.name,
            kind,
            expr: dim.expr.as_ref().and_then(scalar_string),
            label: dim.label,
            description: dim.description,
        });
    }

    for measure in raw.measures {
        let agg = measure.agg.ok_or_else(|| LoadError::MissingField {
            field: format!("measures.{}.agg", measure.name),
            context: context.clone(),
        })?;
        let agg = AggregationType::parse(&agg).ok_or_else(|| LoadError::InvalidValue {
            field: format!("measures.{}.agg", measure.name),
            context: context.clone(),
            message: format!("unsupported aggregation '{}'", agg),
        })?;
        model.measures.push(Measure {
            name: measure.name,
            agg,
            expr: measure.expr.as_ref().and_then(scalar_string),
            label: measure.label,
            description: measure.description,
        });
    }

    Ok(model)
}

/// Outer error: malformed YAML. Inner error: a metric rejected at the parse
/// boundary because of an unknown type tag.
fn convert_metric(raw: RawMetric) -> LoadResult<Result<Metric, SemanticError>> {
    let context = format!("metric '{}'", raw.name);
    let tag = raw.metric_type.ok_or_else(|| LoadError::MissingField {
        field: "type".to_string(),
        context: context.clone(),
    })?;
    let Some(metric_type) = MetricType::parse(&tag) else {
        return Ok(Err(SemanticError::UnsupportedMetricType {
            metric: raw.name,
            type_tag: tag,
        }));
    };

    let params = raw.type_params;
    let missing = |field: &str| LoadError::MissingField {
        field: format!("type_params.{}", field),
        context: context.clone(),
    };

    let kind = match metric_type {
        MetricType::Simple => MetricKind::Simple {
            measure: params.measure.ok_or_else(|| missing("measure"))?.into_name(),
        },
        MetricType::Ratio => MetricKind::Ratio {
            numerator: params.numerator.ok_or_else(|| missing("numerator"))?.into_name(),
            denominator: params
                .denominator
                .ok_or_else(|| missing("denominator"))?
                .into_name(),
        },
        MetricType::Derived => {
            let expr = params
                .expr
                .as_ref()
                .and_then(scalar_string)
                .ok_or_else(|| missing("expr"))?;
            let metrics = params.metrics.into_iter().map(convert_input).collect();
            MetricKind::Derived { expr, metrics }
        }
        MetricType::Conversion => {
            let raw = params
                .conversion_type_params
                .ok_or_else(|| missing("conversion_type_params"))?;
            let calculation = match raw.calculation.as_deref() {
                None | Some("conversion_rate") => ConversionCalculation::ConversionRate,
                Some("conversions") => ConversionCalculation::Conversions,
                Some(other) => {
                    return Err(LoadError::InvalidValue {
                        field: "type_params.conversion_type_params.calculation".to_string(),
                        context: context.clone(),
                        message: format!("unknown calculation '{}'", other),
                    })
                }
            };
            MetricKind::Conversion(ConversionParams {
                entity: raw
                    .entity
                    .ok_or_else(|| missing("conversion_type_params.entity"))?,
                base_measure: raw
                    .base_measure
                    .ok_or_else(|| missing("conversion_type_params.base_measure"))?
                    .into_name(),
                conversion_measure: raw
                    .conversion_measure
                    .ok_or_else(|| missing("conversion_type_params.conversion_measure"))?
                    .into_name(),
                calculation,
                window: raw.window,
            })
        }
    };

    let mut metric = Metric::new(raw.name, kind);
    metric.primary_entity = first_present([raw.meta.primary_entity, raw.config.meta.primary_entity]);
    metric.display = DisplayMeta {
        label: raw.label,
        description: raw.description,
        value_format_name: first_present([
            raw.meta.value_format_name,
            raw.config.meta.value_format_name,
        ]),
    };
    Ok(Ok(metric))
}

fn convert_input(raw: RawMetricInput) -> MetricInput {
    match raw {
        RawMetricInput::Name(name) => MetricInput::new(name),
        RawMetricInput::Full {
            name,
            alias,
            offset_window,
            offset_to_grain,
        } => MetricInput {
            name,
            alias,
            offset_window,
            offset_to_grain,
        },
    }
}

/// `ref('x')` → `x`; anything else is taken as a literal relation name.
fn parse_relation(model: &str) -> String {
    match REF_CALL.captures(model) {
        Some(caps) => caps[1].to_string(),
        None => model.trim().to_string(),
    }
}

/// YAML scalars (`expr: 1`, `expr: amount`) as strings.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
