//! Semantic model → view mapping.

use crate::model::{self, AggregationType, DimensionKind, SemanticModel, TimeGranularity};

use super::{Dimension, DimensionGroup, Measure, View, ViewNaming};

/// Build the view for one semantic model. Metric measures are added later by
/// the generator, once metrics have been validated.
pub fn build_view(model: &SemanticModel, naming: &ViewNaming, schema: Option<&str>) -> View {
    let mut dimensions: Vec<Dimension> = model
        .entities
        .iter()
        .map(|entity| Dimension {
            name: entity.name.clone(),
            dimension_type: None,
            sql: column_sql(&entity.expr),
            primary_key: entity.is_primary(),
            hidden: true,
            label: None,
            description: None,
        })
        .collect();

    let mut dimension_groups = Vec::new();
    for dim in &model.dimensions {
        match dim.kind {
            DimensionKind::Categorical => dimensions.push(Dimension {
                name: dim.name.clone(),
                dimension_type: Some("string".to_string()),
                sql: column_sql(dim.column_expr()),
                primary_key: false,
                hidden: false,
                label: dim.label.clone(),
                description: dim.description.clone(),
            }),
            DimensionKind::Time { granularity } => dimension_groups.push(DimensionGroup {
                name: dim.name.clone(),
                timeframes: timeframes(granularity)
                    .iter()
                    .map(|tf| tf.to_string())
                    .collect(),
                sql: column_sql(dim.column_expr()),
                label: dim.label.clone(),
                description: dim.description.clone(),
            }),
        }
    }

    let measures = model.measures.iter().map(map_measure).collect();

    View {
        name: naming.view_name(&model.name),
        model: model.name.clone(),
        sql_table_name: model.relation.as_ref().map(|relation| match schema {
            Some(schema) => format!("{}.{}", schema, relation),
            None => relation.clone(),
        }),
        description: model.description.clone(),
        dimensions,
        dimension_groups,
        measures,
        metric_measures: Vec::new(),
    }
}

fn map_measure(measure: &model::Measure) -> Measure {
    let column = column_sql(measure.expr.as_deref().unwrap_or(&measure.name));
    let (measure_type, sql) = match measure.agg {
        AggregationType::Sum => ("sum", Some(column)),
        AggregationType::SumBoolean => (
            "sum",
            Some(format!("CASE WHEN {} THEN 1 ELSE 0 END", column)),
        ),
        AggregationType::Count => match measure.expr.as_deref().map(str::trim) {
            Some("1") | Some("*") => ("count", None),
            _ => (
                "sum",
                Some(format!("CASE WHEN {} IS NOT NULL THEN 1 ELSE 0 END", column)),
            ),
        },
        AggregationType::CountDistinct => ("count_distinct", Some(column)),
        AggregationType::Average => ("average", Some(column)),
        AggregationType::Min => ("min", Some(column)),
        AggregationType::Max => ("max", Some(column)),
        AggregationType::Median => ("median", Some(column)),
    };

    Measure {
        name: measure.name.clone(),
        measure_type: measure_type.to_string(),
        sql,
        label: measure.label.clone(),
        description: measure.description.clone(),
    }
}

/// Timeframes offered for a time dimension of the given granularity.
fn timeframes(granularity: TimeGranularity) -> &'static [&'static str] {
    const ALL: [&str; 7] = ["time", "hour", "date", "week", "month", "quarter", "year"];
    match granularity {
        TimeGranularity::Hour => &ALL,
        TimeGranularity::Day => &ALL[2..],
        TimeGranularity::Week => &ALL[3..],
        TimeGranularity::Month => &ALL[4..],
        TimeGranularity::Quarter => &ALL[5..],
        TimeGranularity::Year => &ALL[6..],
    }
}

/// Bare column names are qualified with `${TABLE}`; expressions pass through.
fn column_sql(expr: &str) -> String {
    let is_column = !expr.is_empty()
        && expr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !expr.starts_with(|c: char| c.is_ascii_digit());
    if is_column {
        format!("${{TABLE}}.{}", expr)
    } else {
        expr.to_string()
    }
}
