// tests/model/loader_test.rs
use std::path::PathBuf;

use lookgen::model::loader::{load_project, load_project_from_str, LoadError};
use lookgen::model::{
    AggregationType, ConversionCalculation, DimensionKind, MetricKind, TimeGranularity,
};
use lookgen::semantic::SemanticError;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

#[test]
fn test_load_directory_in_path_order() {
    let project = load_project(&fixture("marketplace")).unwrap();

    let models: Vec<&str> = project.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(models, vec!["rentals", "clicks", "searches"]);
    assert_eq!(project.metrics.len(), 6);
    assert!(project.rejected.is_empty());
}

#[test]
fn test_model_fields() {
    let project = load_project(&fixture("marketplace/models/searches.yml")).unwrap();
    let searches = &project.models[0];

    assert_eq!(searches.relation.as_deref(), Some("fct_searches"));
    assert_eq!(searches.description.as_deref(), Some("One row per search"));
    assert_eq!(searches.primary_entity().unwrap().expr, "search_id");

    assert_eq!(searches.dimensions[0].kind, DimensionKind::Categorical);
    assert_eq!(
        searches.dimensions[1].kind,
        DimensionKind::Time {
            granularity: TimeGranularity::Day
        }
    );

    let measure = &searches.measures[0];
    assert_eq!(measure.agg, AggregationType::Count);
    assert_eq!(measure.expr.as_deref(), Some("1"));
}

#[test]
fn test_metric_variants() {
    let project = load_project(&fixture("marketplace/metrics.yml")).unwrap();

    let ratio = project.metric("rentals_per_click").unwrap();
    assert_eq!(
        ratio.kind,
        MetricKind::Ratio {
            numerator: "rental_count".into(),
            denominator: "click_count".into(),
        }
    );
    assert_eq!(ratio.primary_entity.as_deref(), Some("search"));

    let clicks = project.metric("clicks_total").unwrap();
    assert_eq!(clicks.primary_entity.as_deref(), Some("click"));

    let engagement = project.metric("engagement").unwrap();
    let MetricKind::Derived { expr, metrics } = &engagement.kind else {
        panic!("expected derived metric");
    };
    assert_eq!(expr, "rentals + clicks");
    assert_eq!(metrics[0].name, "rentals_total");
    assert_eq!(metrics[0].reference_name(), "rentals");
    assert_eq!(engagement.display.value_format_name.as_deref(), Some("decimal_0"));
    assert_eq!(
        engagement.display.description.as_deref(),
        Some("Rentals plus clicks per search")
    );

    let conversion = project.metric("search_conversion").unwrap();
    let MetricKind::Conversion(params) = &conversion.kind else {
        panic!("expected conversion metric");
    };
    assert_eq!(params.calculation, ConversionCalculation::ConversionRate);
    assert_eq!(params.window.as_deref(), Some("7 days"));
}

#[test]
fn test_conversions_calculation_and_offsets() {
    let yaml = r#"
metrics:
  - name: converted_searches
    type: conversion
    type_params:
      conversion_type_params:
        entity: search
        base_measure: { name: search_count }
        conversion_measure: { name: rental_count }
        calculation: conversions
  - name: growth
    type: derived
    type_params:
      expr: current - previous
      metrics:
        - current_revenue
        - name: current_revenue
          alias: previous
          offset_window: 1 month
"#;
    let project = load_project_from_str(yaml, "inline.yml").unwrap();

    let MetricKind::Conversion(params) = &project.metrics[0].kind else {
        panic!("expected conversion metric");
    };
    assert_eq!(params.calculation, ConversionCalculation::Conversions);

    let MetricKind::Derived { metrics, .. } = &project.metrics[1].kind else {
        panic!("expected derived metric");
    };
    assert!(!metrics[0].has_offset());
    assert!(metrics[1].has_offset());
}

#[test]
fn test_unknown_metric_type_is_rejected() {
    let yaml = r#"
metrics:
  - name: running_total
    type: cumulative
    type_params:
      measure: rental_count
"#;
    let project = load_project_from_str(yaml, "inline.yml").unwrap();
    assert!(project.metrics.is_empty());
    assert!(matches!(
        &project.rejected[0],
        SemanticError::UnsupportedMetricType { type_tag, .. } if type_tag == "cumulative"
    ));
}

#[test]
fn test_missing_aggregation() {
    let yaml = r#"
semantic_models:
  - name: rentals
    measures:
      - name: rental_count
"#;
    let err = load_project_from_str(yaml, "inline.yml").unwrap_err();
    assert!(matches!(err, LoadError::MissingField { ref field, .. } if field == "measures.rental_count.agg"));
}

#[test]
fn test_missing_ratio_denominator() {
    let yaml = r#"
metrics:
  - name: half
    type: ratio
    type_params:
      numerator: rental_count
"#;
    let err = load_project_from_str(yaml, "inline.yml").unwrap_err();
    assert!(err.to_string().contains("type_params.denominator"));
}

#[test]
fn test_yaml_error_names_file() {
    let err = load_project_from_str("semantic_models: [", "broken.yml").unwrap_err();
    assert!(matches!(err, LoadError::Yaml { ref file, .. } if file == "broken.yml"));
}

#[test]
fn test_missing_path() {
    let err = load_project(&fixture("does_not_exist")).unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound { .. }));
}

#[test]
fn test_unsupported_extension() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
    let err = load_project(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedExtension { ref extension } if extension == "toml"));
}
