// tests/semantic/resolve_test.rs
use lookgen::model::{
    AggregationType, ConversionCalculation, ConversionParams, Entity, Measure, Metric,
    MetricInput, SemanticModel,
};
use lookgen::semantic::{
    resolve_anchor, resolve_primary_entity, AnchorSource, ErrorKind, ModelIndex, SemanticError,
};

fn marketplace() -> Vec<SemanticModel> {
    vec![
        SemanticModel::new("searches")
            .with_entity(Entity::primary("search"))
            .with_measure(Measure::new("search_count", AggregationType::Count)),
        SemanticModel::new("rentals")
            .with_entity(Entity::primary("rental"))
            .with_entity(Entity::foreign("search"))
            .with_measure(Measure::new("rental_count", AggregationType::Count)),
        SemanticModel::new("events")
            .with_entity(Entity::foreign("search"))
            .with_measure(Measure::new("event_count", AggregationType::Count)),
    ]
}

#[test]
fn test_ratio_infers_from_denominator() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metric = Metric::ratio("search_to_rental", "rental_count", "search_count");

    assert_eq!(resolve_primary_entity(&metric, &index).unwrap(), "search");

    let anchor = resolve_anchor(&metric, &index).unwrap();
    assert_eq!(anchor.model.name, "searches");
    assert_eq!(anchor.source, AnchorSource::InferredFromDenominator);
}

#[test]
fn test_numerator_never_drives_inference() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metric = Metric::ratio("rentals_per_search", "search_count", "rental_count");

    assert_eq!(resolve_primary_entity(&metric, &index).unwrap(), "rental");
}

#[test]
fn test_override_wins_over_inference() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metric = Metric::ratio("search_to_rental", "rental_count", "search_count")
        .with_primary_entity("rental");

    let anchor = resolve_anchor(&metric, &index).unwrap();
    assert_eq!(anchor.entity, "rental");
    assert_eq!(anchor.model.name, "rentals");
    assert_eq!(anchor.source, AnchorSource::Explicit);
}

#[test]
fn test_non_ratio_metrics_need_override() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metrics = vec![
        Metric::simple("searches_total", "search_count"),
        Metric::derived("double", "searches_total * 2", vec![MetricInput::new("searches_total")]),
        Metric::conversion(
            "search_conversion",
            ConversionParams {
                entity: "search".into(),
                base_measure: "search_count".into(),
                conversion_measure: "rental_count".into(),
                calculation: ConversionCalculation::ConversionRate,
                window: Some("7 days".into()),
            },
        ),
    ];

    for metric in &metrics {
        let err = resolve_primary_entity(metric, &index).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedPrimaryEntity);
        assert_eq!(err.metric(), metric.name);
        assert!(err.to_string().contains("primary_entity"));
    }
}

#[test]
fn test_denominator_model_without_primary_entity() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metric = Metric::ratio("odd", "search_count", "event_count");

    let err = resolve_primary_entity(&metric, &index).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedPrimaryEntity);
    assert!(err.to_string().contains("events"));
}

#[test]
fn test_unknown_denominator() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metric = Metric::ratio("broken", "search_count", "nope");

    assert_eq!(
        resolve_primary_entity(&metric, &index).unwrap_err(),
        SemanticError::UnknownMeasureReference {
            metric: "broken".into(),
            measure: "nope".into(),
        }
    );
}

#[test]
fn test_override_naming_undeclared_entity() {
    let models = marketplace();
    let index = ModelIndex::build(&models).unwrap();
    let metric = Metric::simple("ghost", "search_count").with_primary_entity("listing");

    let err = resolve_anchor(&metric, &index).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedPrimaryEntity);
}
