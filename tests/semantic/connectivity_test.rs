// tests/semantic/connectivity_test.rs
use lookgen::generate::{generate, GenerateOptions, GenerationMode};
use lookgen::model::{AggregationType, Entity, Measure, Metric, MetricInput, Project, SemanticModel};
use lookgen::semantic::{
    extract_measures, resolve_anchor, validate_connectivity, ErrorKind, JoinGraph,
    MetricCatalog, ModelIndex, SemanticError,
};

fn project() -> Project {
    Project::new()
        .with_model(
            SemanticModel::new("users")
                .with_entity(Entity::primary("user"))
                .with_measure(Measure::new("user_count", AggregationType::Count)),
        )
        .with_model(
            SemanticModel::new("orders")
                .with_entity(Entity::primary("order"))
                .with_entity(Entity::foreign("user"))
                .with_measure(Measure::new("order_count", AggregationType::Count))
                .with_measure(Measure::new("order_revenue", AggregationType::Sum)),
        )
        .with_model(
            SemanticModel::new("isolated")
                .with_entity(Entity::primary("island"))
                .with_measure(Measure::new("isolated_count", AggregationType::Count)),
        )
        .with_metric(Metric::ratio("orders_per_user", "order_count", "user_count"))
        .with_metric(Metric::simple("revenue", "order_revenue").with_primary_entity("order"))
        .with_metric(
            Metric::simple("isolated_total", "isolated_count").with_primary_entity("user"),
        )
        .with_metric(
            Metric::derived(
                "revenue_per_user",
                "revenue / users",
                vec![MetricInput::new("revenue"), MetricInput::new("users")],
            )
            .with_primary_entity("user"),
        )
        .with_metric(Metric::simple("users", "user_count").with_primary_entity("user"))
        .with_metric(
            Metric::derived("loop_a", "loop_b + 1", vec![MetricInput::new("loop_b")])
                .with_primary_entity("user"),
        )
        .with_metric(
            Metric::derived("loop_b", "loop_a + 1", vec![MetricInput::new("loop_a")])
                .with_primary_entity("user"),
        )
        .with_metric(
            Metric::derived("dangling", "nothing * 2", vec![MetricInput::new("nothing")])
                .with_primary_entity("user"),
        )
}

#[test]
fn test_every_validated_metric_is_reachable() {
    let project = project();
    let index = ModelIndex::build(&project.models).unwrap();
    let catalog = MetricCatalog::new(&project.metrics);

    let mut validated = 0;
    for metric in &project.metrics {
        let Ok(anchor) = resolve_anchor(metric, &index) else {
            continue;
        };
        let Ok(measures) = extract_measures(metric, &catalog) else {
            continue;
        };
        let graph = JoinGraph::build(&anchor.model.name, &index, None);
        if validate_connectivity(metric, &measures, anchor.model, &graph, &index).is_err() {
            continue;
        }

        validated += 1;
        for measure in &measures {
            let owner = index.model_for_measure(measure).unwrap();
            assert!(
                owner.name == anchor.model.name || graph.contains(&owner.name),
                "{} reads {} from unreachable {}",
                metric.name,
                measure,
                owner.name
            );
        }
    }
    assert_eq!(validated, 4);
}

#[test]
fn test_derived_dependencies_flatten_to_measures() {
    let project = project();
    let catalog = MetricCatalog::new(&project.metrics);
    let metric = project.metric("revenue_per_user").unwrap();

    let measures: Vec<String> = extract_measures(metric, &catalog).unwrap().into_iter().collect();
    assert_eq!(measures, vec!["order_revenue", "user_count"]);
}

#[test]
fn test_cycle_detected() {
    let project = project();
    let catalog = MetricCatalog::new(&project.metrics);
    let metric = project.metric("loop_a").unwrap();

    let err = extract_measures(metric, &catalog).unwrap_err();
    assert_eq!(
        err,
        SemanticError::CircularMetricReference {
            metric: "loop_a".into(),
            cycle: vec!["loop_a".into(), "loop_b".into(), "loop_a".into()],
        }
    );
}

#[test]
fn test_lenient_run_reports_every_violation() {
    let output = generate(&project(), &GenerateOptions::default()).unwrap();

    let mut failures: Vec<(&str, ErrorKind)> = output
        .diagnostics
        .iter()
        .map(|e| (e.metric(), e.kind()))
        .collect();
    failures.sort();
    assert_eq!(
        failures,
        vec![
            ("dangling", ErrorKind::UnknownMetricReference),
            ("isolated_total", ErrorKind::UnreachableMeasure),
            ("loop_a", ErrorKind::CircularMetricReference),
            ("loop_b", ErrorKind::CircularMetricReference),
        ]
    );

    let users = output.view("users").unwrap();
    let generated: Vec<&str> = users.metric_measures.iter().map(|m| m.metric.as_str()).collect();
    assert_eq!(generated, vec!["orders_per_user", "revenue_per_user", "users"]);
}

#[test]
fn test_strict_run_stops_at_first_violation() {
    let options = GenerateOptions::default().with_mode(GenerationMode::Strict);
    let err = generate(&project(), &options).unwrap_err();
    assert!(err.to_string().contains("dangling"));
}

#[test]
fn test_unreachable_error_names_both_models() {
    let output = generate(&project(), &GenerateOptions::default()).unwrap();
    let err = output
        .diagnostics
        .iter()
        .find(|e| e.kind() == ErrorKind::UnreachableMeasure)
        .unwrap();

    assert_eq!(err.models(), vec!["isolated", "users"]);
    let message = err.to_string();
    assert!(message.contains("primary entity"));
    assert!(message.contains("foreign entity"));
}
