// tests/generate/scenarios_test.rs
use std::path::PathBuf;

use lookgen::generate::{generate, GenerateOptions, GenerateOutput};
use lookgen::lookml::emitter::{emit_explores, emit_view, EmitConfig};
use lookgen::lookml::ViewNaming;
use lookgen::model::loader::load_project;
use lookgen::model::{AggregationType, Entity, Measure, Metric, MetricInput, Project, SemanticModel};
use lookgen::semantic::{Cardinality, SemanticError};

fn search_and_rental() -> Project {
    Project::new()
        .with_model(
            SemanticModel::new("search")
                .with_entity(Entity::primary("search"))
                .with_measure(Measure::new("search_count", AggregationType::Count)),
        )
        .with_model(
            SemanticModel::new("rental")
                .with_entity(Entity::primary("rental"))
                .with_entity(Entity::foreign("search"))
                .with_measure(Measure::new("rental_count", AggregationType::Count))
                .with_measure(Measure::new("rental_revenue", AggregationType::Sum)),
        )
        .with_model(
            SemanticModel::new("click")
                .with_entity(Entity::primary("click"))
                .with_entity(Entity::foreign("search"))
                .with_measure(Measure::new("click_count", AggregationType::Count)),
        )
}

fn join_fields<'o>(output: &'o GenerateOutput, explore: &str, view: &str) -> Vec<&'o str> {
    output
        .explore(explore)
        .and_then(|e| e.join(view))
        .map(|j| j.fields.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn no_header() -> EmitConfig {
    EmitConfig {
        include_header: false,
        ..EmitConfig::default()
    }
}

#[test]
fn test_ratio_resolves_to_denominator_and_exposes_numerator() {
    let project =
        search_and_rental().with_metric(Metric::ratio("search_to_rental", "rental_count", "search_count"));
    let output = generate(&project, &GenerateOptions::default()).unwrap();

    let anchor = output.anchor("search_to_rental").unwrap();
    assert_eq!(anchor.entity, "search");
    assert_eq!(anchor.model, "search");

    let join = output.explore("search").unwrap().join("rental").unwrap();
    assert_eq!(join.relationship, Cardinality::OneToMany);
    assert_eq!(join.sql_on, "${search.search} = ${rental.search}");
    assert_eq!(
        join_fields(&output, "search", "rental"),
        vec!["rental.dimensions_only*", "rental.rental_count"]
    );

    let measure = &output.view("search").unwrap().metric_measures[0];
    assert_eq!(measure.measure_type, "number");
    assert_eq!(
        measure.sql,
        "1.0 * ${rental.rental_count} / NULLIF(${search_count}, 0)"
    );
    assert_eq!(measure.required_fields, vec!["rental.rental_count"]);
}

#[test]
fn test_unreachable_measure_names_both_models() {
    let project = Project::new()
        .with_model(
            SemanticModel::new("user")
                .with_entity(Entity::primary("user"))
                .with_measure(Measure::new("user_count", AggregationType::Count)),
        )
        .with_model(
            SemanticModel::new("isolated")
                .with_entity(Entity::primary("isolated"))
                .with_measure(Measure::new("isolated_count", AggregationType::Count)),
        )
        .with_metric(Metric::simple("isolated_total", "isolated_count").with_primary_entity("user"));
    let output = generate(&project, &GenerateOptions::default()).unwrap();

    assert_eq!(
        output.diagnostics,
        vec![SemanticError::UnreachableMeasure {
            metric: "isolated_total".into(),
            measure: "isolated_count".into(),
            model: "isolated".into(),
            anchor_model: "user".into(),
        }]
    );
    assert!(output.view("user").unwrap().metric_measures.is_empty());
}

#[test]
fn test_derived_metric_exposes_measures_on_two_joins() {
    let project = search_and_rental()
        .with_metric(Metric::ratio("revenue_per_rental", "rental_revenue", "rental_count"))
        .with_metric(Metric::simple("clicks", "click_count").with_primary_entity("click"))
        .with_metric(
            Metric::derived(
                "click_value",
                "revenue_per_rental * clicks",
                vec![
                    MetricInput::new("revenue_per_rental"),
                    MetricInput::new("clicks"),
                ],
            )
            .with_primary_entity("search"),
        );
    let output = generate(&project, &GenerateOptions::default()).unwrap();
    assert!(output.diagnostics.is_empty());

    assert_eq!(
        join_fields(&output, "search", "rental"),
        vec![
            "rental.dimensions_only*",
            "rental.rental_count",
            "rental.rental_revenue"
        ]
    );
    assert_eq!(
        join_fields(&output, "search", "click"),
        vec!["click.dimensions_only*", "click.click_count"]
    );

    let measure = &output.view("search").unwrap().metric_measures[0];
    assert_eq!(
        measure.sql,
        "(1.0 * ${rental.rental_revenue} / NULLIF(${rental.rental_count}, 0)) * ${click.click_count}"
    );
    assert_eq!(
        measure.required_fields,
        vec!["click.click_count", "rental.rental_count", "rental.rental_revenue"]
    );

    // Anchored on `rental`, so nothing is exposed cross-view.
    let local = &output.view("rental").unwrap().metric_measures[0];
    assert!(local.required_fields.is_empty());
    assert_eq!(join_fields(&output, "rental", "search"), vec!["search.dimensions_only*"]);
}

#[test]
fn test_shared_measure_appears_once() {
    let project = search_and_rental()
        .with_metric(Metric::ratio("search_to_rental", "rental_count", "search_count"))
        .with_metric(
            Metric::ratio("rentals_per_click", "rental_count", "click_count")
                .with_primary_entity("search"),
        );
    let output = generate(&project, &GenerateOptions::default()).unwrap();

    assert_eq!(
        join_fields(&output, "search", "rental"),
        vec!["rental.dimensions_only*", "rental.rental_count"]
    );
}

#[test]
fn test_base_model_never_joins_itself() {
    let project = search_and_rental()
        .with_metric(Metric::ratio("search_to_rental", "rental_count", "search_count"));
    let output = generate(&project, &GenerateOptions::default()).unwrap();

    for explore in &output.explores {
        assert!(explore.join(&explore.base_view).is_none());
    }
    let measure = &output.view("search").unwrap().metric_measures[0];
    assert!(!measure.required_fields.iter().any(|f| f.starts_with("search.")));
}

#[test]
fn test_prefixes_and_schema() {
    let project = search_and_rental()
        .with_metric(Metric::ratio("search_to_rental", "rental_count", "search_count"));
    let options = GenerateOptions::default()
        .with_naming(ViewNaming::new("dbt_", "x_"))
        .with_schema("analytics");
    let output = generate(&project, &options).unwrap();

    let explore = output.explore("x_search").unwrap();
    assert_eq!(explore.base_view, "dbt_search");
    let join = explore.join("dbt_rental").unwrap();
    assert_eq!(join.sql_on, "${dbt_search.search} = ${dbt_rental.search}");
    assert_eq!(
        join.fields,
        vec!["dbt_rental.dimensions_only*", "dbt_rental.rental_count"]
    );

    let rendered = emit_explores(&output.explores, &no_header());
    assert!(rendered.contains("explore: x_search {\n  view_name: dbt_search\n"));
    assert!(!rendered.contains("from:"));
}

#[test]
fn test_marketplace_fixture_renders() {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/marketplace");
    let project = load_project(&fixture).unwrap();
    let output = generate(&project, &GenerateOptions::default()).unwrap();
    assert!(output.diagnostics.is_empty());

    insta::assert_snapshot!(emit_view(output.view("searches").unwrap(), &no_header()), @r#"
view: searches {
  sql_table_name: fct_searches ;;
  description: "One row per search"

  dimension: search {
    primary_key: yes
    hidden: yes
    sql: ${TABLE}.search_id ;;
  }

  dimension: device {
    type: string
    sql: ${TABLE}.device ;;
  }

  dimension_group: searched_at {
    type: time
    timeframes: [date, week, month, quarter, year]
    sql: ${TABLE}.searched_at ;;
  }

  measure: search_count {
    type: count
  }

  measure: engagement {
    type: number
    label: "Engagement"
    description: "Rentals plus clicks per search"
    sql: ${rentals.rental_count} + ${clicks.click_count} ;;
    required_fields: [clicks.click_count, rentals.rental_count]
    value_format_name: decimal_0
  }

  measure: rentals_per_click {
    type: number
    label: "Rentals Per Click"
    sql: 1.0 * ${rentals.rental_count} / NULLIF(${clicks.click_count}, 0) ;;
    required_fields: [clicks.click_count, rentals.rental_count]
    value_format_name: percent_2
  }

  measure: search_conversion {
    type: number
    label: "Search Conversion"
    sql: 1.0 * ${rentals.rental_count} / NULLIF(${search_count}, 0) ;;
    required_fields: [rentals.rental_count]
    value_format_name: percent_2
  }

  measure: search_to_rental {
    type: number
    label: "Search to rental"
    sql: 1.0 * ${rentals.rental_count} / NULLIF(${search_count}, 0) ;;
    required_fields: [rentals.rental_count]
    value_format_name: percent_2
  }

  set: dimensions_only {
    fields: [device, search, searched_at_date, searched_at_month, searched_at_quarter, searched_at_week, searched_at_year]
  }
}
"#);

    insta::assert_snapshot!(emit_explores(&output.explores, &no_header()), @r#"
include: "*.view.lkml"

explore: clicks {
  label: "Clicks"

  join: searches {
    type: left_outer
    relationship: many_to_one
    sql_on: ${clicks.search} = ${searches.search} ;;
    fields: [searches.dimensions_only*]
  }

  join: rentals {
    type: left_outer
    relationship: one_to_many
    sql_on: ${searches.search} = ${rentals.search} ;;
    fields: [rentals.dimensions_only*]
  }
}

explore: rentals {
  label: "Rentals"

  join: searches {
    type: left_outer
    relationship: many_to_one
    sql_on: ${rentals.search} = ${searches.search} ;;
    fields: [searches.dimensions_only*]
  }

  join: clicks {
    type: left_outer
    relationship: one_to_many
    sql_on: ${searches.search} = ${clicks.search} ;;
    fields: [clicks.dimensions_only*]
  }
}

explore: searches {
  label: "Searches"

  join: clicks {
    type: left_outer
    relationship: one_to_many
    sql_on: ${searches.search} = ${clicks.search} ;;
    fields: [clicks.dimensions_only*, clicks.click_count]
  }

  join: rentals {
    type: left_outer
    relationship: one_to_many
    sql_on: ${searches.search} = ${rentals.search} ;;
    fields: [rentals.dimensions_only*, rentals.rental_count]
  }
}
"#);
}
