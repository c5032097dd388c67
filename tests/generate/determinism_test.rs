// tests/generate/determinism_test.rs
use std::path::PathBuf;

use lookgen::generate::{generate, GenerateOptions};
use lookgen::lookml::emitter::EmitConfig;
use lookgen::model::loader::load_project;
use lookgen::model::{Metric, Project};

fn marketplace() -> Project {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/marketplace");
    load_project(&fixture).unwrap()
}

#[test]
fn test_repeated_runs_are_identical() {
    let project = marketplace();
    let options = GenerateOptions::default();

    let first = generate(&project, &options).unwrap();
    let second = generate(&project, &options).unwrap();

    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    assert_eq!(
        first.render(&EmitConfig::default()),
        second.render(&EmitConfig::default())
    );
}

#[test]
fn test_input_order_does_not_matter() {
    let project = marketplace();
    let mut reversed = project.clone();
    reversed.models.reverse();
    reversed.metrics.reverse();

    let options = GenerateOptions::default();
    let a = generate(&project, &options).unwrap();
    let b = generate(&reversed, &options).unwrap();

    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
}

#[test]
fn test_field_lists_sorted_and_unique() {
    let output = generate(&marketplace(), &GenerateOptions::default()).unwrap();

    for explore in &output.explores {
        for join in &explore.joins {
            let (default_set, measures) = join.fields.split_first().unwrap();
            assert!(default_set.ends_with(".dimensions_only*"));

            let mut sorted = measures.to_vec();
            sorted.sort();
            sorted.dedup();
            assert_eq!(measures, sorted.as_slice(), "join {} in {}", join.view, explore.name);
        }
    }

    for view in &output.views {
        for measure in &view.metric_measures {
            let mut sorted = measure.required_fields.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(measure.required_fields, sorted);
        }
    }
}

#[test]
fn test_fingerprint_tracks_content() {
    let project = marketplace();
    let changed = project
        .clone()
        .with_metric(Metric::simple("extra_searches", "search_count").with_primary_entity("search"));

    let options = GenerateOptions::default();
    let a = generate(&project, &options).unwrap();
    let b = generate(&changed, &options).unwrap();

    let fingerprint = a.fingerprint().unwrap();
    assert_eq!(fingerprint.len(), 64);
    assert_ne!(fingerprint, b.fingerprint().unwrap());
}
