//! Built-in samples load through the import path and evaluate to known costs

use std::sync::Arc;

use rstest::rstest;

use dtree::application::services::TreeService;
use dtree::application::{samples, ApplicationError};
use dtree::infrastructure::traits::MemoryFileSystem;

fn service() -> TreeService {
    TreeService::new(Arc::new(MemoryFileSystem::new()))
}

#[rstest]
#[case("demo", 101.2, 17, 9.0)]
#[case("demo-2", 350.0, 10, 9.0)]
fn given_builtin_sample_when_loading_then_evaluates_to_known_cost(
    #[case] name: &str,
    #[case] expected_cost: f64,
    #[case] nodes: usize,
    #[case] max_time: f64,
) {
    let mut service = service();

    let report = service.load_builtin_sample(name).unwrap().clone();

    assert!(!report.advisory(), "{name} should be consistent");
    let cost = report.root_expected_cost.value().expect("available");
    assert!((cost - expected_cost).abs() < 1e-9, "got {cost}");
    assert_eq!(service.tree().len(), nodes);
    assert_eq!(report.max_cumulative_time, max_time);
}

#[test]
fn given_sample_loaded_twice_when_comparing_then_ids_are_fresh() {
    let mut first = service();
    let mut second = service();

    first.load_builtin_sample("demo").unwrap();
    second.load_builtin_sample("demo").unwrap();

    assert_ne!(
        first.tree().root_node().data.id,
        second.tree().root_node().data.id
    );
}

#[test]
fn given_unknown_sample_when_loading_then_error_lists_available_and_tree_unchanged() {
    let mut service = service();
    let before = service.export_string().unwrap();

    let err = service.load_builtin_sample("nope").unwrap_err();

    assert!(matches!(err, ApplicationError::UnknownSample { .. }));
    assert_eq!(err.to_string(), "unknown sample 'nope', available: demo, demo-2");
    assert_eq!(service.export_string().unwrap(), before);
}

#[test]
fn given_registry_when_listing_then_every_sample_has_a_description() {
    assert_eq!(samples::names(), vec!["demo", "demo-2"]);
    assert!(samples::all().iter().all(|s| !s.description.is_empty()));
}
