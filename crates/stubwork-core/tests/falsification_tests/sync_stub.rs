//! Falsification Tests: Category B - Synchronous Stubs (F011-F020)

use serde_json::json;
use stubwork_core::{DoubleProvider, SpyConfig, SpyRegistry, StubEngine, StubKind};

use super::support::user_service;

/// F011: A returning stub always returns its value
#[test]
fn f011_returning_stub_is_constant() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_returning(&mut service, "fetch", json!("X")).unwrap();

    for i in 0..5 {
        let out = service.call("fetch", &[json!(i)]).unwrap();
        assert_eq!(
            out.into_value(),
            Some(json!("X")),
            "F011 FALSIFIED: call {i} returned something else"
        );
    }
}

/// F012: Every call is recorded
#[test]
fn f012_calls_are_recorded() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_returning(&mut service, "fetch", json!("X")).unwrap();

    assert!(!engine.was_called(&service, "fetch"));
    service.call("fetch", &[json!("a")]).unwrap();
    service.call("fetch", &[json!("b"), json!(2)]).unwrap();

    assert!(engine.was_called(&service, "fetch"));
    assert_eq!(engine.call_count(&service, "fetch"), 2);
    assert_eq!(engine.call_args(&service, "fetch", 0), Some(vec![json!("a")]));
    assert_eq!(
        engine.most_recent_args(&service, "fetch"),
        Some(vec![json!("b"), json!(2)])
    );
}

/// F013: Stubbing one method leaves the others real
#[test]
fn f013_other_methods_untouched() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_returning(&mut service, "fetch", json!("X")).unwrap();

    let out = service.call("save", &[json!("payload")]).unwrap();
    assert_eq!(out.into_value(), Some(json!("payload")));
    assert!(!engine.was_called(&service, "save"));
}

/// F014: Re-stubbing replaces prior behavior entirely
#[test]
fn f014_restub_replaces_behavior() {
    let engine = StubEngine::new();
    let mut service = user_service();

    engine.stub_returning(&mut service, "fetch", json!("old")).unwrap();
    let handle = engine.stub_returning(&mut service, "fetch", json!("new")).unwrap();

    for _ in 0..3 {
        let out = service.call("fetch", &[]).unwrap().into_value();
        assert_eq!(out, Some(json!("new")), "F014 FALSIFIED: old behavior observed");
    }
    assert_eq!(handle.kind(), StubKind::FixedValue);
}

/// F015: Re-stubbing from async back to sync drops the promise behavior
#[test]
fn f015_restub_across_kinds() {
    let engine = StubEngine::new();
    let mut service = user_service();

    engine.stub_rejecting(&mut service, "fetch", json!("ERR")).unwrap();
    engine.stub_returning(&mut service, "fetch", json!("plain")).unwrap();

    let out = service.call("fetch", &[]).unwrap();
    assert!(!out.is_promise(), "F015 FALSIFIED: rejecting stub still active");
}

/// F016: An injected double provider receives the installation
#[test]
fn f016_injected_provider_records() {
    let spies = std::sync::Arc::new(SpyRegistry::with_config(SpyConfig {
        record_args: true,
        history_limit: 1,
    }));
    let engine = StubEngine::builder()
        .with_double_provider(spies.clone())
        .build();
    let mut service = user_service();

    engine.stub_returning(&mut service, "fetch", json!("X")).unwrap();
    service.call("fetch", &[json!(1)]).unwrap();
    service.call("fetch", &[json!(2)]).unwrap();

    assert_eq!(spies.call_count(&service, "fetch"), 2);
    assert_eq!(spies.call_args(&service, "fetch", 0), None);
    assert_eq!(spies.call_args(&service, "fetch", 1), Some(vec![json!(2)]));
}
