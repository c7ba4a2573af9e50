//! Falsification Tests: Category C - Deferred Stubs (F021-F040)
//!
//! # Toyota Way: Jidoka (自働化)
//! A bad parameter key stops the call that used it, not some later
//! continuation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use stubwork_core::{PromiseState, StubEngine, StubError, StubKind};

use super::support::{Recorder, user_service};

/// F021: A resolving stub's continuation waits for the flush
#[test]
fn f021_resolving_waits_for_flush() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_resolving(&mut service, "fetch", json!("X")).unwrap();

    let recorder = Recorder::new();
    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
    promise.and_then(recorder.sink());

    assert!(
        recorder.values().is_empty(),
        "F021 FALSIFIED: continuation ran before flush"
    );
    engine.flush_pending();
    assert_eq!(recorder.values(), vec![json!("X")]);
}

/// F022: The continuation runs exactly once, however often we flush
#[test]
fn f022_continuation_runs_once() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_resolving(&mut service, "fetch", json!("X")).unwrap();

    let recorder = Recorder::new();
    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
    promise.and_then(recorder.sink());

    engine.flush_pending();
    engine.flush_pending();
    assert_eq!(
        recorder.values().len(),
        1,
        "F022 FALSIFIED: continuation ran more than once"
    );
}

/// F023: Each invocation gets a fresh promise
#[test]
fn f023_fresh_promise_per_call() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_resolving(&mut service, "fetch", json!("X")).unwrap();

    let recorder = Recorder::new();
    for _ in 0..3 {
        let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
        promise.and_then(recorder.sink());
    }

    engine.flush_pending();
    assert_eq!(recorder.values(), vec![json!("X"); 3]);
    assert_eq!(engine.call_count(&service, "fetch"), 3);
}

/// F024: Parameter-keyed stubs resolve by key
#[test]
fn f024_by_param_resolves_by_key() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine
        .stub_resolving_by_param(
            &mut service,
            "fetch",
            [("k1", json!("v1")), ("k2", json!("v2"))],
        )
        .unwrap();

    let recorder = Recorder::new();
    for key in ["k2", "k1"] {
        let promise = service.call("fetch", &[json!(key)]).unwrap().into_promise().unwrap();
        promise.and_then(recorder.sink());
    }

    engine.flush_pending();
    assert_eq!(recorder.values(), vec![json!("v2"), json!("v1")]);
}

/// F025: An unknown key fails synchronously, not through the promise
///
/// # Falsification Attempt
/// Invoke with a key missing from the table and look for a promise.
#[test]
fn f025_unknown_key_fails_synchronously() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine
        .stub_resolving_by_param(&mut service, "fetch", [("k1", json!("v1"))])
        .unwrap();

    let result = service.call("fetch", &[json!("unknown")]);
    let err = result.expect_err("F025 FALSIFIED: unknown key produced a result");

    assert_eq!(err, StubError::invalid_param_key("unknown"));
    assert_eq!(
        err.to_string(),
        "The key unknown is not valid for the params specified"
    );
    assert_eq!(
        engine.pending_continuations(),
        0,
        "F025 FALSIFIED: failing call scheduled work"
    );
    assert!(engine.was_called(&service, "fetch"));
}

/// F026: The stub stays usable after a bad key
#[test]
fn f026_stub_survives_bad_key() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine
        .stub_resolving_by_param(&mut service, "fetch", [("k1", json!("v1"))])
        .unwrap();

    assert!(service.call("fetch", &[json!("nope")]).is_err());
    let promise = service.call("fetch", &[json!("k1")]).unwrap().into_promise().unwrap();

    assert_eq!(promise.state(), PromiseState::Fulfilled(json!("v1")));
}

/// F027: Falsy table entries are entries
#[test]
fn f027_falsy_entries_resolve() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine
        .stub_resolving_by_param(
            &mut service,
            "fetch",
            [("zero", json!(0)), ("no", json!(false)), ("none", Value::Null)],
        )
        .unwrap();

    for (key, expected) in [("zero", json!(0)), ("no", json!(false)), ("none", Value::Null)] {
        let promise = service.call("fetch", &[json!(key)]).unwrap().into_promise().unwrap();
        assert_eq!(promise.state(), PromiseState::Fulfilled(expected));
    }
}

/// F028: A table can come straight from a JSON object
#[test]
fn f028_table_from_json_object() {
    let engine = StubEngine::new();
    let mut service = user_service();
    let table = json!({ "alice": { "id": 1 }, "bob": { "id": 2 } });

    engine
        .stub_resolving_by_param(
            &mut service,
            "fetch",
            table.as_object().cloned().unwrap_or_default(),
        )
        .unwrap();

    let promise = service.call("fetch", &[json!("bob")]).unwrap().into_promise().unwrap();
    assert_eq!(promise.state(), PromiseState::Fulfilled(json!({ "id": 2 })));
}

/// F029: Call-index stubs walk their sequence
#[test]
fn f029_call_index_walks_sequence() {
    let engine = StubEngine::new();
    let mut service = user_service();
    let handle = engine
        .stub_resolving_by_call_index(&mut service, "fetch", [json!("v1"), json!("v2")])
        .unwrap();
    assert_eq!(handle.kind(), StubKind::ResolvingByCallIndex);
    assert_eq!(handle.invocations(), Some(0));

    let recorder = Recorder::new();
    for expected_count in 1..=2 {
        let promise = service.call("fetch", &[json!("ignored")]).unwrap().into_promise().unwrap();
        promise.and_then(recorder.sink());
        assert_eq!(
            handle.invocations(),
            Some(expected_count),
            "F029 FALSIFIED: counter did not advance by one"
        );
    }

    engine.flush_pending();
    assert_eq!(recorder.values(), vec![json!("v1"), json!("v2")]);
}

/// F030: Call-index counters are private to each stub
#[test]
fn f030_counters_not_shared() {
    let engine = StubEngine::new();
    let mut first = user_service();
    let mut second = user_service();

    let a = engine
        .stub_resolving_by_call_index(&mut first, "fetch", [json!(1), json!(2)])
        .unwrap();
    let b = engine
        .stub_resolving_by_call_index(&mut second, "fetch", [json!(1), json!(2)])
        .unwrap();

    first.call("fetch", &[]).unwrap();
    first.call("fetch", &[]).unwrap();

    assert_eq!(a.invocations(), Some(2));
    assert_eq!(b.invocations(), Some(0), "F030 FALSIFIED: counter shared");

    let promise = second.call("fetch", &[]).unwrap().into_promise().unwrap();
    assert_eq!(promise.state(), PromiseState::Fulfilled(json!(1)));
}

/// F031: Calls past the end of the sequence resolve with null
#[test]
fn f031_call_index_overflow_is_null() {
    let engine = StubEngine::new();
    let mut service = user_service();
    let handle = engine
        .stub_resolving_by_call_index(&mut service, "fetch", [json!("only")])
        .unwrap();

    service.call("fetch", &[]).unwrap();
    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();

    assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Null));
    assert_eq!(handle.invocations(), Some(2), "F031 FALSIFIED: counter stalled");
}

/// F032: Re-stubbing a call-index stub starts a new counter
#[test]
fn f032_restub_resets_sequence() {
    let engine = StubEngine::new();
    let mut service = user_service();

    engine
        .stub_resolving_by_call_index(&mut service, "fetch", [json!("a"), json!("b")])
        .unwrap();
    service.call("fetch", &[]).unwrap();
    let fresh = engine
        .stub_resolving_by_call_index(&mut service, "fetch", [json!("c")])
        .unwrap();

    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
    assert_eq!(promise.state(), PromiseState::Fulfilled(json!("c")));
    assert_eq!(fresh.invocations(), Some(1));
}

/// F033: Rejecting stubs reach the error continuation only
#[test]
fn f033_rejecting_reaches_error_handler() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_rejecting(&mut service, "fetch", json!("ERR")).unwrap();

    let successes = Arc::new(AtomicUsize::new(0));
    let errors = Recorder::new();
    let ok = Arc::clone(&successes);
    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
    promise.then(
        move |_| {
            ok.fetch_add(1, Ordering::SeqCst);
        },
        errors.sink(),
    );

    assert!(errors.values().is_empty());
    engine.flush_pending();

    assert_eq!(errors.values(), vec![json!("ERR")]);
    assert_eq!(
        successes.load(Ordering::SeqCst),
        0,
        "F033 FALSIFIED: rejection reached success handler"
    );
}

/// F034: Rejection payloads are opaque
#[test]
fn f034_rejection_payload_passes_through() {
    let engine = StubEngine::new();
    let mut service = user_service();
    let payload = json!({ "status": 503, "retry": true });
    engine.stub_rejecting(&mut service, "fetch", payload.clone()).unwrap();

    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
    assert_eq!(promise.state(), PromiseState::Rejected(payload));
}

/// F035: Settlement is visible before the flush, continuations are not
#[test]
fn f035_state_visible_before_flush() {
    let engine = StubEngine::new();
    let mut service = user_service();
    engine.stub_resolving(&mut service, "fetch", json!(5)).unwrap();

    let promise = service.call("fetch", &[]).unwrap().into_promise().unwrap();
    let derived = promise.and_then(|v| json!(v.as_i64().unwrap_or(0) + 1));

    assert_eq!(promise.state(), PromiseState::Fulfilled(json!(5)));
    assert!(derived.is_pending(), "F035 FALSIFIED: derived settled early");

    engine.flush_pending();
    assert_eq!(derived.state(), PromiseState::Fulfilled(json!(6)));
}
