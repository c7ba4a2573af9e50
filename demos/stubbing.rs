// Examples are allowed to use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Stubwork Example
//!
//! Stubs a small user repository and drives a lookup flow through every
//! stub kind, then settles every deferred result with a single flush.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example stubbing
//!
//! # See what the engine installs and invokes
//! RUST_LOG=stubwork_core=debug cargo run --example stubbing
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use stubwork::prelude::*;
use tracing_subscriber::EnvFilter;

/// Append-only transcript shared with continuations.
#[derive(Clone, Default)]
struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    fn push(&self, line: impl Into<String>) {
        self.0.lock().push(line.into());
    }

    fn value(&self, prefix: &str, v: &Value) {
        self.push(format!("{prefix}: {v}"));
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

fn repository() -> TestObject {
    TestObject::new()
        .with_field("base_url", json!("https://users.invalid"))
        .with_method("find", |_| Ok(json!(null).into()))
        .with_method("page", |_| Ok(json!([]).into()))
        .with_method("delete", |_| Ok(json!(false).into()))
        .with_method("count", |_| Ok(json!(0).into()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_toml_str(
        r#"
        label = "demo"

        [spy]
        history_limit = 8
        "#,
    )?;
    let engine = StubEngine::from_config(config)?;
    let mut repo = repository();
    let log = Transcript::default();

    // A typo is caught before anything is installed.
    match engine.stub_returning(&mut repo, "base_url", json!("x")) {
        Err(e) => log.push(format!("rejected: {e}")),
        Ok(_) => log.push("unexpectedly stubbed a field"),
    }

    engine.stub_returning(&mut repo, "count", json!(2))?;
    engine.stub_resolving_by_param(
        &mut repo,
        "find",
        [("ada", json!({ "name": "Ada" })), ("alan", json!({ "name": "Alan" }))],
    )?;
    let pages = engine.stub_resolving_by_call_index(
        &mut repo,
        "page",
        [json!(["ada"]), json!(["alan"])],
    )?;
    engine.stub_rejecting(&mut repo, "delete", json!({ "status": 403 }))?;

    let repo = Arc::new(repo);

    let count = repo.call("count", &[])?.into_value().unwrap_or_default();
    log.value("count", &count);

    // Each page continuation looks up the names it received and asks for
    // the next page; one flush settles the whole walk.
    let first_page = repo.call("page", &[])?.into_promise().expect("page is deferred");
    let walker = Arc::clone(&repo);
    let walk_log = log.clone();
    first_page.and_then(move |ids| {
        walk_log.value("page 1", &ids);
        for id in ids.as_array().into_iter().flatten() {
            if let Ok(found) = walker.call("find", &[id.clone()]) {
                let found_log = walk_log.clone();
                if let Some(p) = found.into_promise() {
                    p.and_then(move |user| found_log.value("found", &user));
                }
            }
        }
        if let Some(next) = walker.call("page", &[]).ok().and_then(Returned::into_promise) {
            let next_log = walk_log.clone();
            next.and_then(move |ids| next_log.value("page 2", &ids));
        }
    });

    match repo.call("find", &[json!("grace")]) {
        Err(e) => log.push(format!("lookup failed: {e}")),
        Ok(_) => log.push("unexpected lookup result"),
    }

    let delete_log = log.clone();
    repo.call("delete", &[json!("ada")])?
        .into_promise()
        .expect("delete is deferred")
        .catch(move |e| delete_log.value("delete rejected", &e));

    let ran = engine.flush_pending();
    tracing::info!(continuations = ran, "flushed");

    for line in log.take() {
        println!("{line}");
    }
    println!("page stub invoked {} times", pages.invocations().unwrap_or(0));
    println!(
        "find called {} times, last with {:?}",
        engine.call_count(repo.as_ref(), "find"),
        engine.most_recent_args(repo.as_ref(), "find")
    );
    println!("snapshot: {:?}", clone_object(&json!({ "count": count })));

    Ok(())
}
