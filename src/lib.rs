//! Stubwork: method stubs with deferred results for deterministic tests.
//!
//! Part of the PAIML Sovereign AI Stack.
//!
//! # Quick Start
//!
//! ```rust
//! use stubwork::prelude::*;
//!
//! let engine = StubEngine::new();
//! let mut orders = TestObject::new().with_method("load", |_| Ok(json!(null).into()));
//! engine.stub_resolving(&mut orders, "load", json!([1, 2, 3])).unwrap();
//!
//! let promise = orders.call("load", &[]).unwrap().into_promise().unwrap();
//! let count = promise.and_then(|v| json!(v.as_array().map_or(0, Vec::len)));
//!
//! engine.flush_pending();
//! assert_eq!(count.state(), PromiseState::Fulfilled(json!(3)));
//! ```

pub use stubwork_core as core;
pub use stubwork_deferred as deferred;

/// Installs a `tracing` subscriber for test output.
///
/// Honours `RUST_LOG` and writes through the test harness's capture. Safe
/// to call from every test; only the first call installs anything. Returns
/// false if a subscriber was already set.
pub fn init_test_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .is_ok()
}

/// Prelude module for common imports.
pub mod prelude {
    pub use serde_json::{Value, json};
    pub use stubwork_core::{
        DoubleProvider, EngineConfig, Returned, SpyRegistry, StubDescriptor, StubEngine,
        StubError, StubHandle, StubKind, Target, TestObject, clone_object, is_valid_method,
    };
    pub use stubwork_deferred::{
        Deferred, DeferredFactory, DigestScheduler, Outcome, Promise, PromiseState,
    };
}
