//! Shared fixtures.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use stubwork_core::TestObject;

/// A service with two real methods and one plain field.
pub fn user_service() -> TestObject {
    TestObject::new()
        .with_field("endpoint", json!("https://users.invalid"))
        .with_method("fetch", |_| Ok(json!("real fetch").into()))
        .with_method("save", |args| Ok(args.first().cloned().unwrap_or(Value::Null).into()))
}

/// Collects values handed to continuations.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> impl FnOnce(Value) + Send + 'static {
        let seen = Arc::clone(&self.seen);
        move |v| seen.lock().push(v)
    }

    pub fn values(&self) -> Vec<Value> {
        self.seen.lock().clone()
    }
}
