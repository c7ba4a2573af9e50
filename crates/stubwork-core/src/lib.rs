// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # stubwork-core
//!
//! Stub engine for replacing methods on test targets with controllable
//! stand-ins.
//!
//! This crate provides:
//!
//! - [`StubEngine`]: validates targets and installs stubs that return fixed
//!   values or deferred results, and flushes those results on demand
//! - [`StubDescriptor`]: the five stub behaviors, each owning its own state
//! - [`Target`] / [`TestObject`]: the reflection surface stubs are installed on
//! - [`DoubleProvider`] / [`SpyRegistry`]: installation and call recording
//! - [`clone_object`]: deep copies of JSON fixtures
//!
//! ## Iron Lotus Framework
//!
//! - **Poka-Yoke**: invalid methods are rejected before anything is installed
//! - **Jidoka**: a bad parameter key stops the offending call immediately
//! - **Heijunka**: continuations run only when the test flushes, in order
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use stubwork_core::{PromiseState, StubEngine, TestObject};
//!
//! let engine = StubEngine::new();
//! let mut users = TestObject::new().with_method("find", |_| Ok(json!(null).into()));
//!
//! engine
//!     .stub_resolving_by_param(&mut users, "find", [("42", json!({ "name": "Ada" }))])
//!     .unwrap();
//!
//! let promise = users.call("find", &[json!("42")]).unwrap().into_promise().unwrap();
//! let name = promise.and_then(|user| user["name"].clone());
//!
//! engine.flush_pending();
//! assert_eq!(name.state(), PromiseState::Fulfilled(json!("Ada")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clone;
pub mod config;
pub mod descriptor;
pub mod double;
pub mod engine;
pub mod error;
pub mod target;
pub mod value;

pub use clone::{CloneError, clone_object, clone_serializable};
pub use config::{ConfigError, EngineConfig, SpyConfig};
pub use descriptor::{CallIndexSequence, StubDescriptor, StubKind};
pub use double::{DoubleProvider, SpyRegistry};
pub use engine::{StubEngine, StubEngineBuilder, StubHandle};
pub use error::{Result, StubError};
pub use target::{Member, MethodFn, Returned, Target, TargetId, TestObject, is_valid_method};
pub use value::{is_truthy, param_key};

pub use stubwork_deferred::{Promise, PromiseState};
