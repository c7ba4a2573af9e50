// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # stubwork-deferred
//!
//! Deferred results for test doubles, settled synchronously and observed
//! only when the test flushes.
//!
//! This crate provides:
//! - [`Deferred`] / [`Promise`]: one-way settlement with chained continuations
//! - [`DeferredFactory`]: the seam the stub engine creates deferreds through
//! - [`DigestScheduler`]: the default factory, draining its queue to quiescence
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use stubwork_deferred::{DeferredFactory, DigestScheduler, PromiseState};
//!
//! let scheduler = DigestScheduler::new();
//! let deferred = scheduler.create();
//! let doubled = deferred.promise().and_then(|v| json!(v.as_i64().unwrap_or(0) * 2));
//!
//! deferred.resolve(json!(21));
//! assert!(doubled.is_pending());
//!
//! scheduler.drain_all();
//! assert_eq!(doubled.state(), PromiseState::Fulfilled(json!(42)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod promise;
pub mod scheduler;

pub use promise::{Deferred, Outcome, Promise, PromiseState, Settlement};
pub use scheduler::{DeferredFactory, DigestScheduler, Task, TaskQueue};
