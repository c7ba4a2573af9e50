//! Stub descriptors: what an installed replacement does when invoked.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stubwork_deferred::{DeferredFactory, Settlement};

use crate::error::{Result, StubError};
use crate::target::Returned;
use crate::value::param_key;

/// Discriminant of a [`StubDescriptor`], for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StubKind {
    /// Returns a value synchronously.
    FixedValue,
    /// Resolves a fresh promise with a fixed value.
    ResolvingValue,
    /// Resolves with the table entry for the first argument.
    ResolvingByParam,
    /// Resolves with successive sequence entries.
    ResolvingByCallIndex,
    /// Rejects a fresh promise with a fixed payload.
    RejectingValue,
}

impl std::fmt::Display for StubKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FixedValue => "fixed-value",
            Self::ResolvingValue => "resolving-value",
            Self::ResolvingByParam => "resolving-by-param",
            Self::ResolvingByCallIndex => "resolving-by-call-index",
            Self::RejectingValue => "rejecting-value",
        };
        f.write_str(name)
    }
}

/// Ordered results for a call-index stub, with its own invocation counter.
///
/// The counter starts at zero, advances once per invocation and never
/// resets. It belongs to exactly one descriptor.
#[derive(Debug, Default)]
pub struct CallIndexSequence {
    values: Vec<Value>,
    next: AtomicUsize,
}

impl CallIndexSequence {
    /// Creates a sequence with the counter at zero.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            next: AtomicUsize::new(0),
        }
    }

    /// Returns how many times the sequence has been advanced.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }

    /// Returns the configured values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value for the current invocation and advances the counter.
    ///
    /// Past the end of the sequence this yields `null`.
    fn advance(&self) -> Value {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        if let Some(value) = self.values.get(index) {
            return value.clone();
        }
        tracing::warn!(
            index = index,
            len = self.values.len(),
            "call index past end of sequence, resolving with null"
        );
        Value::Null
    }
}

/// Behavior of an installed stub.
#[derive(Debug)]
pub enum StubDescriptor {
    /// Return the value synchronously on every call.
    FixedValue(Value),
    /// Return a promise already resolved with the value.
    ResolvingValue(Value),
    /// Return a promise resolved with `table[key]`, where `key` is the first
    /// argument. A missing key fails the call itself.
    ResolvingByParam(BTreeMap<String, Value>),
    /// Return a promise resolved with the next value of the sequence.
    ResolvingByCallIndex(CallIndexSequence),
    /// Return a promise already rejected with the payload.
    RejectingValue(Value),
}

impl StubDescriptor {
    /// Builds a parameter-keyed descriptor from any key/value pairs.
    pub fn by_param<I, K>(table: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::ResolvingByParam(table.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a call-index descriptor with its counter at zero.
    pub fn by_call_index<I>(sequence: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::ResolvingByCallIndex(CallIndexSequence::new(sequence.into_iter().collect()))
    }

    /// Returns the discriminant.
    #[must_use]
    pub const fn kind(&self) -> StubKind {
        match self {
            Self::FixedValue(_) => StubKind::FixedValue,
            Self::ResolvingValue(_) => StubKind::ResolvingValue,
            Self::ResolvingByParam(_) => StubKind::ResolvingByParam,
            Self::ResolvingByCallIndex(_) => StubKind::ResolvingByCallIndex,
            Self::RejectingValue(_) => StubKind::RejectingValue,
        }
    }

    /// Returns the invocation counter of a call-index stub.
    #[must_use]
    pub fn invocations(&self) -> Option<usize> {
        match self {
            Self::ResolvingByCallIndex(sequence) => Some(sequence.invocations()),
            _ => None,
        }
    }

    /// Runs one invocation.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidParamKey`] when a parameter-keyed stub is
    /// called with a key missing from its table. No promise is created in
    /// that case.
    pub fn invoke(&self, args: &[Value], deferreds: &dyn DeferredFactory) -> Result<Returned> {
        match self {
            Self::FixedValue(value) => Ok(Returned::Value(value.clone())),
            Self::ResolvingValue(value) => Ok(settled(
                deferreds,
                Settlement::Fulfilled(value.clone()),
            )),
            Self::ResolvingByParam(table) => {
                let key = param_key(args.first());
                let Some(value) = table.get(&key) else {
                    tracing::warn!(key = %key, "no parameter entry for key");
                    return Err(StubError::invalid_param_key(key));
                };
                Ok(settled(deferreds, Settlement::Fulfilled(value.clone())))
            }
            Self::ResolvingByCallIndex(sequence) => Ok(settled(
                deferreds,
                Settlement::Fulfilled(sequence.advance()),
            )),
            Self::RejectingValue(error) => Ok(settled(
                deferreds,
                Settlement::Rejected(error.clone()),
            )),
        }
    }
}

fn settled(deferreds: &dyn DeferredFactory, settlement: Settlement) -> Returned {
    let deferred = deferreds.create();
    deferred.settle(settlement);
    Returned::Promise(deferred.promise())
}
