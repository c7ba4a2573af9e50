//! Deferred values and the promises they settle.
//!
//! A [`Deferred`] is the producer side; its [`Promise`] is the consumer side.
//! Settling is synchronous and one-way, but continuations registered with
//! [`Promise::then`] are only ever queued. They run when the owning
//! scheduler drains its queue.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scheduler::{Task, TaskQueue};

/// Observable state of a promise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromiseState {
    /// Not settled yet.
    Pending,
    /// Resolved with a value.
    Fulfilled(Value),
    /// Rejected with an error payload.
    Rejected(Value),
}

/// Terminal result of a promise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// Resolved with a value.
    Fulfilled(Value),
    /// Rejected with an error payload.
    Rejected(Value),
}

impl From<Settlement> for PromiseState {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Settlement::Fulfilled(v) => Self::Fulfilled(v),
            Settlement::Rejected(e) => Self::Rejected(e),
        }
    }
}

/// What a continuation hands to the promise derived from it.
#[derive(Debug)]
pub enum Outcome {
    /// Fulfill the derived promise with a value.
    Fulfill(Value),
    /// Reject the derived promise.
    Reject(Value),
    /// Settle the derived promise however this promise settles.
    Follow(Promise),
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Fulfill(value)
    }
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Fulfill(Value::Null)
    }
}

impl From<Promise> for Outcome {
    fn from(promise: Promise) -> Self {
        Self::Follow(promise)
    }
}

impl From<Settlement> for Outcome {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Settlement::Fulfilled(v) => Self::Fulfill(v),
            Settlement::Rejected(e) => Self::Reject(e),
        }
    }
}

type Handler = Box<dyn FnOnce(Value) -> Outcome + Send + 'static>;

/// A registered continuation and the deferred it feeds.
struct Reaction {
    on_fulfilled: Option<Handler>,
    on_rejected: Option<Handler>,
    derived: Deferred,
}

impl Reaction {
    fn into_task(self, settlement: Settlement) -> Task {
        Box::new(move || self.run(settlement))
    }

    fn run(self, settlement: Settlement) {
        let Self {
            on_fulfilled,
            on_rejected,
            derived,
        } = self;

        let outcome = match settlement {
            Settlement::Fulfilled(value) => match on_fulfilled {
                Some(handler) => handler(value),
                None => Outcome::Fulfill(value),
            },
            Settlement::Rejected(error) => match on_rejected {
                Some(handler) => handler(error),
                None => Outcome::Reject(error),
            },
        };

        derived.complete(outcome);
    }
}

enum State {
    Pending(Vec<Reaction>),
    Settled(Settlement),
}

/// Consumer handle to a deferred result.
///
/// Clones observe the same state.
#[derive(Clone)]
pub struct Promise {
    state: Arc<Mutex<State>>,
    queue: TaskQueue,
}

impl Promise {
    fn pending(queue: &TaskQueue) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Pending(Vec::new()))),
            queue: queue.clone(),
        }
    }

    /// Returns the current state.
    ///
    /// The state changes as soon as the deferred is settled, even though
    /// continuations wait for the next drain.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        match &*self.state.lock() {
            State::Pending(_) => PromiseState::Pending,
            State::Settled(settlement) => settlement.clone().into(),
        }
    }

    /// Returns true while the promise is unsettled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(&*self.state.lock(), State::Pending(_))
    }

    /// Registers continuations for both outcomes.
    ///
    /// Returns a promise settled with whatever the chosen continuation
    /// produces.
    pub fn then<F, FO, R, RO>(&self, on_fulfilled: F, on_rejected: R) -> Self
    where
        F: FnOnce(Value) -> FO + Send + 'static,
        FO: Into<Outcome>,
        R: FnOnce(Value) -> RO + Send + 'static,
        RO: Into<Outcome>,
    {
        self.subscribe(
            Some(Box::new(move |v| on_fulfilled(v).into())),
            Some(Box::new(move |e| on_rejected(e).into())),
        )
    }

    /// Registers a fulfillment continuation; rejections pass through.
    pub fn and_then<F, O>(&self, on_fulfilled: F) -> Self
    where
        F: FnOnce(Value) -> O + Send + 'static,
        O: Into<Outcome>,
    {
        self.subscribe(Some(Box::new(move |v| on_fulfilled(v).into())), None)
    }

    /// Registers a rejection continuation; fulfillments pass through.
    pub fn catch<R, O>(&self, on_rejected: R) -> Self
    where
        R: FnOnce(Value) -> O + Send + 'static,
        O: Into<Outcome>,
    {
        self.subscribe(None, Some(Box::new(move |e| on_rejected(e).into())))
    }

    fn subscribe(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Self {
        let derived = Deferred::with_queue(&self.queue);
        let promise = derived.promise();
        let reaction = Reaction {
            on_fulfilled,
            on_rejected,
            derived,
        };

        let settled = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending(reactions) => {
                    reactions.push(reaction);
                    return promise;
                }
                State::Settled(settlement) => settlement.clone(),
            }
        };

        self.queue.schedule(reaction.into_task(settled));
        promise
    }

    fn settle(&self, settlement: Settlement) -> bool {
        let reactions = {
            let mut state = self.state.lock();
            if matches!(*state, State::Settled(_)) {
                return false;
            }
            match std::mem::replace(&mut *state, State::Settled(settlement.clone())) {
                State::Pending(reactions) => reactions,
                State::Settled(_) => Vec::new(),
            }
        };

        for reaction in reactions {
            self.queue.schedule(reaction.into_task(settlement.clone()));
        }
        true
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Producer handle that settles exactly one promise.
#[derive(Debug, Clone)]
pub struct Deferred {
    promise: Promise,
}

impl Deferred {
    /// Creates a pending deferred whose continuations go to `queue`.
    #[must_use]
    pub fn with_queue(queue: &TaskQueue) -> Self {
        Self {
            promise: Promise::pending(queue),
        }
    }

    /// Returns the promise this deferred settles.
    #[must_use]
    pub fn promise(&self) -> Promise {
        self.promise.clone()
    }

    /// Marks the promise fulfilled. Returns false if it was already settled.
    pub fn resolve(&self, value: Value) -> bool {
        self.settle(Settlement::Fulfilled(value))
    }

    /// Marks the promise rejected. Returns false if it was already settled.
    pub fn reject(&self, error: Value) -> bool {
        self.settle(Settlement::Rejected(error))
    }

    /// Settles the promise. Returns false if it was already settled.
    pub fn settle(&self, settlement: Settlement) -> bool {
        let accepted = self.promise.settle(settlement);
        if !accepted {
            tracing::debug!("deferred already settled, ignoring");
        }
        accepted
    }

    fn complete(&self, outcome: Outcome) {
        match outcome {
            Outcome::Fulfill(value) => {
                self.resolve(value);
            }
            Outcome::Reject(error) => {
                self.reject(error);
            }
            Outcome::Follow(source) => {
                let on_fulfilled = self.clone();
                let on_rejected = self.clone();
                source.subscribe(
                    Some(Box::new(move |v| {
                        on_fulfilled.resolve(v);
                        Outcome::Fulfill(Value::Null)
                    })),
                    Some(Box::new(move |e| {
                        on_rejected.reject(e);
                        Outcome::Fulfill(Value::Null)
                    })),
                );
            }
        }
    }
}
