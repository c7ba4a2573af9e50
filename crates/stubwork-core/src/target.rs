//! Target object model.
//!
//! A [`Target`] is anything that can answer "do you expose a callable member
//! under this name" and accept a replacement for it. [`TestObject`] is the
//! default implementation: a dynamic bag of fields and methods with an
//! optional prototype for inherited members.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stubwork_deferred::Promise;

use crate::error::{Result, StubError};

/// Stable identity of a target.
///
/// The call recorder keys invocations by `(TargetId, method)`, so two
/// targets never share a record even when their methods have the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(uuid::Uuid);

impl TargetId {
    /// Creates a new random target ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a target ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a method invocation hands back.
#[derive(Debug, Clone)]
pub enum Returned {
    /// A synchronous return value.
    Value(Value),
    /// A deferred result.
    Promise(Promise),
}

impl Returned {
    /// Returns the synchronous value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Promise(_) => None,
        }
    }

    /// Returns the promise, if any.
    #[must_use]
    pub fn into_promise(self) -> Option<Promise> {
        match self {
            Self::Promise(p) => Some(p),
            Self::Value(_) => None,
        }
    }

    /// Returns true if the invocation produced a promise.
    #[must_use]
    pub const fn is_promise(&self) -> bool {
        matches!(self, Self::Promise(_))
    }
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Promise> for Returned {
    fn from(promise: Promise) -> Self {
        Self::Promise(promise)
    }
}

/// A callable member. Invocation may fail synchronously.
pub type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Returned> + Send + Sync>;

/// A property on a target.
#[derive(Clone)]
pub enum Member {
    /// A plain, non-callable value.
    Field(Value),
    /// A callable method.
    Method(MethodFn),
}

impl Member {
    /// Wraps a closure as a method member.
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Returned> + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// Returns true if the member can be invoked.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Method(_))
    }

    /// Returns the method, if this member is callable.
    #[must_use]
    pub const fn as_method(&self) -> Option<&MethodFn> {
        match self {
            Self::Method(f) => Some(f),
            Self::Field(_) => None,
        }
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(v) => f.debug_tuple("Field").field(v).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// Reflection surface the stub engine needs from an object.
pub trait Target {
    /// Returns the stable identity of this target.
    fn target_id(&self) -> TargetId;

    /// Looks up a member by name, own members first, then inherited ones.
    fn member(&self, name: &str) -> Option<Member>;

    /// Installs `method` as an own member, shadowing any inherited one.
    fn set_method(&mut self, name: &str, method: MethodFn);
}

/// Returns true iff `target` exposes a callable member named `name`.
///
/// Absent members and plain fields are both invalid.
#[must_use]
pub fn is_valid_method(target: &dyn Target, name: &str) -> bool {
    target.member(name).is_some_and(|m| m.is_callable())
}

/// Dynamic object with fields, methods and an optional prototype.
pub struct TestObject {
    id: TargetId,
    members: HashMap<String, Member>,
    prototype: Option<Arc<TestObject>>,
}

impl TestObject {
    /// Creates an empty object with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: TargetId::new(),
            members: HashMap::new(),
            prototype: None,
        }
    }

    /// Adds a plain field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.insert(name.into(), Member::Field(value));
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Returned> + Send + Sync + 'static,
    {
        self.members.insert(name.into(), Member::method(f));
        self
    }

    /// Sets the object members are inherited from.
    #[must_use]
    pub fn with_prototype(mut self, prototype: Arc<Self>) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Returns the identity of this object.
    #[must_use]
    pub const fn id(&self) -> TargetId {
        self.id
    }

    /// Sets or replaces a plain field.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.members.insert(name.into(), Member::Field(value));
    }

    /// Returns true if `name` is an own member (not inherited).
    #[must_use]
    pub fn has_own(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Reads a field. Methods and missing members yield `None`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match self.member(name)? {
            Member::Field(v) => Some(v),
            Member::Method(_) => None,
        }
    }

    /// Invokes the method `name` with `args`.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if no callable member exists, or
    /// whatever error the method itself raises.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Returned> {
        match self.member(name) {
            Some(Member::Method(f)) => f(args),
            _ => Err(StubError::invalid_method(name)),
        }
    }
}

impl Default for TestObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for TestObject {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn member(&self, name: &str) -> Option<Member> {
        self.members.get(name).cloned().or_else(|| {
            self.prototype
                .as_ref()
                .and_then(|proto| proto.member(name))
        })
    }

    fn set_method(&mut self, name: &str, method: MethodFn) {
        self.members.insert(name.to_string(), Member::Method(method));
    }
}

impl std::fmt::Debug for TestObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.members.keys().collect();
        names.sort();
        f.debug_struct("TestObject")
            .field("id", &self.id)
            .field("members", &names)
            .field("has_prototype", &self.prototype.is_some())
            .finish()
    }
}
