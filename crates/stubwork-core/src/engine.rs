//! The stub engine.
//!
//! # Toyota Way: Poka-Yoke (ポカヨケ)
//! Every stubbing operation validates the target first and installs nothing
//! on failure, so a typo in a method name fails the test at the line that
//! made it.

use std::sync::Arc;

use serde_json::Value;
use stubwork_deferred::{DeferredFactory, DigestScheduler};

use crate::config::{ConfigError, EngineConfig};
use crate::descriptor::{StubDescriptor, StubKind};
use crate::double::{DoubleProvider, SpyRegistry};
use crate::error::{Result, StubError};
use crate::target::{MethodFn, Target, TargetId, is_valid_method};

/// Handle to an installed stub.
#[derive(Debug, Clone)]
pub struct StubHandle {
    target: TargetId,
    method: String,
    descriptor: Arc<StubDescriptor>,
}

impl StubHandle {
    /// Returns the stubbed target's identity.
    #[must_use]
    pub const fn target(&self) -> TargetId {
        self.target
    }

    /// Returns the stubbed method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the stub's kind.
    #[must_use]
    pub fn kind(&self) -> StubKind {
        self.descriptor.kind()
    }

    /// Returns the invocation counter of a call-index stub.
    #[must_use]
    pub fn invocations(&self) -> Option<usize> {
        self.descriptor.invocations()
    }

    /// Returns the installed descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &StubDescriptor {
        &self.descriptor
    }
}

/// Installs stubs and flushes the deferred results they produce.
///
/// The engine keeps no state between calls beyond its collaborators; each
/// installed stub owns its own descriptor.
pub struct StubEngine {
    config: EngineConfig,
    doubles: Arc<dyn DoubleProvider>,
    deferreds: Arc<dyn DeferredFactory>,
}

impl StubEngine {
    /// Creates a new engine builder.
    #[must_use]
    pub fn builder() -> StubEngineBuilder {
        StubEngineBuilder::default()
    }

    /// Creates an engine with a private spy registry and digest scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates an engine from a validated configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::builder().with_config(config).build())
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the double provider stubs are installed through.
    #[must_use]
    pub fn double_provider(&self) -> &dyn DoubleProvider {
        self.doubles.as_ref()
    }

    /// Returns the factory stubs create deferreds with.
    #[must_use]
    pub fn deferred_factory(&self) -> &dyn DeferredFactory {
        self.deferreds.as_ref()
    }

    /// Returns true iff `target` exposes a callable member named `name`.
    #[must_use]
    pub fn is_valid_method(&self, target: &dyn Target, name: &str) -> bool {
        is_valid_method(target, name)
    }

    /// Installs `descriptor` as the replacement for `target.name`.
    ///
    /// Re-installing on the same target and method replaces the previous
    /// stub entirely.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if `target.name` is missing or
    /// not callable. The target is left untouched.
    pub fn install(
        &self,
        target: &mut dyn Target,
        name: &str,
        descriptor: StubDescriptor,
    ) -> Result<StubHandle> {
        if !is_valid_method(target, name) {
            tracing::debug!(
                engine = %self.config.label,
                target = %target.target_id(),
                method = name,
                "refusing to stub missing or non-callable member"
            );
            return Err(StubError::invalid_method(name));
        }

        let descriptor = Arc::new(descriptor);
        let kind = descriptor.kind();

        let invoked = Arc::clone(&descriptor);
        let deferreds = Arc::clone(&self.deferreds);
        let label = self.config.label.clone();
        let method = name.to_string();
        let behavior: MethodFn = Arc::new(move |args: &[Value]| {
            tracing::debug!(
                engine = %label,
                method = %method,
                kind = %kind,
                args = args.len(),
                "stub invoked"
            );
            invoked.invoke(args, deferreds.as_ref())
        });

        self.doubles.install(target, name, behavior);
        tracing::debug!(
            engine = %self.config.label,
            target = %target.target_id(),
            method = name,
            kind = %kind,
            "stub installed"
        );

        Ok(StubHandle {
            target: target.target_id(),
            method: name.to_string(),
            descriptor,
        })
    }

    /// Stubs `target.name` to return `value` synchronously.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if the method is not valid.
    pub fn stub_returning(
        &self,
        target: &mut dyn Target,
        name: &str,
        value: Value,
    ) -> Result<StubHandle> {
        self.install(target, name, StubDescriptor::FixedValue(value))
    }

    /// Stubs `target.name` to return a promise resolved with `value`.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if the method is not valid.
    pub fn stub_resolving(
        &self,
        target: &mut dyn Target,
        name: &str,
        value: Value,
    ) -> Result<StubHandle> {
        self.install(target, name, StubDescriptor::ResolvingValue(value))
    }

    /// Stubs `target.name` to resolve with the table entry for its first
    /// argument. Invoking with a key absent from `table` fails that call
    /// with [`StubError::InvalidParamKey`].
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if the method is not valid.
    pub fn stub_resolving_by_param<I, K>(
        &self,
        target: &mut dyn Target,
        name: &str,
        table: I,
    ) -> Result<StubHandle>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.install(target, name, StubDescriptor::by_param(table))
    }

    /// Stubs `target.name` to resolve with `sequence[n]` on its n-th call
    /// (zero-based). Calls past the end resolve with `null`.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if the method is not valid.
    pub fn stub_resolving_by_call_index<I>(
        &self,
        target: &mut dyn Target,
        name: &str,
        sequence: I,
    ) -> Result<StubHandle>
    where
        I: IntoIterator<Item = Value>,
    {
        self.install(target, name, StubDescriptor::by_call_index(sequence))
    }

    /// Stubs `target.name` to return a promise rejected with `error`.
    ///
    /// # Errors
    /// Returns [`StubError::InvalidMethod`] if the method is not valid.
    pub fn stub_rejecting(
        &self,
        target: &mut dyn Target,
        name: &str,
        error: Value,
    ) -> Result<StubHandle> {
        self.install(target, name, StubDescriptor::RejectingValue(error))
    }

    /// Runs every pending continuation to quiescence, including the ones
    /// scheduled while flushing. Returns the number run.
    pub fn flush_pending(&self) -> usize {
        let ran = self.deferreds.drain_all();
        tracing::debug!(engine = %self.config.label, continuations = ran, "flushed pending");
        ran
    }

    /// Returns the number of continuations waiting for the next flush.
    #[must_use]
    pub fn pending_continuations(&self) -> usize {
        self.deferreds.pending_tasks()
    }

    /// Returns true if `target.name` has been called since it was stubbed.
    #[must_use]
    pub fn was_called(&self, target: &dyn Target, name: &str) -> bool {
        self.doubles.was_called(target, name)
    }

    /// Returns how many times `target.name` has been called.
    #[must_use]
    pub fn call_count(&self, target: &dyn Target, name: &str) -> usize {
        self.doubles.call_count(target, name)
    }

    /// Returns the arguments of call number `index` to `target.name`.
    #[must_use]
    pub fn call_args(&self, target: &dyn Target, name: &str, index: usize) -> Option<Vec<Value>> {
        self.doubles.call_args(target, name, index)
    }

    /// Returns the arguments of the latest call to `target.name`.
    #[must_use]
    pub fn most_recent_args(&self, target: &dyn Target, name: &str) -> Option<Vec<Value>> {
        self.doubles.most_recent_args(target, name)
    }

    /// Drops the call records kept for `target`. Its stubs stay installed.
    /// Returns the number of records dropped.
    pub fn release(&self, target: &dyn Target) -> usize {
        self.doubles.forget(target.target_id())
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StubEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubEngine")
            .field("config", &self.config)
            .field("pending", &self.deferreds.pending_tasks())
            .finish_non_exhaustive()
    }
}

/// Builder for [`StubEngine`].
#[derive(Default)]
pub struct StubEngineBuilder {
    config: Option<EngineConfig>,
    doubles: Option<Arc<dyn DoubleProvider>>,
    deferreds: Option<Arc<dyn DeferredFactory>>,
}

impl StubEngineBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the double provider. Defaults to a [`SpyRegistry`] using the
    /// configured spy settings.
    #[must_use]
    pub fn with_double_provider(mut self, doubles: Arc<dyn DoubleProvider>) -> Self {
        self.doubles = Some(doubles);
        self
    }

    /// Sets the deferred factory. Defaults to a fresh [`DigestScheduler`].
    #[must_use]
    pub fn with_scheduler(mut self, deferreds: Arc<dyn DeferredFactory>) -> Self {
        self.deferreds = Some(deferreds);
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> StubEngine {
        let config = self.config.unwrap_or_default();
        let doubles = self
            .doubles
            .unwrap_or_else(|| Arc::new(SpyRegistry::with_config(config.spy)));
        let deferreds = self
            .deferreds
            .unwrap_or_else(|| Arc::new(DigestScheduler::new()));

        StubEngine {
            config,
            doubles,
            deferreds,
        }
    }
}
