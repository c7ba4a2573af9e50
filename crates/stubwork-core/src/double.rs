//! Double provider: installs replacements and records their calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::config::SpyConfig;
use crate::target::{MethodFn, Target, TargetId};

/// Installs method replacements and answers questions about their calls.
///
/// Implementations own the recording; the stub engine only decides what a
/// replacement does when invoked.
pub trait DoubleProvider: Send + Sync {
    /// Replaces `target.method` with `behavior`, recording every call.
    ///
    /// Installing over an existing replacement discards its record.
    fn install(&self, target: &mut dyn Target, method: &str, behavior: MethodFn);

    /// Returns the number of recorded calls.
    fn call_count(&self, target: &dyn Target, method: &str) -> usize;

    /// Returns the arguments of call number `index` (zero-based).
    fn call_args(&self, target: &dyn Target, method: &str, index: usize) -> Option<Vec<Value>>;

    /// Clears the record for `target.method` without uninstalling it.
    fn reset(&self, target: &dyn Target, method: &str);

    /// Drops every record kept for `target`. Its replacements stay installed
    /// but stop recording. Returns the number of records dropped.
    fn forget(&self, target: TargetId) -> usize;

    /// Returns true if the replacement has been called at least once.
    fn was_called(&self, target: &dyn Target, method: &str) -> bool {
        self.call_count(target, method) > 0
    }

    /// Returns the arguments of the latest call.
    fn most_recent_args(&self, target: &dyn Target, method: &str) -> Option<Vec<Value>> {
        let count = self.call_count(target, method);
        count
            .checked_sub(1)
            .and_then(|last| self.call_args(target, method, last))
    }
}

/// Recorded invocations of one installed replacement.
#[derive(Debug, Default)]
struct CallLog {
    count: usize,
    history: VecDeque<Vec<Value>>,
    /// Absolute index of `history[0]`.
    first_retained: usize,
}

impl CallLog {
    fn record(&mut self, args: &[Value], config: SpyConfig) {
        self.count += 1;
        if !config.record_args {
            return;
        }
        self.history.push_back(args.to_vec());
        if config.history_limit > 0 && self.history.len() > config.history_limit {
            self.history.pop_front();
            self.first_retained += 1;
        }
    }

    fn args(&self, index: usize) -> Option<Vec<Value>> {
        let offset = index.checked_sub(self.first_retained)?;
        self.history.get(offset).cloned()
    }
}

type CallKey = (TargetId, String);

/// Default [`DoubleProvider`] keeping call records in memory.
///
/// Clones share the same records. Records live until the registry is
/// dropped or released with [`DoubleProvider::forget`] or
/// [`SpyRegistry::clear`], so a registry shared across tests should be
/// released once each test is done with its targets.
#[derive(Debug, Clone, Default)]
pub struct SpyRegistry {
    config: SpyConfig,
    calls: Arc<Mutex<HashMap<CallKey, CallLog>>>,
}

impl SpyRegistry {
    /// Creates a registry with default recording settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the given recording settings.
    #[must_use]
    pub fn with_config(config: SpyConfig) -> Self {
        Self {
            config,
            calls: Arc::default(),
        }
    }

    /// Returns the recording settings.
    #[must_use]
    pub const fn config(&self) -> SpyConfig {
        self.config
    }

    /// Returns every retained argument list, oldest first.
    #[must_use]
    pub fn all_args(&self, target: &dyn Target, method: &str) -> Vec<Vec<Value>> {
        self.calls
            .lock()
            .get(&key(target.target_id(), method))
            .map(|log| log.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of replacements this registry has installed and
    /// still tracks.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.calls.lock().len()
    }

    /// Drops every record. Installed replacements stop recording.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.calls.lock()).len();
        tracing::debug!(records = dropped, "spy registry cleared");
    }
}

fn key(id: TargetId, method: &str) -> CallKey {
    (id, method.to_string())
}

impl DoubleProvider for SpyRegistry {
    fn install(&self, target: &mut dyn Target, method: &str, behavior: MethodFn) {
        let call_key = key(target.target_id(), method);
        self.calls.lock().insert(call_key.clone(), CallLog::default());

        let calls = Arc::clone(&self.calls);
        let config = self.config;
        let recorder: MethodFn = Arc::new(move |args: &[Value]| {
            if let Some(log) = calls.lock().get_mut(&call_key) {
                log.record(args, config);
            }
            behavior(args)
        });

        target.set_method(method, recorder);
    }

    fn call_count(&self, target: &dyn Target, method: &str) -> usize {
        self.calls
            .lock()
            .get(&key(target.target_id(), method))
            .map_or(0, |log| log.count)
    }

    fn call_args(&self, target: &dyn Target, method: &str, index: usize) -> Option<Vec<Value>> {
        self.calls
            .lock()
            .get(&key(target.target_id(), method))
            .and_then(|log| log.args(index))
    }

    fn reset(&self, target: &dyn Target, method: &str) {
        if let Some(log) = self.calls.lock().get_mut(&key(target.target_id(), method)) {
            *log = CallLog::default();
        }
    }

    fn forget(&self, target: TargetId) -> usize {
        let mut calls = self.calls.lock();
        let before = calls.len();
        calls.retain(|(id, _), _| *id != target);
        let dropped = before - calls.len();
        drop(calls);
        tracing::debug!(target = %target, records = dropped, "spy records released");
        dropped
    }
}
