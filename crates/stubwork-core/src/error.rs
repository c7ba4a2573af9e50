//! Error types for stubwork-core.
//!
//! Per Iron Lotus Framework: All errors are explicit, no panics allowed.
//! The message text is part of the contract; existing assertions match on it.

/// Result type alias for stubbing operations.
pub type Result<T> = std::result::Result<T, StubError>;

/// Errors raised by the stub engine.
///
/// Both kinds surface at the call site that made the mistake: stub
/// installation for [`StubError::InvalidMethod`], the stubbed invocation
/// itself for [`StubError::InvalidParamKey`]. Neither is ever delivered
/// through a rejected promise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    /// The target has no callable member under this name.
    #[error("The method {method_name} is not present at the specified object")]
    InvalidMethod {
        /// The requested member name.
        method_name: String,
    },

    /// A parameter-keyed stub was invoked with a key missing from its table.
    #[error("The key {key} is not valid for the params specified")]
    InvalidParamKey {
        /// The key the stub was invoked with.
        key: String,
    },
}

impl StubError {
    /// Creates an invalid-method error.
    #[must_use]
    pub fn invalid_method(method_name: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method_name: method_name.into(),
        }
    }

    /// Creates an invalid-param-key error.
    #[must_use]
    pub fn invalid_param_key(key: impl Into<String>) -> Self {
        Self::InvalidParamKey { key: key.into() }
    }

    /// Returns true for [`StubError::InvalidMethod`].
    #[must_use]
    pub const fn is_invalid_method(&self) -> bool {
        matches!(self, Self::InvalidMethod { .. })
    }

    /// Returns true for [`StubError::InvalidParamKey`].
    #[must_use]
    pub const fn is_invalid_param_key(&self) -> bool {
        matches!(self, Self::InvalidParamKey { .. })
    }
}
