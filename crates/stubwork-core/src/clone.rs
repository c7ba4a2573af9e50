//! Deep copies of test fixtures via a textual round trip.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::value::is_truthy;

/// Errors from [`clone_serializable`].
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// The value could not be written or read back as JSON.
    #[error("clone round trip failed: {0}")]
    RoundTrip(#[from] serde_json::Error),
}

/// Returns a deep copy of `value`, or `None` when `value` is falsy.
///
/// The copy goes through JSON text, so only what JSON can express survives.
#[must_use]
pub fn clone_object(value: &Value) -> Option<Value> {
    if !is_truthy(value) {
        return None;
    }
    let text = serde_json::to_string(value).ok()?;
    serde_json::from_str(&text).ok()
}

/// Deep-copies any serializable fixture through JSON text.
///
/// Fields skipped during serialization come back as their defaults, or the
/// round trip fails if the type requires them.
///
/// # Errors
/// Returns [`CloneError::RoundTrip`] if the value does not survive the trip.
pub fn clone_serializable<T>(value: &T) -> Result<T, CloneError>
where
    T: Serialize + DeserializeOwned,
{
    let text = serde_json::to_string(value)?;
    Ok(serde_json::from_str(&text)?)
}
