//! Helpers over the dynamic value type passed through stubs.

use serde_json::Value;

/// Key used when a parameter-keyed stub is invoked without an argument.
pub const MISSING_KEY: &str = "undefined";

/// Returns true unless the value is `null`, `false`, zero or `""`.
///
/// Empty arrays and objects are truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Converts an invocation argument into a parameter-table key.
///
/// Strings are used verbatim, anything else by its compact JSON text.
#[must_use]
pub fn param_key(arg: Option<&Value>) -> String {
    match arg {
        None => MISSING_KEY.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
