//! JSON interop for expression values.
//!
//! Contexts usually arrive as JSON and results usually leave as JSON. This
//! module converts between [`Value`] and `serde_json::Value`:
//!
//! - **Numbers** - whole finite numbers serialize as integers (`20`, not
//!   `20.0`); `NaN` and infinities become `null`
//! - **Undefined** - `null` at the top level and inside arrays, omitted from
//!   objects
//! - **Key order** - preserved in both directions
//!
//! # Examples
//!
//! ```
//! use jexl_lang::Value;
//! use jexl_lang::output::to_json;
//! use serde_json::json;
//!
//! let value = Value::from(json!({"a": [1, 2.5, "x"], "b": null}));
//! assert_eq!(to_json(&value), r#"{"a":[1,2.5,"x"],"b":null}"#);
//! ```

use crate::value::Value;

/// Largest integer a double represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Number(n) => number_to_json(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // -0 serializes as 0
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Converts a Value to compact JSON string representation.
pub fn to_json(value: &Value) -> String {
    serde_json::Value::from(value.clone()).to_string()
}

/// Converts a Value to pretty-printed JSON string representation.
///
/// # Examples
///
/// ```
/// use jexl_lang::Value;
/// use jexl_lang::output::to_json_pretty;
/// use serde_json::json;
///
/// let json = to_json_pretty(&Value::from(json!({"name": "Alice"})));
/// assert_eq!(json, "{\n  \"name\": \"Alice\"\n}");
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    let json = serde_json::Value::from(value.clone());
    // Serializing a serde_json::Value cannot fail
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
}
