use std::{cmp::Ordering, fmt};

use indexmap::IndexMap;

/// A value produced by evaluating an expression.
///
/// Contexts are opaque nested structures supplied by the host, so this type
/// mirrors the JSON data model with one addition: [`Value::Undefined`], the
/// result of walking a path that does not exist. `Undefined` is distinct from
/// [`Value::Null`] and from every falsy-but-present value (`""`, `0`, `false`).
///
/// # Coercion
///
/// Operators never rely on implicit conversions. Every coercion the language
/// performs is defined here: [`Value::is_truthy`], [`Value::to_number`],
/// [`Value::to_primitive`], [`Value::to_js_string`], [`Value::loose_eq`] and
/// [`Value::strict_eq`].
///
/// # Examples
///
/// ```
/// use jexl_lang::Value;
///
/// assert!(Value::from("0").loose_eq(&Value::from(0)));
/// assert!(!Value::from("").is_truthy());
/// assert!(Value::Array(vec![]).is_truthy());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent value (missing path, missing property)
    #[default]
    Undefined,

    /// JSON null
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Double-precision number
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// Mapping with string keys, in insertion order
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Check if the value is truthy (for conditions, filters and `!`)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Undefined | Null => false,
            Boolean(b) => *b,
            Number(n) => *n != 0.0 && !n.is_nan(),
            String(s) => !s.is_empty(),
            Array(_) | Object(_) => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `Undefined` or `Null`: a value that has no properties.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Numeric coercion used by arithmetic and relational operators.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Object(_) => self.to_primitive().to_number(),
        }
    }

    /// Reduce a collection to a scalar; scalars are returned unchanged.
    ///
    /// Arrays become the comma-joined string forms of their elements and
    /// objects become `[object Object]`.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) => Value::String(self.to_js_string()),
            other => other.clone(),
        }
    }

    /// String coercion used by concatenation and substring search.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Coercive equality, as used by `==` and `!=`.
    ///
    /// Collections compare structurally against each other and through
    /// [`Value::to_primitive`] against scalars.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Array(_), Array(_)) | (Object(_), Object(_)) => self.strict_eq(other),
            (Number(a), String(b)) => *a == parse_number(b),
            (String(a), Number(b)) => parse_number(a) == *b,
            (Boolean(_), _) => Number(self.to_number()).loose_eq(other),
            (_, Boolean(_)) => self.loose_eq(&Number(other.to_number())),
            (Array(_) | Object(_), Number(_) | String(_)) => self.to_primitive().loose_eq(other),
            (Number(_) | String(_), Array(_) | Object(_)) => self.loose_eq(&other.to_primitive()),
            (Array(_), Object(_)) | (Object(_), Array(_)) => false,
        }
    }

    /// Equality without coercion, as used by `in` on arrays.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, x)| b.get(key).is_some_and(|y| x.strict_eq(y)))
            }
            _ => false,
        }
    }

    /// Relational comparison, as used by `<`, `<=`, `>` and `>=`.
    ///
    /// Two strings compare by UTF-16 code units, like `length` and string
    /// indexing; anything else compares numerically. `None` means the
    /// operands are unordered (NaN).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self.to_primitive(), other.to_primitive()) {
            (Value::String(a), Value::String(b)) => Some(a.encode_utf16().cmp(b.encode_utf16())),
            (a, b) => a.to_number().partial_cmp(&b.to_number()),
        }
    }

    /// Look up a property or index on this value.
    ///
    /// Missing properties, out-of-range indices and lookups on scalars
    /// without properties all produce [`Value::Undefined`]; this never fails.
    pub fn get_property(&self, key: &Value) -> Value {
        match self {
            Value::Object(map) => map.get(&key.to_js_string()).cloned().unwrap_or_default(),
            Value::Array(items) => match as_index(key) {
                Some(index) => items.get(index).cloned().unwrap_or_default(),
                None if is_length(key) => Value::Number(items.len() as f64),
                None => Value::Undefined,
            },
            Value::String(s) => match as_index(key) {
                Some(index) => s
                    .encode_utf16()
                    .nth(index)
                    .map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
                    .unwrap_or_default(),
                None if is_length(key) => Value::Number(s.encode_utf16().count() as f64),
                None => Value::Undefined,
            },
            _ => Value::Undefined,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

fn is_length(key: &Value) -> bool {
    matches!(key, Value::String(s) if s == "length")
}

/// Integral, non-negative numbers (or their canonical string form) index
/// into arrays and strings.
fn as_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < usize::MAX as f64 => {
            Some(*n as usize)
        }
        Value::String(s) => s
            .parse::<usize>()
            .ok()
            .filter(|index| index.to_string() == *s),
        _ => None,
    }
}

/// Parse a string the way numeric coercion does: surrounding whitespace is
/// ignored, an empty string is zero and anything malformed is NaN.
pub fn parse_number(input: &str) -> f64 {
    let s = input.trim();
    if s.is_empty() {
        return 0.0;
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Rust also accepts "inf" and "nan", which are not numbers here
    let valid = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !valid {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Render a number the way string coercion does (`8`, `0.5`, `1e+21`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        n.to_string()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
