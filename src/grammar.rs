//! # Grammar Table
//!
//! The single source of truth for every symbol the lexer recognizes. Each
//! entry maps a symbol to an [`Element`]: punctuation, a binary operator
//! (with its precedence and evaluation function) or a unary operator.
//!
//! ## Default binary operators
//!
//! | Precedence | Operators                                   |
//! |-----------:|---------------------------------------------|
//! | 10         | `\|\|` `&&`                                 |
//! | 20         | `==` `!=` `>` `>=` `<` `<=` `in`            |
//! | 30         | `+` `-`                                     |
//! | 40         | `*` `/` `//`                                |
//! | 50         | `%` `^`                                     |
//!
//! The unary `!` binds tighter than any binary operator.
//!
//! Operator functions are pure and synchronous: they receive operand values
//! that have already been evaluated.
use std::{cmp::Ordering, fmt, sync::Arc};

use indexmap::IndexMap;

use crate::value::Value;

/// Evaluation function of a binary operator.
pub type BinaryFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// Evaluation function of a unary operator.
pub type UnaryFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Precedence reported for unary operators: tighter than every binary one.
pub const UNARY_PRECEDENCE: u32 = u32::MAX;

/// A grammar element: the lexical category of a symbol.
#[derive(Clone)]
pub enum Element {
    /// Member access (`.`)
    Dot,
    /// Filter or array literal start (`[`)
    OpenBracket,
    CloseBracket,
    /// Transform application (`|`)
    Pipe,
    /// Object literal start (`{`)
    OpenCurl,
    CloseCurl,
    /// Ternary separator and object literal key separator (`:`)
    Colon,
    Comma,
    OpenParen,
    CloseParen,
    /// Ternary start (`?`)
    Question,
    /// Binary operator with its precedence (higher binds tighter)
    BinaryOp { precedence: u32, eval: BinaryFn },
    /// Unary prefix operator
    UnaryOp { eval: UnaryFn },
}

impl Element {
    pub fn precedence(&self) -> Option<u32> {
        match self {
            Element::BinaryOp { precedence, .. } => Some(*precedence),
            Element::UnaryOp { .. } => Some(UNARY_PRECEDENCE),
            _ => None,
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Dot => f.write_str("Dot"),
            Element::OpenBracket => f.write_str("OpenBracket"),
            Element::CloseBracket => f.write_str("CloseBracket"),
            Element::Pipe => f.write_str("Pipe"),
            Element::OpenCurl => f.write_str("OpenCurl"),
            Element::CloseCurl => f.write_str("CloseCurl"),
            Element::Colon => f.write_str("Colon"),
            Element::Comma => f.write_str("Comma"),
            Element::OpenParen => f.write_str("OpenParen"),
            Element::CloseParen => f.write_str("CloseParen"),
            Element::Question => f.write_str("Question"),
            Element::BinaryOp { precedence, .. } => f
                .debug_struct("BinaryOp")
                .field("precedence", precedence)
                .finish_non_exhaustive(),
            Element::UnaryOp { .. } => f.debug_struct("UnaryOp").finish_non_exhaustive(),
        }
    }
}

/// The table of recognized symbols.
///
/// [`Grammar::default`] carries the standard language; hosts can extend or
/// shrink a copy with [`Grammar::add_binary_op`], [`Grammar::add_unary_op`]
/// and [`Grammar::remove_op`].
///
/// # Examples
///
/// ```
/// use jexl_lang::{Grammar, Value};
///
/// let mut grammar = Grammar::default();
/// grammar.add_binary_op("~", 20, |l, r| {
///     Value::Boolean(l.to_js_string().eq_ignore_ascii_case(&r.to_js_string()))
/// });
/// assert_eq!(grammar.precedence("~"), Some(20));
/// ```
#[derive(Clone, Debug)]
pub struct Grammar {
    elements: IndexMap<String, Element>,
}

impl Grammar {
    pub fn get(&self, symbol: &str) -> Option<&Element> {
        self.elements.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.elements.contains_key(symbol)
    }

    /// All symbols, in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn precedence(&self, symbol: &str) -> Option<u32> {
        self.get(symbol).and_then(Element::precedence)
    }

    /// Register (or replace) a binary operator.
    pub fn add_binary_op<F>(&mut self, symbol: &str, precedence: u32, eval: F)
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        self.elements.insert(
            symbol.to_string(),
            Element::BinaryOp {
                precedence,
                eval: Arc::new(eval),
            },
        );
    }

    /// Register (or replace) a unary prefix operator.
    pub fn add_unary_op<F>(&mut self, symbol: &str, eval: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.elements.insert(
            symbol.to_string(),
            Element::UnaryOp {
                eval: Arc::new(eval),
            },
        );
    }

    /// Remove an operator. Returns `false` when the symbol was not an operator.
    pub fn remove_op(&mut self, symbol: &str) -> bool {
        match self.elements.get(symbol) {
            Some(Element::BinaryOp { .. } | Element::UnaryOp { .. }) => {
                self.elements.shift_remove(symbol);
                true
            }
            _ => false,
        }
    }

    /// Apply a binary operator to evaluated operands.
    pub fn eval_binary(&self, symbol: &str, left: &Value, right: &Value) -> Option<Value> {
        match self.get(symbol) {
            Some(Element::BinaryOp { eval, .. }) => Some(eval(left, right)),
            _ => None,
        }
    }

    /// Apply a unary operator to an evaluated operand.
    pub fn eval_unary(&self, symbol: &str, right: &Value) -> Option<Value> {
        match self.get(symbol) {
            Some(Element::UnaryOp { eval }) => Some(eval(right)),
            _ => None,
        }
    }

    fn punctuation(&mut self, symbol: &str, element: Element) {
        self.elements.insert(symbol.to_string(), element);
    }
}

impl Default for Grammar {
    fn default() -> Self {
        let mut grammar = Grammar {
            elements: IndexMap::new(),
        };

        grammar.punctuation(".", Element::Dot);
        grammar.punctuation("[", Element::OpenBracket);
        grammar.punctuation("]", Element::CloseBracket);
        grammar.punctuation("|", Element::Pipe);
        grammar.punctuation("{", Element::OpenCurl);
        grammar.punctuation("}", Element::CloseCurl);
        grammar.punctuation(":", Element::Colon);
        grammar.punctuation(",", Element::Comma);
        grammar.punctuation("(", Element::OpenParen);
        grammar.punctuation(")", Element::CloseParen);
        grammar.punctuation("?", Element::Question);

        grammar.add_binary_op("+", 30, add);
        grammar.add_binary_op("-", 30, |l, r| arithmetic(l, r, |a, b| a - b));
        grammar.add_binary_op("*", 40, |l, r| arithmetic(l, r, |a, b| a * b));
        grammar.add_binary_op("/", 40, |l, r| arithmetic(l, r, |a, b| a / b));
        grammar.add_binary_op("//", 40, |l, r| arithmetic(l, r, |a, b| (a / b).floor()));
        grammar.add_binary_op("%", 50, |l, r| arithmetic(l, r, |a, b| a % b));
        grammar.add_binary_op("^", 50, |l, r| arithmetic(l, r, power));
        grammar.add_binary_op("==", 20, |l, r| Value::Boolean(l.loose_eq(r)));
        grammar.add_binary_op("!=", 20, |l, r| Value::Boolean(!l.loose_eq(r)));
        grammar.add_binary_op(">", 20, |l, r| relational(l, r, |o| o == Ordering::Greater));
        grammar.add_binary_op(">=", 20, |l, r| relational(l, r, |o| o != Ordering::Less));
        grammar.add_binary_op("<", 20, |l, r| relational(l, r, |o| o == Ordering::Less));
        grammar.add_binary_op("<=", 20, |l, r| relational(l, r, |o| o != Ordering::Greater));
        grammar.add_binary_op("&&", 10, |l, r| {
            if l.is_truthy() { r.clone() } else { l.clone() }
        });
        grammar.add_binary_op("||", 10, |l, r| {
            if l.is_truthy() { l.clone() } else { r.clone() }
        });
        grammar.add_binary_op("in", 20, contains);

        grammar.add_unary_op("!", |r| Value::Boolean(!r.is_truthy()));

        grammar
    }
}

/// `+`: concatenation when either primitive is a string, addition otherwise.
fn add(left: &Value, right: &Value) -> Value {
    match (left.to_primitive(), right.to_primitive()) {
        (l @ Value::String(_), r) | (l, r @ Value::String(_)) => {
            Value::String(format!("{}{}", l.to_js_string(), r.to_js_string()))
        }
        (l, r) => Value::Number(l.to_number() + r.to_number()),
    }
}

fn arithmetic(left: &Value, right: &Value, op: fn(f64, f64) -> f64) -> Value {
    Value::Number(op(left.to_number(), right.to_number()))
}

fn power(base: f64, exponent: f64) -> f64 {
    // powf treats 1^NaN and 1^Infinity as 1
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn relational(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> Value {
    Value::Boolean(left.compare(right).is_some_and(accept))
}

/// `in`: substring search on strings, strict membership on arrays.
fn contains(left: &Value, right: &Value) -> Value {
    match right {
        Value::String(haystack) => Value::Boolean(haystack.contains(&left.to_js_string())),
        Value::Array(items) => Value::Boolean(items.iter().any(|item| item.strict_eq(left))),
        _ => Value::Boolean(false),
    }
}
