use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed expression.
///
/// The tree is built once per evaluation and owns its children outright;
/// no node refers back to its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal string, number or boolean
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    Literal(Value),

    /// Property of the context, or of the relative context when `relative`
    ///
    /// # Examples
    /// ```text
    /// foo      // Identifier { name: "foo", relative: false }
    /// .tek     // Identifier { name: "tek", relative: true }
    /// ```
    Identifier { name: String, relative: bool },

    /// Binary operation, dispatched through the grammar table
    BinaryOp {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary prefix operation
    ///
    /// # Example
    /// ```text
    /// !enabled
    /// ```
    UnaryOp { operator: String, right: Box<Expr> },

    /// Ternary conditional
    ///
    /// A missing consequent (`test ?: alternate`) resolves to the value of
    /// `test` itself when it is truthy.
    Conditional {
        test: Box<Expr>,
        consequent: Option<Box<Expr>>,
        alternate: Box<Expr>,
    },

    /// Dot access
    ///
    /// When `subject` is an array the property is read from its first
    /// element.
    ///
    /// # Example
    /// ```text
    /// foo.bar
    /// ```
    MemberAccess { subject: Box<Expr>, property: String },

    /// Bracket expression
    ///
    /// Relative filters (predicate starting with `.`) keep the elements of
    /// `subject` for which the predicate holds. Otherwise the predicate is a
    /// boolean gate on `subject` or an index/key into it.
    ///
    /// # Examples
    /// ```text
    /// foo.bar[.tek == "baz"]   // relative filter
    /// foo.bar[1]               // index
    /// foo["key"]               // key
    /// foo[x > 1]               // gate
    /// ```
    Filter {
        subject: Box<Expr>,
        predicate: Box<Expr>,
        relative: bool,
    },

    /// Application of a host transform
    ///
    /// # Examples
    /// ```text
    /// name|lower
    /// sample|stableSample(0.5)
    /// ```
    Transform {
        subject: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },

    /// Object literal, entries in source order
    ///
    /// # Example
    /// ```text
    /// {name: foo.name, "total": foo.total}
    /// ```
    Object(Vec<(String, Expr)>),

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [foo.a, "b", 3]
    /// ```
    Array(Vec<Expr>),
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn identifier(name: &str) -> Self {
        Expr::Identifier {
            name: name.to_string(),
            relative: false,
        }
    }

    pub fn relative_identifier(name: &str) -> Self {
        Expr::Identifier {
            name: name.to_string(),
            relative: true,
        }
    }
}
