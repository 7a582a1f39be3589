use crate::{grammar::Element, value::Value};

/// A lexical token.
///
/// `raw` holds the text the token was produced from, including any
/// whitespace that followed it. It is kept for diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>) -> Self {
        Token {
            kind,
            raw: raw.into(),
        }
    }

    /// Whether this token ends an operand, in which case a following `-` is
    /// subtraction rather than the sign of a negative number.
    pub fn produces_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Literal(_)
                | TokenKind::Identifier(_)
                | TokenKind::CloseParen
                | TokenKind::CloseBracket
                | TokenKind::CloseCurl
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// String, number or boolean literal
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'it\'s'
    /// -17.55
    /// true
    /// ```
    Literal(Value),

    /// Context or relative-context property name
    ///
    /// Must start with a letter or underscore, followed by letters, digits,
    /// or underscores.
    ///
    /// # Examples
    /// ```text
    /// normandy
    /// inString
    /// _private
    /// ```
    Identifier(String),

    // Delimiters
    /// Member access, or the relative marker at the start of a filter
    ///
    /// # Examples
    /// ```text
    /// foo.bar
    /// foo[.bar == 1]
    /// ```
    Dot,

    /// Left bracket for filters and array literals
    OpenBracket,

    /// Right bracket
    CloseBracket,

    /// Transform application
    ///
    /// # Examples
    /// ```text
    /// value|lower
    /// date|date("2020-01-01")
    /// ```
    Pipe,

    /// Left brace for object literals
    OpenCurl,

    /// Right brace
    CloseCurl,

    /// Object key separator and ternary alternate marker
    Colon,

    /// Separates arguments, array items and object entries
    Comma,

    /// Left parenthesis for grouping or transform arguments
    OpenParen,

    /// Right parenthesis
    CloseParen,

    /// Ternary marker
    ///
    /// # Examples
    /// ```text
    /// test ? consequent : alternate
    /// test ?: alternate
    /// ```
    Question,

    // Operators
    /// Binary operator symbol, looked up in the grammar
    BinaryOp(String),

    /// Unary prefix operator symbol, looked up in the grammar
    UnaryOp(String),
}

impl TokenKind {
    /// Token kind for a grammar symbol.
    pub fn from_element(symbol: &str, element: &Element) -> Self {
        match element {
            Element::Dot => TokenKind::Dot,
            Element::OpenBracket => TokenKind::OpenBracket,
            Element::CloseBracket => TokenKind::CloseBracket,
            Element::Pipe => TokenKind::Pipe,
            Element::OpenCurl => TokenKind::OpenCurl,
            Element::CloseCurl => TokenKind::CloseCurl,
            Element::Colon => TokenKind::Colon,
            Element::Comma => TokenKind::Comma,
            Element::OpenParen => TokenKind::OpenParen,
            Element::CloseParen => TokenKind::CloseParen,
            Element::Question => TokenKind::Question,
            Element::BinaryOp { .. } => TokenKind::BinaryOp(symbol.to_string()),
            Element::UnaryOp { .. } => TokenKind::UnaryOp(symbol.to_string()),
        }
    }
}
