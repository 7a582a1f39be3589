use std::collections::HashMap;

use log::trace;
use regex::Regex;
use thiserror::Error;

use crate::{
    ast::{Token, TokenKind},
    grammar::Grammar,
    value::Value,
};

/// Quoted strings; a backslash escapes the next character.
const STRING_PATTERNS: [&str; 2] = [r#"'(?:\\[\s\S]|[^'\\])*'"#, r#""(?:\\[\s\S]|[^"\\])*""#];
const WHITESPACE_PATTERN: &str = r"\s+";
const BOOLEAN_PATTERNS: [&str; 2] = [r"\btrue\b", r"\bfalse\b"];
/// A numeral running straight into letters, such as `9foo`.
const MALFORMED_NUMBER_PATTERN: &str = r"[0-9]*\.?[0-9]+[A-Za-z_][A-Za-z0-9_]*";
const IDENTIFIER_PATTERN: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const NUMBER_PATTERN: &str = r"[0-9]*\.[0-9]+|[0-9]+";

/// Errors raised while turning source text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// Text that is neither a literal, an identifier nor a grammar symbol
    #[error("Invalid expression token: {0}")]
    InvalidToken(String),

    /// A quote with no matching closing quote
    #[error("Unterminated string literal: {0}")]
    UnterminatedString(String),

    /// Numeric text that does not fit a number
    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    /// The grammar's symbols could not be compiled into a pattern
    #[error("Invalid grammar: {0}")]
    Grammar(String),
}

/// Splits expressions into elements and classifies them into tokens.
///
/// A lexer is compiled from a [`Grammar`] once and can then tokenize any
/// number of expressions.
///
/// # Examples
///
/// ```
/// use jexl_lang::{Grammar, Lexer, TokenKind, Value};
///
/// let lexer = Lexer::new(&Grammar::default()).unwrap();
/// let tokens = lexer.tokenize("6+x - -17.55").unwrap();
/// assert_eq!(tokens[3].kind, TokenKind::BinaryOp("-".to_string()));
/// assert_eq!(tokens[4].kind, TokenKind::Literal(Value::Number(-17.55)));
/// ```
#[derive(Debug, Clone)]
pub struct Lexer {
    split: Regex,
    number: Regex,
    identifier: Regex,
    symbols: HashMap<String, TokenKind>,
}

impl Lexer {
    pub fn new(grammar: &Grammar) -> Result<Self, LexError> {
        let mut symbols: Vec<&str> = grammar.symbols().collect();
        // Longest first, so `//` wins over `/` and `==` over `=`
        symbols.sort_by(|a, b| b.len().cmp(&a.len()));

        let operators: Vec<String> = symbols
            .iter()
            .map(|symbol| {
                let escaped = regex::escape(symbol);
                if symbol.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    format!(r"\b{}\b", escaped)
                } else {
                    escaped
                }
            })
            .collect();

        let mut alternatives: Vec<String> = Vec::new();
        alternatives.extend(STRING_PATTERNS.iter().map(|p| p.to_string()));
        alternatives.push(WHITESPACE_PATTERN.to_string());
        alternatives.extend(BOOLEAN_PATTERNS.iter().map(|p| p.to_string()));
        alternatives.extend(operators);
        alternatives.push(MALFORMED_NUMBER_PATTERN.to_string());
        alternatives.push(IDENTIFIER_PATTERN.to_string());
        alternatives.push(NUMBER_PATTERN.to_string());

        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| LexError::Grammar(e.to_string()));

        let symbols = symbols
            .into_iter()
            .filter_map(|symbol| {
                grammar
                    .get(symbol)
                    .map(|element| (symbol.to_string(), TokenKind::from_element(symbol, element)))
            })
            .collect();

        Ok(Lexer {
            split: compile(&alternatives.join("|"))?,
            number: compile(&format!("^-?(?:{})$", NUMBER_PATTERN))?,
            identifier: compile(&format!("^(?:{})$", IDENTIFIER_PATTERN))?,
            symbols,
        })
    }

    /// Tokenize an expression.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        let elements = self.get_elements(source);
        let tokens = self.get_tokens(&elements)?;
        trace!("lexed {} elements into {} tokens", elements.len(), tokens.len());
        Ok(tokens)
    }

    /// Split source text into raw elements: every pattern match, plus the
    /// unmatched text between matches. Whitespace elements are kept.
    pub fn get_elements<'s>(&self, source: &'s str) -> Vec<&'s str> {
        let mut elements = Vec::new();
        let mut last = 0;

        for found in self.split.find_iter(source) {
            if found.start() > last {
                elements.push(&source[last..found.start()]);
            }
            elements.push(found.as_str());
            last = found.end();
        }
        if last < source.len() {
            elements.push(&source[last..]);
        }

        elements
    }

    /// Classify raw elements into tokens.
    ///
    /// Whitespace is folded into the `raw` text of the preceding token. A `-`
    /// that cannot be subtraction (nothing before it produces a value) is
    /// merged into the element that follows it as a negative number. A sign
    /// takes exactly one element, so `--5` is the invalid token `--`.
    pub fn get_tokens(&self, elements: &[&str]) -> Result<Vec<Token>, LexError> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut negate = false;

        for &element in elements {
            if is_whitespace(element) {
                if let Some(last) = tokens.last_mut() {
                    last.raw.push_str(element);
                }
            } else if element == "-" && !negate && minus_negates(&tokens) {
                negate = true;
            } else if negate {
                negate = false;
                tokens.push(self.create_token(&format!("-{}", element))?);
            } else {
                tokens.push(self.create_token(element)?);
            }
        }

        // Dangling minus at the end; the parser reports it
        if negate {
            tokens.push(self.create_token("-")?);
        }

        Ok(tokens)
    }

    fn create_token(&self, element: &str) -> Result<Token, LexError> {
        let kind = match element {
            e if e.starts_with(['"', '\'']) => TokenKind::Literal(Value::String(unquote(e)?)),
            e if self.number.is_match(e) => {
                let n = e
                    .parse::<f64>()
                    .map_err(|_| LexError::InvalidNumber(e.to_string()))?;
                TokenKind::Literal(Value::Number(n))
            }
            "true" => TokenKind::Literal(Value::Boolean(true)),
            "false" => TokenKind::Literal(Value::Boolean(false)),
            e => match self.symbols.get(e) {
                Some(kind) => kind.clone(),
                None if self.identifier.is_match(e) => TokenKind::Identifier(e.to_string()),
                None => return Err(LexError::InvalidToken(e.to_string())),
            },
        };
        Ok(Token::new(kind, element))
    }
}

fn is_whitespace(element: &str) -> bool {
    element.chars().all(char::is_whitespace)
}

fn minus_negates(tokens: &[Token]) -> bool {
    tokens.last().is_none_or(|last| !last.produces_value())
}

/// Strip the quotes from a string element and resolve its escapes.
///
/// Only the enclosing quote character and the backslash itself can be
/// escaped; any other backslash is kept verbatim.
fn unquote(element: &str) -> Result<String, LexError> {
    let mut chars = element.chars();
    let quote = chars.next();
    if element.len() < 2 || chars.next_back() != quote {
        return Err(LexError::UnterminatedString(element.to_string()));
    }

    let mut result = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.clone().next() {
                Some(next) if Some(next) == quote || next == '\\' => {
                    result.push(next);
                    chars.next();
                }
                _ => result.push('\\'),
            },
            _ => result.push(ch),
        }
    }

    Ok(result)
}

#[test]
fn test_literals_and_symbols() {
    let lexer = Lexer::new(&Grammar::default()).unwrap();
    let kinds: Vec<TokenKind> = lexer
        .tokenize("true != 'x' || y")
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Literal(Value::Boolean(true)),
            TokenKind::BinaryOp("!=".to_string()),
            TokenKind::Literal(Value::String("x".to_string())),
            TokenKind::BinaryOp("||".to_string()),
            TokenKind::Identifier("y".to_string()),
        ]
    );
}

#[test]
fn test_unquote() {
    assert_eq!(unquote(r#""a\"b""#).unwrap(), "a\"b");
    assert_eq!(unquote(r"'a\\b'").unwrap(), r"a\b");
    assert_eq!(unquote(r"'a\nb'").unwrap(), r"a\nb");
    assert_eq!(unquote(r#"'say \"hi\"'"#).unwrap(), r#"say \"hi\""#);
    assert!(matches!(unquote("\""), Err(LexError::UnterminatedString(_))));
}
