use std::{mem, vec};

use log::trace;
use thiserror::Error;

use crate::{
    ast::{Expr, Token, TokenKind},
    grammar::Grammar,
    value::Value,
};

/// Errors raised for structurally invalid token sequences.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// No tokens at all
    #[error("Empty expression")]
    EmptyExpression,

    /// A token in a position where it cannot appear
    #[error("Unexpected token '{found}': expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },

    /// The expression stopped before it was complete
    #[error("Unexpected end of expression: expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    /// An operator token the grammar no longer knows
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Groups, brackets or prefix operators nested beyond [`MAX_NESTING`]
    #[error("Expression nesting exceeds the maximum depth of {0}")]
    TooDeep(usize),
}

/// Deepest nesting of sub-expressions (groups, brackets, arguments,
/// conditional branches, prefix operators) the parser descends into.
pub const MAX_NESTING: usize = 64;

/// Builds an [`Expr`] tree from tokens.
///
/// Binary operators are resolved by precedence climbing against the
/// grammar table; grouping, member access, filters, transforms,
/// conditionals and collection literals are handled by recursive descent.
pub struct Parser<'g> {
    grammar: &'g Grammar,
    tokens: vec::IntoIter<Token>,
    current_token: Option<Token>,
    token_count: usize,
    depth: usize,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar, tokens: Vec<Token>) -> Self {
        let token_count = tokens.len();
        let mut tokens = tokens.into_iter();
        let current_token = tokens.next();
        Parser {
            grammar,
            tokens,
            current_token,
            token_count,
            depth: 0,
        }
    }

    /// Parse the whole token sequence into a single expression.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.current_token.is_none() {
            return Err(ParseError::EmptyExpression);
        }

        let expr = self.parse_expression()?;

        if let Some(token) = &self.current_token {
            return Err(unexpected(token, "end of expression"));
        }

        trace!("parsed expression from {} tokens", self.token_count);
        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.tokens.next();
    }

    /// Take the current token and move past it.
    fn bump(&mut self) -> Option<Token> {
        mem::replace(&mut self.current_token, self.tokens.next())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current_token
            .as_ref()
            .is_some_and(|token| mem::discriminant(&token.kind) == mem::discriminant(kind))
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        match &self.current_token {
            Some(token) if mem::discriminant(&token.kind) == mem::discriminant(&kind) => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(unexpected(token, expected)),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn expect_identifier(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.bump() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                ..
            }) => Ok(name),
            Some(token) => Err(unexpected(&token, expected)),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_conditional)
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// `test ? consequent : alternate`, or `test ?: alternate`
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_binary(0)?;

        if !self.check(&TokenKind::Question) {
            return Ok(test);
        }
        self.advance(); // consume '?'

        let consequent = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        self.expect(TokenKind::Colon, "':' in conditional")?;
        let alternate = self.parse_expression()?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent,
            alternate: Box::new(alternate),
        })
    }

    /// Precedence climbing: fold in every binary operator that binds at
    /// least as tightly as `min_precedence`. Right-hand sides are parsed one
    /// level higher, which makes operators of equal precedence associate to
    /// the left.
    fn parse_binary(&mut self, min_precedence: u32) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match &self.current_token {
                Some(Token {
                    kind: TokenKind::BinaryOp(op),
                    ..
                }) => op.clone(),
                _ => break,
            };

            let precedence = self
                .grammar
                .precedence(&operator)
                .ok_or_else(|| ParseError::UnknownOperator(operator.clone()))?;
            if precedence < min_precedence {
                break;
            }

            self.advance();
            let right = self.parse_binary(precedence.saturating_add(1))?;

            left = Expr::BinaryOp {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(Token {
            kind: TokenKind::UnaryOp(op),
            ..
        }) = &self.current_token
        {
            let operator = op.clone();
            self.advance();
            let right = self.nested(Self::parse_unary)?;
            return Ok(Expr::UnaryOp {
                operator,
                right: Box::new(right),
            });
        }

        self.parse_postfix()
    }

    /// Member access, filters and transforms trailing an operand.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::Dot) {
                self.advance(); // consume '.'
                let property = self.expect_identifier("identifier after '.'")?;
                expr = Expr::MemberAccess {
                    subject: Box::new(expr),
                    property,
                };
            } else if self.check(&TokenKind::OpenBracket) {
                self.advance(); // consume '['
                let relative = self.check(&TokenKind::Dot);
                let predicate = self.parse_expression()?;
                self.expect(TokenKind::CloseBracket, "']' after filter")?;
                expr = Expr::Filter {
                    subject: Box::new(expr),
                    predicate: Box::new(predicate),
                    relative,
                };
            } else if self.check(&TokenKind::Pipe) {
                self.advance(); // consume '|'
                let name = self.expect_identifier("transform name after '|'")?;
                let args = if self.check(&TokenKind::OpenParen) {
                    self.advance();
                    self.parse_list(TokenKind::CloseParen, "')' after transform arguments")?
                } else {
                    vec![]
                };
                expr = Expr::Transform {
                    subject: Box::new(expr),
                    name,
                    args,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse primary expressions (atoms): literals, identifiers, relative
    /// identifiers, groups and collection literals
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = match self.bump() {
            Some(token) => token,
            None => return Err(ParseError::UnexpectedEnd { expected: "operand" }),
        };

        match token.kind {
            TokenKind::Literal(value) => Ok(Expr::Literal(value)),
            TokenKind::Identifier(name) => Ok(Expr::Identifier {
                name,
                relative: false,
            }),
            TokenKind::Dot => {
                let name = self.expect_identifier("identifier after '.'")?;
                Ok(Expr::Identifier {
                    name,
                    relative: true,
                })
            }
            TokenKind::OpenParen => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseParen, "')' after group")?;
                Ok(expr)
            }
            TokenKind::OpenCurl => self.parse_object_literal(),
            TokenKind::OpenBracket => Ok(Expr::Array(
                self.parse_list(TokenKind::CloseBracket, "']' after array items")?,
            )),
            _ => Err(unexpected(&token, "operand")),
        }
    }

    /// Comma-separated expressions up to (and including) `close`.
    fn parse_list(
        &mut self,
        close: TokenKind,
        expected: &'static str,
    ) -> Result<Vec<Expr>, ParseError> {
        let mut items = vec![];

        if self.check(&close) {
            self.advance();
            return Ok(items);
        }

        loop {
            items.push(self.parse_expression()?);

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect(close, expected)?;
                return Ok(items);
            }
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut entries = vec![];

        if self.check(&TokenKind::CloseCurl) {
            self.advance();
            return Ok(Expr::Object(entries));
        }

        loop {
            let key = match self.bump() {
                Some(Token {
                    kind: TokenKind::Identifier(name),
                    ..
                }) => name,
                Some(Token {
                    kind: TokenKind::Literal(Value::String(name)),
                    ..
                }) => name,
                Some(token) => return Err(unexpected(&token, "object key")),
                None => return Err(ParseError::UnexpectedEnd { expected: "object key" }),
            };

            self.expect(TokenKind::Colon, "':' after object key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect(TokenKind::CloseCurl, "'}' after object entries")?;
                return Ok(Expr::Object(entries));
            }
        }
    }
}

fn unexpected(token: &Token, expected: &'static str) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.raw.trim().to_string(),
        expected,
    }
}
