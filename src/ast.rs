//! # Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and syntax tree of the filter expression
//! language: a small, side-effect-free language for targeting rules that are
//! evaluated against a context supplied by the host.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes produced by the parser
//!
//! ## Quick Start
//!
//! ```text
//! normandy.channel in ["beta", "nightly"] && normandy.version >= 70
//! ```
//!
//! ## Core Concepts
//!
//! ### Context and relative context
//!
//! Identifiers read from the context. Inside a bracket whose first token is
//! a dot, identifiers starting with `.` read from the array element being
//! filtered instead:
//!
//! ```text
//! addons[.id == "some@addon" && .isActive]
//! ```
//!
//! ### Brackets
//!
//! - **Relative filter** `list[.field == 1]` - keep matching elements
//! - **Index / key** `list[0]`, `obj["key"]` - look up a single value
//! - **Gate** `value[flag]` - `value` when `flag` is `true`, absent when `false`
//!
//! ### Transforms
//!
//! Host functions are applied with a pipe:
//!
//! ```text
//! normandy.userId|stableSample(0.5)
//! ```
//!
//! ### Missing paths
//!
//! Walking through something that does not exist yields an absent value,
//! never an error:
//!
//! ```text
//! foo.bar["baz"].tok   // absent when foo is {}
//! ```
pub mod expressions;
pub mod tokens;

pub use expressions::Expr;
pub use tokens::{Token, TokenKind};
