pub mod ast;
pub mod cli;
pub mod evaluator;
pub mod grammar;
pub mod jexl;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod transform;
pub mod value;

pub use ast::{Expr, Token, TokenKind};
pub use evaluator::{EvalError, Evaluator};
pub use grammar::{Element, Grammar};
pub use jexl::{Error, Jexl};
pub use lexer::{LexError, Lexer};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use transform::{Transform, TransformError, TransformResult, Transforms};
pub use value::Value;
