use std::{
    future::Future,
    sync::{Arc, OnceLock},
};

use log::debug;
use thiserror::Error;

use crate::{
    ast::{Expr, Token},
    evaluator::{DEFAULT_MAX_DEPTH, EvalError, Evaluator},
    grammar::Grammar,
    lexer::{LexError, Lexer},
    parser::{ParseError, Parser},
    transform::{Transform, TransformResult, Transforms},
    value::Value,
};

/// Any failure of an evaluation: lexing, parsing or evaluating.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// The expression engine: a grammar plus a transform table.
///
/// Evaluations are independent of each other. Nothing an evaluation does is
/// remembered by the engine, so the same expression evaluated twice against
/// the same context gives the same result.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use jexl_lang::{Jexl, Value};
/// use serde_json::json;
///
/// let mut jexl = Jexl::new();
/// jexl.add_transform("upper", |subject, _args| {
///     Ok(Value::String(subject.to_js_string().to_uppercase()))
/// });
///
/// let context = Value::from(json!({"user": {"name": "ada", "age": 36}}));
/// let result = block_on(jexl.eval("user.name|upper + ' ' + (user.age >= 18)", &context)).unwrap();
/// assert_eq!(result, Value::from("ADA true"));
/// ```
#[derive(Debug, Clone)]
pub struct Jexl {
    grammar: Grammar,
    transforms: Transforms,
    lexer: OnceLock<Lexer>,
    max_depth: usize,
}

impl Default for Jexl {
    fn default() -> Self {
        Jexl {
            grammar: Grammar::default(),
            transforms: Transforms::default(),
            lexer: OnceLock::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Jexl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound on expression nesting during evaluation; deeper expressions
    /// fail with [`EvalError::TooDeep`]. Raise it only when evaluations run
    /// on threads with stacks larger than the default.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    /// Register a transform that completes immediately.
    pub fn add_transform<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Value, Vec<Value>) -> TransformResult + Send + Sync + 'static,
    {
        self.transforms.add_sync(name, f);
    }

    /// Register a transform that returns a future.
    pub fn add_async_transform<F, Fut>(&mut self, name: &str, f: F)
    where
        F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransformResult> + Send + 'static,
    {
        self.transforms.add_async(name, f);
    }

    /// Register several transforms at once.
    pub fn add_transforms<T, I>(&mut self, transforms: I)
    where
        T: Transform + 'static,
        I: IntoIterator<Item = (String, T)>,
    {
        for (name, transform) in transforms {
            self.transforms.insert(&name, transform);
        }
    }

    pub fn get_transform(&self, name: &str) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(name)
    }

    /// Add (or replace) a binary operator.
    pub fn add_binary_op<F>(&mut self, symbol: &str, precedence: u32, eval: F)
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        self.grammar.add_binary_op(symbol, precedence, eval);
        self.lexer = OnceLock::new();
    }

    /// Add (or replace) a unary prefix operator.
    pub fn add_unary_op<F>(&mut self, symbol: &str, eval: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.grammar.add_unary_op(symbol, eval);
        self.lexer = OnceLock::new();
    }

    /// Remove an operator from the grammar.
    pub fn remove_op(&mut self, symbol: &str) -> bool {
        let removed = self.grammar.remove_op(symbol);
        if removed {
            self.lexer = OnceLock::new();
        }
        removed
    }

    /// The lexer for the current grammar, compiled on first use.
    fn lexer(&self) -> Result<&Lexer, LexError> {
        if let Some(lexer) = self.lexer.get() {
            return Ok(lexer);
        }
        let lexer = Lexer::new(&self.grammar)?;
        Ok(self.lexer.get_or_init(|| lexer))
    }

    pub fn tokenize(&self, expression: &str) -> Result<Vec<Token>, LexError> {
        self.lexer()?.tokenize(expression)
    }

    pub fn parse(&self, expression: &str) -> Result<Expr, Error> {
        let tokens = self.tokenize(expression)?;
        Ok(Parser::new(&self.grammar, tokens).parse()?)
    }

    /// Evaluate an expression against a context.
    pub async fn eval(&self, expression: &str, context: &Value) -> Result<Value, Error> {
        debug!("evaluating expression: {}", expression);
        let result = match self.parse(expression) {
            Ok(ast) => self.eval_ast(&ast, context).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            debug!("evaluation of '{}' failed: {}", expression, e);
        }
        result
    }

    /// Evaluate an already parsed expression against a context.
    pub async fn eval_ast(&self, ast: &Expr, context: &Value) -> Result<Value, Error> {
        let evaluator =
            Evaluator::new(&self.grammar, &self.transforms, context).with_max_depth(self.max_depth);
        Ok(evaluator.eval(ast).await?)
    }
}
