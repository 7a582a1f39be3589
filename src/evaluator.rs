use futures::{
    FutureExt,
    future::{self, BoxFuture, try_join, try_join_all},
};
use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

use crate::{
    ast::Expr,
    grammar::Grammar,
    transform::{TransformError, Transforms},
    value::Value,
};

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The expression applies a transform the table does not contain
    #[error("Transform '{0}' is not defined")]
    TransformNotFound(String),

    /// A host transform failed
    #[error("Transform '{name}' failed: {source}")]
    Transform {
        name: String,
        #[source]
        source: TransformError,
    },

    /// The expression uses an operator the grammar does not contain
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// The expression nests deeper than the evaluator allows
    #[error("Expression nesting exceeds the maximum depth of {0}")]
    TooDeep(usize),
}

/// Default bound on expression nesting during evaluation.
///
/// Every nested node is polled on the caller's stack. Chains of binary
/// operators (`a || b || c ...`) are evaluated flat and do not count
/// towards this limit per term.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Walks an [`Expr`] tree against a context.
///
/// An evaluator never changes after construction. Relative filters evaluate
/// their predicate once per element, each through a fresh evaluator whose
/// relative context is that element, so element evaluations share nothing
/// mutable.
///
/// Every node evaluates to a future. Sibling nodes (binary operands, transform
/// arguments, collection items, filtered elements) are polled concurrently and
/// combined once all of them have completed; the first failure rejects the
/// whole evaluation.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use jexl_lang::{Evaluator, Expr, Grammar, Transforms, Value};
///
/// let grammar = Grammar::default();
/// let transforms = Transforms::new();
/// let context = Value::from(serde_json::json!({"age": 42}));
///
/// let evaluator = Evaluator::new(&grammar, &transforms, &context);
/// let result = block_on(evaluator.eval(&Expr::identifier("age"))).unwrap();
/// assert_eq!(result, Value::from(42));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    grammar: &'a Grammar,
    transforms: &'a Transforms,
    context: &'a Value,
    relative_context: &'a Value,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator whose relative context is the context itself.
    pub fn new(grammar: &'a Grammar, transforms: &'a Transforms, context: &'a Value) -> Self {
        Evaluator {
            grammar,
            transforms,
            context,
            relative_context: context,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the nesting bound. Deeper expressions fail with
    /// [`EvalError::TooDeep`] instead of exhausting the stack.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// A new evaluator sharing grammar, transforms and context, with a
    /// different relative context.
    pub fn with_relative_context<'b>(&'b self, relative_context: &'b Value) -> Evaluator<'b> {
        Evaluator {
            grammar: self.grammar,
            transforms: self.transforms,
            context: self.context,
            relative_context,
            max_depth: self.max_depth,
        }
    }

    /// Evaluate an expression.
    pub fn eval<'b>(&'b self, expr: &'b Expr) -> BoxFuture<'b, Result<Value, EvalError>> {
        self.eval_at(expr, 0)
    }

    fn eval_at<'b>(
        &'b self,
        expr: &'b Expr,
        depth: usize,
    ) -> BoxFuture<'b, Result<Value, EvalError>> {
        if depth > self.max_depth {
            return future::ready(Err(EvalError::TooDeep(self.max_depth))).boxed();
        }
        self.eval_node(expr, depth).boxed()
    }

    async fn eval_node(&self, expr: &Expr, depth: usize) -> Result<Value, EvalError> {
        let next = depth + 1;
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier { name, relative } => {
                let scope = if *relative {
                    self.relative_context
                } else {
                    self.context
                };
                Ok(scope.get_property(&Value::String(name.clone())))
            }
            Expr::BinaryOp { .. } => self.eval_binary_chain(expr, next).await,
            Expr::UnaryOp { operator, right } => {
                let right = self.eval_at(right, next).await?;
                self.grammar
                    .eval_unary(operator, &right)
                    .ok_or_else(|| EvalError::UnknownOperator(operator.clone()))
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.eval_at(test, next).await?;
                if !test.is_truthy() {
                    return self.eval_at(alternate, next).await;
                }
                match consequent {
                    Some(consequent) => self.eval_at(consequent, next).await,
                    None => Ok(test),
                }
            }
            Expr::MemberAccess { subject, property } => {
                let subject = self.eval_at(subject, next).await?;
                Ok(member(&subject, property))
            }
            Expr::Filter {
                subject,
                predicate,
                relative: true,
            } => {
                let subject = self.eval_at(subject, next).await?;
                self.filter_relative(subject, predicate, next).await
            }
            Expr::Filter {
                subject,
                predicate,
                relative: false,
            } => {
                let (subject, key) =
                    try_join(self.eval_at(subject, next), self.eval_at(predicate, next)).await?;
                Ok(filter_static(subject, &key))
            }
            Expr::Transform {
                subject,
                name,
                args,
            } => self.apply_transform(subject, name, args, next).await,
            Expr::Object(entries) => {
                let values =
                    try_join_all(entries.iter().map(|(_, value)| self.eval_at(value, next)))
                        .await?;
                let map: IndexMap<String, Value> = entries
                    .iter()
                    .map(|(key, _)| key.clone())
                    .zip(values)
                    .collect();
                Ok(Value::Object(map))
            }
            Expr::Array(items) => {
                let values =
                    try_join_all(items.iter().map(|item| self.eval_at(item, next))).await?;
                Ok(Value::Array(values))
            }
        }
    }

    /// Evaluate a binary operator together with every binary operator down
    /// its left spine. `a || b || c` parses as `(a || b) || c`; its operands
    /// are gathered side by side at one depth and folded from the left, so
    /// long chains do not nest on the stack.
    async fn eval_binary_chain(&self, expr: &Expr, depth: usize) -> Result<Value, EvalError> {
        let mut operators = Vec::new();
        let mut operands = Vec::new();
        let mut node = expr;
        while let Expr::BinaryOp {
            operator,
            left,
            right,
        } = node
        {
            operators.push(operator);
            operands.push(right.as_ref());
            node = left.as_ref();
        }
        operands.push(node);
        operators.reverse();
        operands.reverse();

        let values =
            try_join_all(operands.iter().map(|&operand| self.eval_at(operand, depth))).await?;
        let mut values = values.into_iter();
        let mut result = values.next().unwrap_or_default();
        for (operator, right) in operators.into_iter().zip(values) {
            result = self
                .grammar
                .eval_binary(operator, &result, &right)
                .ok_or_else(|| EvalError::UnknownOperator(operator.clone()))?;
        }
        Ok(result)
    }

    /// Keep the elements of `subject` for which `predicate` is truthy when
    /// evaluated with the element as relative context. A non-array subject
    /// is filtered as a single-element array.
    async fn filter_relative(
        &self,
        subject: Value,
        predicate: &Expr,
        depth: usize,
    ) -> Result<Value, EvalError> {
        let items = match subject {
            Value::Array(items) => items,
            other => vec![other],
        };

        let verdicts = try_join_all(items.iter().map(|item| {
            let scope = self.with_relative_context(item);
            async move { scope.eval_at(predicate, depth).await }
        }))
        .await?;

        let kept = items
            .into_iter()
            .zip(verdicts)
            .filter(|(_, verdict)| verdict.is_truthy())
            .map(|(item, _)| item)
            .collect();
        Ok(Value::Array(kept))
    }

    async fn apply_transform(
        &self,
        subject: &Expr,
        name: &str,
        args: &[Expr],
        depth: usize,
    ) -> Result<Value, EvalError> {
        let transform = self
            .transforms
            .get(name)
            .ok_or_else(|| EvalError::TransformNotFound(name.to_string()))?;

        let (subject, args) = try_join(
            self.eval_at(subject, depth),
            try_join_all(args.iter().map(|arg| self.eval_at(arg, depth))),
        )
        .await?;

        trace!("applying transform '{}' with {} argument(s)", name, args.len());
        transform
            .apply(subject, args)
            .await
            .map_err(|source| EvalError::Transform {
                name: name.to_string(),
                source,
            })
    }
}

/// Dot access. Arrays are entered through their first element, and
/// nullish subjects have no members.
fn member(subject: &Value, property: &str) -> Value {
    let key = Value::String(property.to_string());
    match subject {
        Value::Undefined | Value::Null => Value::Undefined,
        Value::Array(items) => items
            .first()
            .map(|first| first.get_property(&key))
            .unwrap_or_default(),
        other => other.get_property(&key),
    }
}

/// Non-relative bracket: a boolean gates the subject, anything else is an
/// index or key into it.
fn filter_static(subject: Value, key: &Value) -> Value {
    match key {
        Value::Boolean(true) => subject,
        Value::Boolean(false) => Value::Undefined,
        _ if subject.is_nullish() => Value::Undefined,
        _ => subject.get_property(key),
    }
}
