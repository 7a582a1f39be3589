//! Check expressions against a JSON context

use futures::executor::block_on;

use super::CliError;
use crate::{Jexl, Value};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON context; an empty object when absent
    pub context: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully
    Success(Value),
}

/// Execute a check operation
pub fn execute_check(jexl: &Jexl, options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        jexl.parse(&options.expression)?;
        return Ok(CheckResult::SyntaxValid);
    }

    let context = match options.context.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => {
            Value::from(serde_json::from_str::<serde_json::Value>(json)?)
        }
        _ => Value::Object(Default::default()),
    };

    let result = block_on(jexl.eval(&options.expression, &context))?;
    Ok(CheckResult::Success(result))
}

/// Tokenize an expression, one `kind raw` line per token
pub fn list_tokens(jexl: &Jexl, expression: &str) -> Result<Vec<String>, CliError> {
    let tokens = jexl.tokenize(expression)?;
    Ok(tokens
        .into_iter()
        .map(|token| format!("{:?} {:?}", token.kind, token.raw.trim()))
        .collect())
}
