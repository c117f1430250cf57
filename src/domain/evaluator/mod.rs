//! Sandboxed evaluation of condition expressions and operation statements.
//!
//! Input passes through operator rewriting, tokenizing and parsing into a
//! syntax tree, which is checked against the allow-list in full before any
//! node is evaluated.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod rewrite;

pub use eval::{ALLOWED_FUNCTIONS, OUTPUT_FUNCTION, StatementOutcome};
pub use rewrite::rewrite_operators;

use crate::domain::error::{EvalErrorKind, EvaluationError, SyntaxError};
use crate::domain::value::{Value, Variables};

/// A syntax failure keeps the rewritten text, the one its position indexes.
fn syntax_failure(source: &str, error: SyntaxError) -> EvaluationError {
    EvaluationError::new(source, EvalErrorKind::Syntax(error))
}

/// Evaluate one expression against the variables.
pub fn evaluate(expression: &str, variables: &Variables) -> Result<Value, EvaluationError> {
    let wrap = |kind: EvalErrorKind| EvaluationError::new(expression, kind);
    let source = rewrite_operators(expression);
    let expr = parser::parse_expression(&source).map_err(|e| syntax_failure(&source, e))?;
    eval::ensure_permitted(&expr).map_err(wrap)?;
    eval::evaluate(&expr, variables).map_err(wrap)
}

/// Execute exactly one statement. On failure the variables are unchanged.
pub fn execute(
    statement: &str,
    variables: &mut Variables,
) -> Result<StatementOutcome, EvaluationError> {
    let wrap = |kind: EvalErrorKind| EvaluationError::new(statement, kind);
    let source = rewrite_operators(statement);
    let statements =
        parser::parse_statements(&source).map_err(|e| syntax_failure(&source, e))?;
    let stmt = match statements.as_slice() {
        [stmt] => stmt,
        [] => {
            return Err(wrap(EvalErrorKind::UnsupportedStatement(
                "empty statement".to_string(),
            )));
        }
        _ => {
            return Err(wrap(EvalErrorKind::UnsupportedStatement(format!(
                "expected one statement, found {}",
                statements.len()
            ))));
        }
    };
    eval::execute(stmt, variables).map_err(wrap)
}

/// Whether `expression` is a well-formed expression once operators are rewritten.
/// Error positions are byte offsets into `rewrite_operators(expression)`.
pub fn check_expression(expression: &str) -> Result<(), SyntaxError> {
    parser::parse_expression(&rewrite_operators(expression)).map(|_| ())
}

/// Whether `statement` is syntactically valid. Allow-list violations are
/// only reported when the statement runs.
pub fn check_statement(statement: &str) -> Result<(), SyntaxError> {
    parser::parse_statements(&rewrite_operators(statement)).map(|_| ())
}
