//! Domain error types.
//!
//! Leaf errors (syntax, evaluation, indicator, wait, market data) are wrapped
//! by [`ParseError`] and [`ExecutionError`], which in turn surface through the
//! top-level [`DslError`].

use crate::domain::program::InstructionKind;

/// A syntax error with position information for expression parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("syntax error at position {position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let column = input
            .char_indices()
            .take_while(|(i, _)| *i < self.position)
            .count();
        let caret = " ".repeat(column) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Why an expression or statement could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("variable '{0}' not found in context")]
    UnknownVariable(String),

    #[error("{0} is not permitted in safe expressions")]
    UnsupportedConstruct(String),

    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("unsupported operand types for {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("bad operand type for unary {op}: {operand}")]
    BadOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{function}() takes {expected} arguments ({found} given)")]
    Arity {
        function: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Failure to evaluate one expression or statement, carrying the offending text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("error in safe evaluation of '{text}': {kind}")]
pub struct EvaluationError {
    pub text: String,
    #[source]
    pub kind: EvalErrorKind,
}

impl EvaluationError {
    pub fn new(text: impl Into<String>, kind: EvalErrorKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.kind,
            EvalErrorKind::UnsupportedConstruct(_) | EvalErrorKind::UnsupportedStatement(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("not enough data to calculate {indicator}: have {available} values, need {required}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        available: usize,
    },

    #[error("invalid period {period} for {indicator}")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },

    #[error("mismatched series lengths for {indicator}: high={highs}, low={lows}, close={closes}")]
    MismatchedSeries {
        indicator: &'static str,
        highs: usize,
        lows: usize,
        closes: usize,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaitError {
    #[error("value must be numeric or a string with a unit, got {found}")]
    InvalidType { found: &'static str },

    #[error("invalid format '{value}'")]
    InvalidFormat { value: String },

    #[error("invalid wait unit '{unit}', use 's', 'm' or 'h'")]
    InvalidUnit { unit: char },

    #[error("invalid wait value '{value}'")]
    InvalidValue { value: String },
}

/// Runtime failure raised by a single instruction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("missing '{0}' value in indicator data")]
    MissingParameter(String),

    #[error("indicator '{0}' not supported")]
    UnsupportedIndicator(String),

    #[error("invalid indicator parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

/// Structural failure while building the instruction tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("block started at position {start} was not closed with 'end'")]
    UnclosedBlock { start: usize },

    #[error("unexpected 'end' at position {position} without matching 'if'")]
    UnexpectedEnd { position: usize },

    #[error("'if' at position {position} nests blocks more than {limit} levels deep")]
    NestingTooDeep { position: usize, limit: usize },

    #[error("excess instructions: consumed {consumed} of {total}")]
    ExcessInstructions { consumed: usize, total: usize },

    #[error("invalid condition at position {position}: {source}")]
    InvalidCondition {
        position: usize,
        #[source]
        source: SyntaxError,
    },

    #[error("invalid {kind} payload at position {position}: {reason}")]
    InvalidPayload {
        position: usize,
        kind: InstructionKind,
        reason: String,
    },

    #[error("invalid wait at position {position}: {source}")]
    InvalidWait {
        position: usize,
        #[source]
        source: WaitError,
    },
}

/// Failure reported by a market-data source.
#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    #[error("no market data for {symbol} at {interval}: {reason}")]
    Unavailable {
        symbol: String,
        interval: String,
        reason: String,
    },

    #[error("malformed market data: {reason}")]
    Malformed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Top-level error type for stratdsl.
#[derive(Debug, thiserror::Error)]
pub enum DslError {
    #[error("strategy validation failed with {} errors", .errors.len())]
    Validation { errors: Vec<String> },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{kind} instruction at position {position} ('{text}') failed: {source}")]
    Execution {
        kind: InstructionKind,
        position: usize,
        text: String,
        #[source]
        source: ExecutionError,
    },

    #[error("failed to load market data for {symbol} at {interval}: {source}")]
    MarketData {
        symbol: String,
        interval: String,
        #[source]
        source: MarketDataError,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to load program {file}: {reason}")]
    ProgramLoad { file: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DslError {
    pub fn exit_code(&self) -> u8 {
        match self {
            DslError::Io(_) => 1,
            DslError::ConfigParse { .. }
            | DslError::ConfigMissing { .. }
            | DslError::ConfigInvalid { .. }
            | DslError::ProgramLoad { .. } => 2,
            DslError::Validation { .. } => 3,
            DslError::Parse(_) => 4,
            DslError::Execution { .. } => 5,
            DslError::MarketData { .. } => 6,
        }
    }
}

impl From<&DslError> for std::process::ExitCode {
    fn from(err: &DslError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn syntax_error_caret_points_at_position() {
        let err = SyntaxError {
            message: "expected expression".into(),
            position: 4,
        };
        let rendered = err.display_with_context("x > ");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "x > ");
        assert_eq!(lines[1], "    ^");
        assert!(lines[2].contains("expected expression"));
    }

    #[test]
    fn caret_counts_characters_not_bytes() {
        let err = SyntaxError {
            message: "unexpected".into(),
            position: "a → ".len(),
        };
        let rendered = err.display_with_context("a → b");
        assert_eq!(rendered.lines().nth(1), Some("    ^"));
    }

    #[test]
    fn execution_error_keeps_cause() {
        let err = DslError::Execution {
            kind: InstructionKind::Indicator,
            position: 3,
            text: "SMA".into(),
            source: ExecutionError::MissingParameter("var".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("indicator"));
        assert!(msg.contains("position 3"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "missing 'var' value in indicator data");
    }

    #[test]
    fn evaluation_error_unsupported() {
        let err = EvaluationError::new("f()", EvalErrorKind::UnsupportedConstruct("call".into()));
        assert!(err.is_unsupported());
        let err = EvaluationError::new("x", EvalErrorKind::UnknownVariable("x".into()));
        assert!(!err.is_unsupported());
    }

    #[test]
    fn exit_codes_by_category() {
        let validation = DslError::Validation {
            errors: vec!["bad".into()],
        };
        assert_eq!(validation.exit_code(), 3);
        let parse = DslError::Parse(ParseError::UnexpectedEnd { position: 0 });
        assert_eq!(parse.exit_code(), 4);
        let config = DslError::ConfigMissing {
            section: "market_data".into(),
            key: "symbol".into(),
        };
        assert_eq!(config.exit_code(), 2);
    }

    #[test]
    fn validation_error_counts() {
        let err = DslError::Validation {
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "strategy validation failed with 2 errors");
    }
}
