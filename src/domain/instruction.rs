//! Executable instruction tree.

use std::collections::BTreeMap;

use serde_json::Map;
use tracing::{debug, info, warn};

use crate::domain::context::Context;
use crate::domain::error::{DslError, ExecutionError};
use crate::domain::evaluator::{self, StatementOutcome};
use crate::domain::indicator::{
    self, IndicatorKind, calculate_atr, calculate_bollinger, calculate_ema, calculate_macd,
    calculate_rsi, calculate_sma,
};
use crate::domain::program::InstructionKind;
use crate::domain::value::Value;
use crate::domain::wait::Wait;

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_SOURCE: &str = "close";

/// An ordered block of instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub instructions: Vec<Instruction>,
}

impl Compound {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn execute(&self, ctx: &mut Context) -> Result<(), DslError> {
        for instruction in &self.instructions {
            instruction.execute(ctx)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Compound(Compound),
    If {
        position: usize,
        condition: String,
        block: Compound,
    },
    Operation {
        position: usize,
        statement: String,
    },
    Indicator {
        position: usize,
        params: Map<String, serde_json::Value>,
    },
    Trade {
        position: usize,
        payload: Map<String, serde_json::Value>,
    },
    Wait {
        position: usize,
        wait: Wait,
    },
}

impl Instruction {
    pub fn kind(&self) -> Option<InstructionKind> {
        match self {
            Instruction::Compound(_) => None,
            Instruction::If { .. } => Some(InstructionKind::If),
            Instruction::Operation { .. } => Some(InstructionKind::Operation),
            Instruction::Indicator { .. } => Some(InstructionKind::Indicator),
            Instruction::Trade { .. } => Some(InstructionKind::Trade),
            Instruction::Wait { .. } => Some(InstructionKind::Wait),
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            Instruction::Compound(_) => None,
            Instruction::If { position, .. }
            | Instruction::Operation { position, .. }
            | Instruction::Indicator { position, .. }
            | Instruction::Trade { position, .. }
            | Instruction::Wait { position, .. } => Some(*position),
        }
    }

    pub fn execute(&self, ctx: &mut Context) -> Result<(), DslError> {
        match self {
            Instruction::Compound(block) => block.execute(ctx),
            Instruction::If {
                position,
                condition,
                block,
            } => {
                let value = evaluator::evaluate(condition, ctx.variables()).map_err(|e| {
                    failure(InstructionKind::If, *position, condition, e.into())
                })?;
                let taken = value.is_truthy();
                debug!(position, condition = %condition, taken, "if");
                if taken {
                    block.execute(ctx)?;
                }
                Ok(())
            }
            Instruction::Operation {
                position,
                statement,
            } => {
                let outcome = evaluator::execute(statement, ctx.variables_mut()).map_err(|e| {
                    failure(InstructionKind::Operation, *position, statement, e.into())
                })?;
                match outcome {
                    StatementOutcome::Assigned(name) => {
                        debug!(position, statement = %statement, variable = %name, "operation");
                    }
                    StatementOutcome::Printed(line) => {
                        println!("{}", line);
                        info!(position, output = %line, "print");
                    }
                }
                Ok(())
            }
            Instruction::Indicator { position, params } => {
                run_indicator(params, ctx).map_err(|e| {
                    let text = serde_json::Value::Object(params.clone()).to_string();
                    failure(InstructionKind::Indicator, *position, &text, e)
                })?;
                Ok(())
            }
            Instruction::Trade { position, payload } => {
                let record = Value::from(serde_json::Value::Object(payload.clone()));
                info!(position, trade = %record, "trade recorded");
                ctx.record_trade(record);
                Ok(())
            }
            Instruction::Wait { position, wait } => {
                if wait.clamped {
                    warn!(
                        position,
                        requested = wait.requested,
                        seconds = wait.seconds,
                        "wait below minimum, clamped"
                    );
                }
                debug!(position, seconds = wait.seconds, "waiting");
                std::thread::sleep(wait.duration());
                Ok(())
            }
        }
    }
}

fn failure(kind: InstructionKind, position: usize, text: &str, source: ExecutionError) -> DslError {
    DslError::Execution {
        kind,
        position,
        text: text.to_string(),
        source,
    }
}

fn text_param<'a>(
    params: &'a Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<&'a str>, ExecutionError> {
    match params.get(key) {
        None => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ExecutionError::InvalidParameter {
            name: key.to_string(),
            reason: "must be a string".to_string(),
        }),
    }
}

fn required_text<'a>(
    params: &'a Map<String, serde_json::Value>,
    key: &str,
) -> Result<&'a str, ExecutionError> {
    text_param(params, key)?.ok_or_else(|| ExecutionError::MissingParameter(key.to_string()))
}

/// A non-negative whole number, falling back to `default` when absent.
fn integer_param(
    params: &Map<String, serde_json::Value>,
    key: &str,
    default: Option<usize>,
) -> Result<usize, ExecutionError> {
    let Some(value) = params.get(key) else {
        return default.ok_or_else(|| ExecutionError::MissingParameter(key.to_string()));
    };
    // 2^64 is the first float past u64::MAX
    let whole = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f < u64::MAX as f64)
            .map(|f| f as u64)
    });
    whole
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ExecutionError::InvalidParameter {
            name: key.to_string(),
            reason: format!("must be a non-negative integer, got {}", value),
        })
}

fn number_param(
    params: &Map<String, serde_json::Value>,
    key: &str,
    default: f64,
) -> Result<f64, ExecutionError> {
    match params.get(key) {
        None => Ok(default),
        Some(value) => value.as_f64().ok_or_else(|| ExecutionError::InvalidParameter {
            name: key.to_string(),
            reason: format!("must be a number, got {}", value),
        }),
    }
}

fn series<'a>(ctx: &'a Context, name: &str) -> Result<&'a [f64], ExecutionError> {
    ctx.series(name)
        .ok_or_else(|| ExecutionError::InvalidParameter {
            name: "source".to_string(),
            reason: format!("'{}' is not a numeric series", name),
        })
}

fn record(fields: &[(&str, f64)]) -> Value {
    Value::Record(
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Number(*v)))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// Compute the named indicator and store it under `var`. Multi-field
/// results are stored as a record and again as `<var>_<field>` numbers.
fn run_indicator(
    params: &Map<String, serde_json::Value>,
    ctx: &mut Context,
) -> Result<(), ExecutionError> {
    let name = required_text(params, "name")?;
    let var = required_text(params, "var")?.to_string();
    let kind: IndicatorKind = name
        .parse()
        .map_err(ExecutionError::UnsupportedIndicator)?;
    let source = text_param(params, "source")?.unwrap_or(DEFAULT_SOURCE);

    let value = match kind {
        IndicatorKind::Sma => {
            let period = integer_param(params, "period", Some(DEFAULT_PERIOD))?;
            Value::Number(calculate_sma(series(ctx, source)?, period)?)
        }
        IndicatorKind::Ema => {
            let period = integer_param(params, "period", Some(DEFAULT_PERIOD))?;
            Value::Number(calculate_ema(series(ctx, source)?, period)?)
        }
        IndicatorKind::Rsi => {
            let period = integer_param(params, "period", Some(DEFAULT_PERIOD))?;
            Value::Number(calculate_rsi(series(ctx, source)?, period)?)
        }
        IndicatorKind::Atr => {
            let period = integer_param(params, "period", Some(DEFAULT_PERIOD))?;
            Value::Number(calculate_atr(
                series(ctx, "high")?,
                series(ctx, "low")?,
                series(ctx, "close")?,
                period,
            )?)
        }
        IndicatorKind::BollingerBands => {
            let period = integer_param(params, "period", Some(DEFAULT_PERIOD))?;
            let multiplier = number_param(
                params,
                "multiplier",
                indicator::bollinger::DEFAULT_MULTIPLIER,
            )?;
            let bands = calculate_bollinger(series(ctx, source)?, period, multiplier)?;
            record(&[
                ("lower", bands.lower),
                ("middle", bands.middle),
                ("upper", bands.upper),
            ])
        }
        IndicatorKind::Macd => {
            let fast = integer_param(params, "fast", None)?;
            let slow = integer_param(params, "slow", None)?;
            let signal = integer_param(params, "signal", None)?;
            let macd = calculate_macd(series(ctx, source)?, fast, slow, signal)?;
            record(&[
                ("macd", macd.macd),
                ("signal", macd.signal),
                ("histogram", macd.histogram),
            ])
        }
    };

    if let Value::Record(fields) = &value {
        for (field, field_value) in fields {
            ctx.set(format!("{}_{}", var, field), field_value.clone());
        }
    }
    debug!(indicator = %kind, var = %var, value = %value, "indicator computed");
    ctx.set(var, value);
    Ok(())
}
