//! Static checks over an untrusted program.
//!
//! Walks the records the way the parser does, without building anything, and
//! collects every defect instead of stopping at the first.

use tracing::{error, info, warn};

use crate::domain::error::WaitError;
use crate::domain::evaluator;
use crate::domain::indicator::IndicatorKind;
use crate::domain::program::{InstructionRecord, MAX_BLOCK_DEPTH};
use crate::domain::wait::Wait;

pub const TRADE_KEYS: [&str; 3] = ["action", "symbol", "quantity"];
pub const TRADE_ACTIONS: [&str; 2] = ["buy", "sell"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Validator<'a> {
    records: &'a [InstructionRecord],
    errors: Vec<String>,
}

impl<'a> Validator<'a> {
    pub fn new(records: &'a [InstructionRecord]) -> Self {
        Self {
            records,
            errors: Vec::new(),
        }
    }

    pub fn validate(mut self) -> ValidationReport {
        info!(records = self.records.len(), "starting strategy validation");
        self.validate_block(0, None, 0);
        if self.errors.is_empty() {
            info!("strategy validation completed successfully");
        } else {
            error!(
                errors = self.errors.len(),
                "strategy validation failed"
            );
        }
        ValidationReport {
            errors: self.errors,
        }
    }

    fn push(&mut self, message: String) {
        error!("{}", message);
        self.errors.push(message);
    }

    /// Returns the index after the block. `opened_at` is the position of the
    /// `if` that owns the block, if any; `depth` counts enclosing blocks.
    fn validate_block(&mut self, start: usize, opened_at: Option<usize>, depth: usize) -> usize {
        let mut i = start;
        while let Some(record) = self.records.get(i) {
            match record {
                InstructionRecord::If(condition) => {
                    self.validate_if(condition, i);
                    if depth >= MAX_BLOCK_DEPTH {
                        self.push(format!(
                            "Error at 'if' at position {}: blocks nested more than {} levels deep.",
                            i, MAX_BLOCK_DEPTH
                        ));
                        i = self.skip_block(i);
                    } else {
                        i = self.validate_block(i + 1, Some(i), depth + 1);
                    }
                }
                InstructionRecord::End(_) => {
                    if opened_at.is_some() {
                        return i + 1;
                    }
                    self.push(format!(
                        "Unexpected 'end' at position {} without matching 'if'.",
                        i
                    ));
                    i += 1;
                }
                InstructionRecord::Operation(statement) => {
                    self.validate_operation(statement, i);
                    i += 1;
                }
                InstructionRecord::Indicator(data) => {
                    self.validate_indicator(data, i);
                    i += 1;
                }
                InstructionRecord::Trade(data) => {
                    self.validate_trade(data, i);
                    i += 1;
                }
                InstructionRecord::Wait(value) => {
                    self.validate_wait(value, i);
                    i += 1;
                }
                InstructionRecord::Unknown(raw) => {
                    warn!(position = i, record = %raw, "unknown instruction ignored");
                    i += 1;
                }
            }
        }

        if let Some(position) = opened_at {
            self.push(format!(
                "Unclosed 'if' block detected starting at position {}.",
                position
            ));
        }
        i
    }

    /// Step over the block opened at `opened_at` without inspecting it.
    fn skip_block(&mut self, opened_at: usize) -> usize {
        let mut open = 1usize;
        for (offset, record) in self.records[opened_at + 1..].iter().enumerate() {
            match record {
                InstructionRecord::If(_) => open += 1,
                InstructionRecord::End(_) => {
                    open -= 1;
                    if open == 0 {
                        return opened_at + offset + 2;
                    }
                }
                _ => {}
            }
        }
        self.push(format!(
            "Unclosed 'if' block detected starting at position {}.",
            opened_at
        ));
        self.records.len()
    }

    fn validate_if(&mut self, condition: &serde_json::Value, i: usize) {
        let Some(text) = condition.as_str() else {
            self.push(format!(
                "Error at 'if' at position {}: condition must be a string.",
                i
            ));
            return;
        };
        if let Err(e) = evaluator::check_expression(text) {
            self.push(format!(
                "Error in condition '{}' at position {}: {}",
                text, i, e
            ));
        }
    }

    fn validate_operation(&mut self, statement: &serde_json::Value, i: usize) {
        let Some(text) = statement.as_str() else {
            self.push(format!(
                "Error in operation at position {}: must be a string.",
                i
            ));
            return;
        };
        if let Err(e) = evaluator::check_statement(text) {
            self.push(format!(
                "Error in operation '{}' at position {}: {}",
                text, i, e
            ));
        }
    }

    fn validate_indicator(&mut self, data: &serde_json::Value, i: usize) {
        let Some(data) = data.as_object() else {
            self.push(format!(
                "Error in indicator at position {}: payload must be an object.",
                i
            ));
            return;
        };
        let Some(name) = data.get("name") else {
            self.push(format!(
                "Error in indicator at position {}: missing key 'name'.",
                i
            ));
            return;
        };
        let label = name.as_str().map(str::to_string).unwrap_or_else(|| name.to_string());
        let Ok(kind) = label.parse::<IndicatorKind>() else {
            self.push(format!(
                "Error in indicator at position {}: '{}' is not supported.",
                i, label
            ));
            return;
        };
        let prefix = match kind {
            IndicatorKind::Macd => "MACD indicator",
            _ => "indicator",
        };
        for key in kind.required_keys() {
            if !data.contains_key(*key) {
                self.push(format!(
                    "Error in {} at position {}: missing key '{}'.",
                    prefix, i, key
                ));
            }
        }
    }

    fn validate_trade(&mut self, data: &serde_json::Value, i: usize) {
        let Some(data) = data.as_object() else {
            self.push(format!(
                "Error in trade at position {}: payload must be an object.",
                i
            ));
            return;
        };
        for key in TRADE_KEYS {
            if !data.contains_key(key) {
                self.push(format!(
                    "Error in trade at position {}: missing key '{}'.",
                    i, key
                ));
            }
        }
        if let Some(action) = data.get("action") {
            let valid = action
                .as_str()
                .is_some_and(|a| TRADE_ACTIONS.contains(&a));
            if !valid {
                let shown = action.as_str().map(str::to_string).unwrap_or_else(|| action.to_string());
                self.push(format!(
                    "Error in trade at position {}: invalid action '{}'.",
                    i, shown
                ));
            }
        }
    }

    fn validate_wait(&mut self, value: &serde_json::Value, i: usize) {
        let message = match Wait::from_json(value) {
            Ok(_) => return,
            Err(WaitError::InvalidFormat { value } | WaitError::InvalidValue { value }) => {
                format!("invalid format '{}'", value)
            }
            Err(WaitError::InvalidUnit { .. }) => {
                format!("invalid format '{}'", value.as_str().unwrap_or_default())
            }
            Err(e @ WaitError::InvalidType { .. }) => e.to_string(),
        };
        self.push(format!("Error in wait at position {}: {}.", i, message));
    }
}

/// Validate a program in one pass.
pub fn validate(records: &[InstructionRecord]) -> ValidationReport {
    Validator::new(records).validate()
}
