//! Builds the instruction tree from a flat program, enforcing if/end nesting.

use serde_json::Map;
use tracing::{info, warn};

use crate::domain::error::ParseError;
use crate::domain::evaluator;
use crate::domain::instruction::{Compound, Instruction};
use crate::domain::program::{InstructionKind, InstructionRecord, MAX_BLOCK_DEPTH};
use crate::domain::wait::Wait;

struct ProgramParser<'a> {
    records: &'a [InstructionRecord],
    pos: usize,
}

impl<'a> ProgramParser<'a> {
    fn new(records: &'a [InstructionRecord]) -> Self {
        Self { records, pos: 0 }
    }

    /// Parse records until input runs out or, inside a block, until the
    /// closing `end` (which is consumed). `depth` counts enclosing blocks.
    fn parse_block(
        &mut self,
        opened_at: Option<usize>,
        depth: usize,
    ) -> Result<Compound, ParseError> {
        let mut instructions = Vec::new();
        while let Some(record) = self.records.get(self.pos) {
            let position = self.pos;
            match record {
                InstructionRecord::End(_) => {
                    if opened_at.is_none() {
                        return Err(ParseError::UnexpectedEnd { position });
                    }
                    self.pos += 1;
                    return Ok(Compound::new(instructions));
                }
                InstructionRecord::If(condition) => {
                    let condition = condition_text(condition, position)?;
                    if depth >= MAX_BLOCK_DEPTH {
                        return Err(ParseError::NestingTooDeep {
                            position,
                            limit: MAX_BLOCK_DEPTH,
                        });
                    }
                    self.pos += 1;
                    let block = self.parse_block(Some(position), depth + 1)?;
                    instructions.push(Instruction::If {
                        position,
                        condition,
                        block,
                    });
                }
                InstructionRecord::Operation(statement) => {
                    let Some(statement) = statement.as_str() else {
                        return Err(ParseError::InvalidPayload {
                            position,
                            kind: InstructionKind::Operation,
                            reason: "statement must be a string".to_string(),
                        });
                    };
                    instructions.push(Instruction::Operation {
                        position,
                        statement: statement.to_string(),
                    });
                    self.pos += 1;
                }
                InstructionRecord::Indicator(params) => {
                    let params = object_payload(params, position, InstructionKind::Indicator)?;
                    instructions.push(Instruction::Indicator { position, params });
                    self.pos += 1;
                }
                InstructionRecord::Trade(payload) => {
                    let payload = object_payload(payload, position, InstructionKind::Trade)?;
                    instructions.push(Instruction::Trade { position, payload });
                    self.pos += 1;
                }
                InstructionRecord::Wait(value) => {
                    let wait = Wait::from_json(value)
                        .map_err(|source| ParseError::InvalidWait { position, source })?;
                    if wait.clamped {
                        warn!(
                            position,
                            requested = wait.requested,
                            seconds = wait.seconds,
                            "wait below minimum, clamping"
                        );
                    }
                    instructions.push(Instruction::Wait { position, wait });
                    self.pos += 1;
                }
                InstructionRecord::Unknown(raw) => {
                    warn!(position, record = %raw, "skipping unrecognised instruction");
                    self.pos += 1;
                }
            }
        }

        match opened_at {
            Some(start) => Err(ParseError::UnclosedBlock { start }),
            None => Ok(Compound::new(instructions)),
        }
    }
}

fn condition_text(condition: &serde_json::Value, position: usize) -> Result<String, ParseError> {
    let Some(text) = condition.as_str() else {
        return Err(ParseError::InvalidPayload {
            position,
            kind: InstructionKind::If,
            reason: "condition must be a string".to_string(),
        });
    };
    evaluator::check_expression(text)
        .map_err(|source| ParseError::InvalidCondition { position, source })?;
    Ok(text.to_string())
}

fn object_payload(
    payload: &serde_json::Value,
    position: usize,
    kind: InstructionKind,
) -> Result<Map<String, serde_json::Value>, ParseError> {
    payload
        .as_object()
        .cloned()
        .ok_or_else(|| ParseError::InvalidPayload {
            position,
            kind,
            reason: "payload must be an object".to_string(),
        })
}

/// Parse a whole program into its root block.
pub fn parse(records: &[InstructionRecord]) -> Result<Instruction, ParseError> {
    info!(records = records.len(), "parsing program");
    let mut parser = ProgramParser::new(records);
    let root = parser.parse_block(None, 0)?;
    if parser.pos != records.len() {
        return Err(ParseError::ExcessInstructions {
            consumed: parser.pos,
            total: records.len(),
        });
    }
    info!(instructions = root.len(), "program parsed");
    Ok(Instruction::Compound(root))
}
