//! Strategy programs loaded from JSON files.
//!
//! A program file holds either the bare instruction array or an object
//! `{"name": ..., "instructions": [...]}`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::error::DslError;
use crate::domain::instruction::Instruction;
use crate::domain::parser;
use crate::domain::program::Program;
use crate::domain::validator::{self, ValidationReport};

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: Option<String>,
    pub program: Program,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramFile {
    Bare(Program),
    Named {
        #[serde(default)]
        name: Option<String>,
        instructions: Program,
    },
}

impl Strategy {
    pub fn new(program: Program) -> Self {
        Self {
            name: None,
            program,
        }
    }

    pub fn from_json_str(source: &str, origin: &str) -> Result<Self, DslError> {
        let file: ProgramFile =
            serde_json::from_str(source).map_err(|e| DslError::ProgramLoad {
                file: origin.to_string(),
                reason: e.to_string(),
            })?;
        Ok(match file {
            ProgramFile::Bare(program) => Self::new(program),
            ProgramFile::Named { name, instructions } => Self {
                name,
                program: instructions,
            },
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DslError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|e| DslError::ProgramLoad {
            file: origin.clone(),
            reason: e.to_string(),
        })?;
        let strategy = Self::from_json_str(&source, &origin)?;
        info!(
            file = %origin,
            name = strategy.name.as_deref().unwrap_or("unnamed"),
            records = strategy.program.len(),
            "program loaded"
        );
        Ok(strategy)
    }

    pub fn validate(&self) -> ValidationReport {
        validator::validate(&self.program)
    }

    /// Validate, then build the executable tree.
    pub fn compile(&self) -> Result<Instruction, DslError> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(DslError::Validation {
                errors: report.errors,
            });
        }
        Ok(parser::parse(&self.program)?)
    }
}
