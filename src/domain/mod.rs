//! Core domain types and logic.

pub mod config_validation;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod indicator;
pub mod instruction;
pub mod interpreter;
pub mod ohlcv;
pub mod parser;
pub mod program;
pub mod strategy;
pub mod validator;
pub mod value;
pub mod wait;
