//! Raw program records as read from JSON.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Kind of an instruction, in the precedence used when a record carries
/// several recognised keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    If,
    End,
    Operation,
    Indicator,
    Trade,
    Wait,
}

impl InstructionKind {
    pub const PRECEDENCE: [InstructionKind; 6] = [
        InstructionKind::If,
        InstructionKind::End,
        InstructionKind::Operation,
        InstructionKind::Indicator,
        InstructionKind::Trade,
        InstructionKind::Wait,
    ];

    pub fn key(self) -> &'static str {
        match self {
            InstructionKind::If => "if",
            InstructionKind::End => "end",
            InstructionKind::Operation => "operation",
            InstructionKind::Indicator => "indicator",
            InstructionKind::Trade => "trade",
            InstructionKind::Wait => "wait",
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One record of a program: the recognised key's payload, or the whole
/// record when no key is recognised.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionRecord {
    If(serde_json::Value),
    End(serde_json::Value),
    Operation(serde_json::Value),
    Indicator(serde_json::Value),
    Trade(serde_json::Value),
    Wait(serde_json::Value),
    Unknown(serde_json::Value),
}

impl InstructionRecord {
    pub fn kind(&self) -> Option<InstructionKind> {
        match self {
            InstructionRecord::If(_) => Some(InstructionKind::If),
            InstructionRecord::End(_) => Some(InstructionKind::End),
            InstructionRecord::Operation(_) => Some(InstructionKind::Operation),
            InstructionRecord::Indicator(_) => Some(InstructionKind::Indicator),
            InstructionRecord::Trade(_) => Some(InstructionKind::Trade),
            InstructionRecord::Wait(_) => Some(InstructionKind::Wait),
            InstructionRecord::Unknown(_) => None,
        }
    }

    pub fn payload(&self) -> &serde_json::Value {
        match self {
            InstructionRecord::If(v)
            | InstructionRecord::End(v)
            | InstructionRecord::Operation(v)
            | InstructionRecord::Indicator(v)
            | InstructionRecord::Trade(v)
            | InstructionRecord::Wait(v)
            | InstructionRecord::Unknown(v) => v,
        }
    }

    /// Short rendering of the payload for error messages.
    pub fn text(&self) -> String {
        match self.payload() {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Value> for InstructionRecord {
    fn from(value: serde_json::Value) -> Self {
        let kind = match &value {
            serde_json::Value::Object(map) => InstructionKind::PRECEDENCE
                .into_iter()
                .find(|kind| map.contains_key(kind.key())),
            _ => None,
        };
        let Some(kind) = kind else {
            return InstructionRecord::Unknown(value);
        };
        let payload = value.get(kind.key()).cloned().unwrap_or_default();
        match kind {
            InstructionKind::If => InstructionRecord::If(payload),
            InstructionKind::End => InstructionRecord::End(payload),
            InstructionKind::Operation => InstructionRecord::Operation(payload),
            InstructionKind::Indicator => InstructionRecord::Indicator(payload),
            InstructionKind::Trade => InstructionRecord::Trade(payload),
            InstructionKind::Wait => InstructionRecord::Wait(payload),
        }
    }
}

impl<'de> Deserialize<'de> for InstructionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(InstructionRecord::from)
    }
}

/// An ordered list of instruction records.
pub type Program = Vec<InstructionRecord>;

/// Deepest `if` nesting a program may use.
pub const MAX_BLOCK_DEPTH: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_kinds() {
        let program: Program = serde_json::from_value(json!([
            {"if": "x > 0"},
            {"operation": "x += 1"},
            {"end": true},
            {"wait": "3s"}
        ]))
        .unwrap();
        let kinds: Vec<_> = program.iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Some(InstructionKind::If),
                Some(InstructionKind::Operation),
                Some(InstructionKind::End),
                Some(InstructionKind::Wait)
            ]
        );
        assert_eq!(program[0].payload(), &json!("x > 0"));
    }

    #[test]
    fn first_recognised_key_wins() {
        let record = InstructionRecord::from(json!({"wait": 5, "operation": "x = 1"}));
        assert_eq!(record, InstructionRecord::Operation(json!("x = 1")));
        let record = InstructionRecord::from(json!({"trade": {}, "end": true}));
        assert_eq!(record.kind(), Some(InstructionKind::End));
    }

    #[test]
    fn unrecognised_records_are_kept() {
        let record = InstructionRecord::from(json!({"comment": "hi"}));
        assert!(record.kind().is_none());
        let record = InstructionRecord::from(json!("if"));
        assert!(matches!(record, InstructionRecord::Unknown(_)));
    }

    #[test]
    fn text_of_string_payload_is_unquoted() {
        assert_eq!(InstructionRecord::If(json!("x > 1")).text(), "x > 1");
        assert_eq!(InstructionRecord::Wait(json!(5)).text(), "5");
    }

    #[test]
    fn kind_display() {
        assert_eq!(InstructionKind::Indicator.to_string(), "indicator");
    }
}
