//! Wait durations: seconds, or text with an `s`, `m` or `h` suffix.

use std::time::Duration;

use crate::domain::error::WaitError;

/// Shortest wait a program may request, in seconds.
pub const MIN_WAIT_SECONDS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wait {
    /// What the program asked for, normalised to seconds.
    pub requested: f64,
    /// What will actually be waited for.
    pub seconds: f64,
    pub clamped: bool,
}

impl Wait {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, WaitError> {
        let requested = match value {
            serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| WaitError::InvalidValue {
                value: n.to_string(),
            })?,
            serde_json::Value::String(s) => parse_duration(s)?,
            other => {
                return Err(WaitError::InvalidType {
                    found: json_type_name(other),
                });
            }
        };
        let wait = Self::from_seconds(requested);
        if Duration::try_from_secs_f64(wait.seconds).is_err() {
            return Err(WaitError::InvalidValue {
                value: match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            });
        }
        Ok(wait)
    }

    pub fn from_seconds(requested: f64) -> Self {
        let clamped = requested.is_nan() || requested < MIN_WAIT_SECONDS;
        Self {
            requested,
            seconds: if clamped { MIN_WAIT_SECONDS } else { requested },
            clamped,
        }
    }

    /// Saturates at `Duration::MAX` for waits built with `from_seconds`
    /// beyond what a `Duration` holds.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.seconds).unwrap_or(Duration::MAX)
    }
}

/// Parse `"<number><s|m|h>"` into seconds. The unit is case-insensitive.
pub fn parse_duration(text: &str) -> Result<f64, WaitError> {
    if text.chars().count() < 2 {
        return Err(WaitError::InvalidFormat {
            value: text.to_string(),
        });
    }
    let Some(unit) = text.chars().last() else {
        return Err(WaitError::InvalidFormat {
            value: text.to_string(),
        });
    };
    let multiplier = match unit.to_ascii_lowercase() {
        's' => 1.0,
        'm' => 60.0,
        'h' => 3600.0,
        _ => return Err(WaitError::InvalidUnit { unit }),
    };
    let number = &text[..text.len() - unit.len_utf8()];
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| WaitError::InvalidValue {
            value: text.to_string(),
        })?;
    if !value.is_finite() {
        return Err(WaitError::InvalidValue {
            value: text.to_string(),
        });
    }
    Ok(value * multiplier)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn units_normalised_to_seconds() {
        assert_relative_eq!(parse_duration("3s").unwrap(), 3.0);
        assert_relative_eq!(parse_duration("2m").unwrap(), 120.0);
        assert_relative_eq!(parse_duration("1.5h").unwrap(), 5400.0);
        assert_relative_eq!(parse_duration("10S").unwrap(), 10.0);
    }

    #[test]
    fn unrepresentable_durations_rejected() {
        for value in [json!(1e300), json!("1e300s"), json!("1e307h")] {
            assert!(
                matches!(Wait::from_json(&value), Err(WaitError::InvalidValue { .. })),
                "{value} accepted"
            );
        }
        // large but representable
        let wait = Wait::from_json(&json!("1000000h")).unwrap();
        assert_relative_eq!(wait.seconds, 3.6e9);
    }

    #[test]
    fn duration_saturates() {
        assert_eq!(Wait::from_seconds(1e300).duration(), Duration::MAX);
        assert_eq!(Wait::from_seconds(3.0).duration(), Duration::from_secs(3));
    }

    #[test]
    fn numeric_seconds() {
        let wait = Wait::from_json(&json!(5)).unwrap();
        assert_relative_eq!(wait.seconds, 5.0);
        assert!(!wait.clamped);
    }

    #[test]
    fn below_floor_is_clamped() {
        let wait = Wait::from_json(&json!("1s")).unwrap();
        assert_relative_eq!(wait.seconds, MIN_WAIT_SECONDS);
        assert_relative_eq!(wait.requested, 1.0);
        assert!(wait.clamped);

        let wait = Wait::from_json(&json!(0)).unwrap();
        assert_relative_eq!(wait.seconds, 2.0);
    }

    #[test]
    fn exactly_floor_is_not_clamped() {
        let wait = Wait::from_seconds(2.0);
        assert!(!wait.clamped);
        assert_eq!(wait.duration(), Duration::from_secs(2));
    }

    #[test]
    fn invalid_unit() {
        assert_eq!(
            parse_duration("5d"),
            Err(WaitError::InvalidUnit { unit: 'd' })
        );
    }

    #[test]
    fn too_short() {
        assert!(matches!(
            parse_duration("s"),
            Err(WaitError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_duration(""),
            Err(WaitError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn invalid_value() {
        assert!(matches!(
            parse_duration("xs"),
            Err(WaitError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_duration("infs"),
            Err(WaitError::InvalidValue { .. })
        ));
    }

    #[test]
    fn booleans_and_objects_rejected() {
        assert_eq!(
            Wait::from_json(&json!(true)),
            Err(WaitError::InvalidType { found: "boolean" })
        );
        assert!(matches!(
            Wait::from_json(&json!({"s": 1})),
            Err(WaitError::InvalidType { found: "object" })
        ));
    }
}
