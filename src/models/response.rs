// src/models/response.rs

use serde::{Deserialize, Deserializer, Serialize};

/// A candidate's submitted response to one question.
///
/// Modeled as a tagged union so that "selected option XOR numerical value"
/// is a static invariant instead of a pair of optional fields that callers
/// must keep mutually exclusive. Absence of a response is `Option::None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Response {
    /// Option id of the chosen single-choice option.
    Selected(String),
    /// Canonicalized numerical answer.
    Numerical(f64),
}

/// Correctness classification of a submitted response.
///
/// `Undetermined` means no response of the matching modality was present;
/// it counts as unattempted, never as incorrect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    #[default]
    Undetermined,
}

/// Deserializes an optional numerical value that clients may send either as
/// a JSON number or as a numeric string ("12.50"). Both normalize to the
/// same `f64`, so string and number submissions of the same value compare
/// equal when scored.
pub fn deserialize_numeric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => match n.as_f64() {
            Some(v) => Ok(Some(v)),
            None => Err(serde::de::Error::custom("numerical value out of range")),
        },
        Some(serde_json::Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(serde::de::Error::custom(format!(
                "'{}' is not a valid numerical value",
                s
            ))),
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number or numeric string, got {}",
            other
        ))),
    }
}
