// src/scoring.rs

use crate::config::{CORRECT_MARKS, INCORRECT_PENALTY};
use crate::models::question::AnswerKey;
use crate::models::response::{Response, Verdict};

/// Outcome of scoring one submitted response against one answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub verdict: Verdict,
    pub delta: i64,
}

impl Scored {
    const CORRECT: Scored = Scored {
        verdict: Verdict::Correct,
        delta: CORRECT_MARKS,
    };
    const INCORRECT: Scored = Scored {
        verdict: Verdict::Incorrect,
        delta: -INCORRECT_PENALTY,
    };
    const UNDETERMINED: Scored = Scored {
        verdict: Verdict::Undetermined,
        delta: 0,
    };
}

/// Scores a submitted response against a question's answer key.
///
/// Pure and deterministic: re-scoring the same pair always yields the same
/// verdict. A present single-choice response is correct iff it names the
/// flagged option; anything else, including an option id the question does
/// not have, is incorrect. A present numerical response is correct iff it
/// is numerically equal to the key. A missing response, or one whose
/// modality does not match the key, stays undetermined with delta 0 and
/// counts as unattempted rather than incorrect.
pub fn score(key: &AnswerKey, response: Option<&Response>) -> Scored {
    match (key, response) {
        (AnswerKey::SingleChoice { correct_option }, Some(Response::Selected(chosen))) => {
            if chosen == correct_option {
                Scored::CORRECT
            } else {
                Scored::INCORRECT
            }
        }
        (AnswerKey::Numerical { value }, Some(Response::Numerical(submitted))) => {
            if numeric_eq(*submitted, *value) {
                Scored::CORRECT
            } else {
                Scored::INCORRECT
            }
        }
        _ => Scored::UNDETERMINED,
    }
}

/// Exact equality of canonicalized numerical answers. Both sides have
/// already been normalized to f64, so "12.50" and 12.5 compare equal.
fn numeric_eq(a: f64, b: f64) -> bool {
    a.total_cmp(&b) == std::cmp::Ordering::Equal
}
