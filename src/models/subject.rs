// src/models/subject.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of exam subjects.
///
/// Stored as the Postgres enum 'subject' and used as the key of the
/// per-subject rollup map, so the set is fixed at the type level rather
/// than by three parallel fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "subject", rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
}

impl Subject {
    /// Every subject, in display order.
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Mathematics];
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Mathematics => "mathematics",
        };
        write!(f, "{}", name)
    }
}

/// Aggregated counters for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRollup {
    /// Entries with a determined verdict.
    pub total: i64,
    pub correct: i64,
    pub incorrect: i64,
    pub score: i64,
}

/// Full recomputed aggregation: one rollup per subject plus the derived
/// totals. Always produced from scratch by `aggregate::recompute`, never
/// mutated incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollups {
    pub subjects: BTreeMap<Subject, SubjectRollup>,
    pub total_score: i64,
    pub attempted_questions: i64,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
}

impl Rollups {
    /// A zeroed rollup map covering the whole subject set.
    pub fn zeroed() -> Self {
        Rollups {
            subjects: Subject::ALL
                .iter()
                .map(|s| (*s, SubjectRollup::default()))
                .collect(),
            total_score: 0,
            attempted_questions: 0,
            correct_answers: 0,
            incorrect_answers: 0,
        }
    }
}
