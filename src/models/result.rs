// src/models/result.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::models::response::{Response, Verdict};
use crate::models::subject::{Subject, SubjectRollup};

/// One saved response to one question within a result.
///
/// The question id is the upsert key: a result holds at most one entry per
/// question, and resubmission replaces the entry in place. The subject is
/// denormalized from the question at write time so rollups can be
/// recomputed from the entry list alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: i64,
    pub subject: Subject,
    pub response: Option<Response>,
    pub verdict: Verdict,
    /// +4 for correct, -1 for incorrect, 0 when undetermined.
    pub score: i64,
    pub marked_for_review: bool,
}

/// Represents the 'results' table: one candidate's attempt at one test.
///
/// Uniqueness of (user_id, test_id) is enforced by the schema; every
/// lookup goes through the composite key, never the candidate alone.
/// The totals and subject_scores columns are derived from `answers` by
/// full recomputation after every mutation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// Set on submission or timer expiry; mutation is rejected afterwards.
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub answers: Json<Vec<AnswerEntry>>,
    pub total_score: i64,
    pub attempted_questions: i64,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
    pub subject_scores: Json<BTreeMap<Subject, SubjectRollup>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ExamResult {
    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }
}
