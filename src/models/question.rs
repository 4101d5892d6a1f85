// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::error::AppError;
use crate::models::subject::Subject;

/// Question modality: single choice with a flagged-correct option, or a
/// free numerical answer. Stored as the Postgres enum 'question_kind'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_kind", rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    Numerical,
}

/// One option of a single-choice question.
///
/// Options live inside the question row as a JSON array, so an option id
/// only needs to be unique within its question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The test this question belongs to.
    pub test_id: i64,

    pub subject: Subject,

    pub kind: QuestionKind,

    /// The question text shown to the candidate.
    pub prompt: String,

    /// Option list; empty for numerical questions.
    pub options: Json<Vec<QuestionOption>>,

    /// The correct value; None for single-choice questions.
    pub numerical_answer: Option<f64>,

    /// Illustration URLs attached to the prompt.
    pub images: Json<Vec<String>>,

    /// Ordering of the question within its test.
    pub position: i32,

    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// The answer key of one question, tagged by modality. Exactly the data
/// the scorer needs and nothing the client should ever see.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    SingleChoice { correct_option: String },
    Numerical { value: f64 },
}

impl Question {
    /// Extracts the answer key, enforcing the catalog invariant that each
    /// question populates exactly the modality its kind declares.
    pub fn answer_key(&self) -> Result<AnswerKey, AppError> {
        match self.kind {
            QuestionKind::SingleChoice => {
                let mut correct = self.options.0.iter().filter(|o| o.is_correct);
                match (correct.next(), correct.next()) {
                    (Some(option), None) => Ok(AnswerKey::SingleChoice {
                        correct_option: option.id.clone(),
                    }),
                    _ => Err(AppError::ServerFault(format!(
                        "question {} must have exactly one correct option",
                        self.id
                    ))),
                }
            }
            QuestionKind::Numerical => match self.numerical_answer {
                Some(value) => Ok(AnswerKey::Numerical { value }),
                None => Err(AppError::ServerFault(format!(
                    "numerical question {} has no answer key",
                    self.id
                ))),
            },
        }
    }
}

/// Client-facing option: text only, no correctness flag.
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: String,
    pub text: String,
}

/// DTO for sending a question to a candidate during an attempt.
///
/// Strips the flagged-correct option and the numerical answer key so the
/// payload delivered before finalization carries no correctness
/// information; scoring happens server-side only.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub test_id: i64,
    pub subject: Subject,
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<PublicOption>,
    pub images: Vec<String>,
    pub position: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            test_id: q.test_id,
            subject: q.subject,
            kind: q.kind,
            prompt: q.prompt,
            options: q
                .options
                .0
                .into_iter()
                .map(|o| PublicOption {
                    id: o.id,
                    text: o.text,
                })
                .collect(),
            images: q.images.0,
            position: q.position,
        }
    }
}
