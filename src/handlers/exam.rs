// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    aggregate,
    error::AppError,
    models::{
        question::Question,
        response::{Response, deserialize_numeric},
        result::{AnswerEntry, ExamResult},
        subject::Subject,
        test::Test,
    },
    scoring::{self, Scored},
    utils::jwt::Claims,
};

/// What the candidate pressed; echoed back in the success message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveAction {
    SaveAndNext,
    MarkForReview,
}

/// DTO for saving one answer. The candidate identity comes from the JWT
/// claims, never from the body.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(range(min = 1))]
    pub test_id: i64,
    #[validate(range(min = 1))]
    pub question_id: i64,
    /// Option id, for single-choice questions.
    pub selected_option: Option<String>,
    /// Numerical answer; accepts a JSON number or numeric string.
    #[serde(default, deserialize_with = "deserialize_numeric")]
    pub numerical_value: Option<f64>,
    pub marked_for_review: Option<bool>,
    pub action: SaveAction,
}

impl SubmitAnswerRequest {
    /// Collapses the two optional wire fields into the tagged response
    /// union. Sending both modalities at once is rejected; an empty
    /// option id counts as no response.
    fn response(&self) -> Result<Option<Response>, AppError> {
        let selected = self
            .selected_option
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match (selected, self.numerical_value) {
            (Some(_), Some(_)) => Err(AppError::ValidationFailure(
                "Provide either a selected option or a numerical value, not both".to_string(),
            )),
            (Some(option_id), None) => Ok(Some(Response::Selected(option_id))),
            (None, Some(value)) => Ok(Some(Response::Numerical(value))),
            (None, None) => Ok(None),
        }
    }
}

/// Replaces or appends the entry for one question.
///
/// The question id is the upsert key. On an existing entry, fields absent
/// from the submission are preserved: a review-flag-only update keeps the
/// saved response and its verdict, while any present response replaces
/// response, verdict and score together (so a wrong-modality response
/// resets the entry to undetermined rather than keeping a stale verdict).
fn upsert_entry(
    entries: &mut Vec<AnswerEntry>,
    question_id: i64,
    subject: Subject,
    response: Option<Response>,
    scored: Scored,
    marked_for_review: Option<bool>,
) {
    match entries.iter_mut().find(|e| e.question_id == question_id) {
        Some(existing) => {
            if let Some(response) = response {
                existing.response = Some(response);
                existing.verdict = scored.verdict;
                existing.score = scored.delta;
            }
            if let Some(flag) = marked_for_review {
                existing.marked_for_review = flag;
            }
        }
        None => entries.push(AnswerEntry {
            question_id,
            subject,
            response,
            verdict: scored.verdict,
            score: scored.delta,
            marked_for_review: marked_for_review.unwrap_or(false),
        }),
    }
}

const RESULT_COLUMNS: &str = "id, user_id, test_id, start_time, end_time, answers, total_score, \
     attempted_questions, correct_answers, incorrect_answers, subject_scores, created_at, updated_at";

/// Saves one answer into the candidate's attempt.
///
/// * Finds or lazily creates the result keyed by (candidate, test).
/// * Resolves the question and scores the submitted response server-side.
/// * Upserts the answer entry, then recomputes and persists the rollups
///   from the full entry list.
/// * Runs in a single transaction: a failure leaves the stored result
///   exactly as it was.
pub async fn submit_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidReference(e.to_string()))?;

    let user_id = claims.user_id()?;
    let response = payload.response()?;

    let mut tx = pool.begin().await?;

    // Lookup keyed by the composite (candidate, test): a candidate may
    // hold results for other tests and those must never be reused here.
    let existing = sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = $1 AND test_id = $2 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(payload.test_id)
    .fetch_optional(&mut *tx)
    .await?;

    let result = match existing {
        Some(result) => result,
        None => {
            let test = sqlx::query_as::<_, Test>(
                "SELECT id, title, description, duration_minutes, total_marks, is_active, \
                 start_date, end_date, instructions, created_at FROM tests WHERE id = $1",
            )
            .bind(payload.test_id)
            .fetch_optional(&mut *tx)
            .await?;

            if test.is_none() {
                return Err(AppError::InvalidReference(
                    "Valid candidate and test identifiers are required to create a session"
                        .to_string(),
                ));
            }

            sqlx::query_as::<_, ExamResult>(&format!(
                "INSERT INTO results (user_id, test_id, start_time, answers, subject_scores) \
                 VALUES ($1, $2, NOW(), $3, $4) RETURNING {RESULT_COLUMNS}"
            ))
            .bind(user_id)
            .bind(payload.test_id)
            .bind(SqlJson(Vec::<AnswerEntry>::new()))
            .bind(SqlJson(crate::models::subject::Rollups::zeroed().subjects))
            .fetch_one(&mut *tx)
            .await?
        }
    };

    if result.is_finalized() {
        return Err(AppError::Conflict(
            "Attempt already submitted; answers can no longer change".to_string(),
        ));
    }

    let question = sqlx::query_as::<_, Question>(
        "SELECT id, test_id, subject, kind, prompt, options, numerical_answer, images, \
         position, is_active, created_at FROM questions WHERE id = $1 AND test_id = $2",
    )
    .bind(payload.question_id)
    .bind(payload.test_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::QuestionNotFound("Question not found".to_string()))?;

    let key = question.answer_key()?;
    let scored = scoring::score(&key, response.as_ref());

    let mut entries = result.answers.0;
    upsert_entry(
        &mut entries,
        question.id,
        question.subject,
        response,
        scored,
        payload.marked_for_review,
    );

    // Persist the entry list first, then the recomputed rollups, exactly
    // as two writes inside the transaction.
    sqlx::query("UPDATE results SET answers = $1, updated_at = NOW() WHERE id = $2")
        .bind(SqlJson(&entries))
        .bind(result.id)
        .execute(&mut *tx)
        .await?;

    let rollups = aggregate::recompute(&entries);

    let updated = sqlx::query_as::<_, ExamResult>(&format!(
        "UPDATE results SET total_score = $1, attempted_questions = $2, correct_answers = $3, \
         incorrect_answers = $4, subject_scores = $5, updated_at = NOW() \
         WHERE id = $6 RETURNING {RESULT_COLUMNS}"
    ))
    .bind(rollups.total_score)
    .bind(rollups.attempted_questions)
    .bind(rollups.correct_answers)
    .bind(rollups.incorrect_answers)
    .bind(SqlJson(&rollups.subjects))
    .bind(result.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let message = match payload.action {
        SaveAction::SaveAndNext => "Answer saved",
        SaveAction::MarkForReview => "Answer marked for review",
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message,
        "data": updated,
    })))
}

/// Returns the authenticated candidate's result for one test, or null if
/// the candidate has not answered anything yet.
pub async fn get_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = $1 AND test_id = $2"
    ))
    .bind(user_id)
    .bind(test_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": result,
    })))
}

/// Returns the full ordered question list of a test, stripped of answer
/// keys.
pub async fn get_questions(
    State(pool): State<PgPool>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let test = sqlx::query_as::<_, Test>(
        "SELECT id, title, description, duration_minutes, total_marks, is_active, \
         start_date, end_date, instructions, created_at FROM tests WHERE id = $1",
    )
    .bind(test_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, test_id, subject, kind, prompt, options, numerical_answer, images, \
         position, is_active, created_at FROM questions \
         WHERE test_id = $1 AND is_active ORDER BY position",
    )
    .bind(test.id)
    .fetch_all(&pool)
    .await?;

    let public: Vec<crate::models::question::PublicQuestion> =
        questions.into_iter().map(Into::into).collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "data": public,
    })))
}

/// Finalizes the candidate's attempt: sets the end timestamp, after which
/// every further answer mutation is rejected. Idempotent, so the explicit
/// Submit button and the timer-expiry path can both call it.
pub async fn finalize_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let finalized = sqlx::query_as::<_, ExamResult>(&format!(
        "UPDATE results SET end_time = NOW(), updated_at = NOW() \
         WHERE user_id = $1 AND test_id = $2 AND end_time IS NULL RETURNING {RESULT_COLUMNS}"
    ))
    .bind(user_id)
    .bind(test_id)
    .fetch_optional(&pool)
    .await?;

    let result = match finalized {
        Some(result) => result,
        // Already finalized earlier (e.g. the timer fired during a manual
        // submit); return the stored result unchanged.
        None => sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = $1 AND test_id = $2"
        ))
        .bind(user_id)
        .bind(test_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No attempt found for this test".to_string()))?,
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": result,
    })))
}

/// Marks a test inactive so it cannot be re-attempted after submission.
pub async fn update_test_status(
    State(pool): State<PgPool>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let updated = sqlx::query("UPDATE tests SET is_active = FALSE WHERE id = $1")
        .bind(test_id)
        .execute(&pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("Test not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::Verdict;

    fn scored(verdict: Verdict, delta: i64) -> Scored {
        Scored { verdict, delta }
    }

    #[test]
    fn new_answer_is_appended_once() {
        let mut entries = Vec::new();
        upsert_entry(
            &mut entries,
            7,
            Subject::Physics,
            Some(Response::Selected("b".to_string())),
            scored(Verdict::Correct, 4),
            None,
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question_id, 7);
        assert_eq!(entries[0].verdict, Verdict::Correct);
        assert_eq!(entries[0].score, 4);
        assert!(!entries[0].marked_for_review);
    }

    #[test]
    fn resubmitting_the_same_answer_does_not_duplicate() {
        let mut entries = Vec::new();
        for _ in 0..2 {
            upsert_entry(
                &mut entries,
                7,
                Subject::Physics,
                Some(Response::Selected("b".to_string())),
                scored(Verdict::Correct, 4),
                None,
            );
        }

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, Verdict::Correct);
        assert_eq!(entries[0].score, 4);
    }

    #[test]
    fn revision_replaces_verdict_and_score_in_place() {
        let mut entries = Vec::new();
        upsert_entry(
            &mut entries,
            7,
            Subject::Physics,
            Some(Response::Selected("b".to_string())),
            scored(Verdict::Correct, 4),
            None,
        );
        upsert_entry(
            &mut entries,
            7,
            Subject::Physics,
            Some(Response::Selected("a".to_string())),
            scored(Verdict::Incorrect, -1),
            None,
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, Some(Response::Selected("a".to_string())));
        assert_eq!(entries[0].verdict, Verdict::Incorrect);
        assert_eq!(entries[0].score, -1);
    }

    #[test]
    fn review_flag_only_update_preserves_saved_response() {
        let mut entries = Vec::new();
        upsert_entry(
            &mut entries,
            7,
            Subject::Chemistry,
            Some(Response::Numerical(12.5)),
            scored(Verdict::Correct, 4),
            None,
        );
        // No response this time: only the flag changes.
        upsert_entry(
            &mut entries,
            7,
            Subject::Chemistry,
            None,
            scored(Verdict::Undetermined, 0),
            Some(true),
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, Some(Response::Numerical(12.5)));
        assert_eq!(entries[0].verdict, Verdict::Correct);
        assert_eq!(entries[0].score, 4);
        assert!(entries[0].marked_for_review);
    }

    #[test]
    fn entries_for_other_questions_are_untouched() {
        let mut entries = Vec::new();
        upsert_entry(
            &mut entries,
            1,
            Subject::Physics,
            Some(Response::Selected("a".to_string())),
            scored(Verdict::Incorrect, -1),
            None,
        );
        upsert_entry(
            &mut entries,
            2,
            Subject::Physics,
            Some(Response::Selected("b".to_string())),
            scored(Verdict::Correct, 4),
            None,
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].verdict, Verdict::Incorrect);
        assert_eq!(entries[1].verdict, Verdict::Correct);
    }

    #[test]
    fn request_response_field_is_exclusive() {
        let both = SubmitAnswerRequest {
            test_id: 1,
            question_id: 1,
            selected_option: Some("a".to_string()),
            numerical_value: Some(2.0),
            marked_for_review: None,
            action: SaveAction::SaveAndNext,
        };
        assert!(both.response().is_err());

        let neither = SubmitAnswerRequest {
            test_id: 1,
            question_id: 1,
            selected_option: None,
            numerical_value: None,
            marked_for_review: Some(true),
            action: SaveAction::MarkForReview,
        };
        assert_eq!(neither.response().unwrap(), None);

        let empty_option = SubmitAnswerRequest {
            test_id: 1,
            question_id: 1,
            selected_option: Some(String::new()),
            numerical_value: None,
            marked_for_review: None,
            action: SaveAction::SaveAndNext,
        };
        assert_eq!(empty_option.response().unwrap(), None);
    }
}
