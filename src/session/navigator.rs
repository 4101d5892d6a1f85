// src/session/navigator.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::question::PublicQuestion;
use crate::models::response::Response;
use crate::models::subject::Subject;

/// Display status of one question in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionStatus {
    NotVisited,
    NotAnswered,
    Answered,
    Review,
    AnsweredReview,
}

/// Palette legend / submit-confirmation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub not_visited: usize,
    pub not_answered: usize,
    pub answered: usize,
    pub review: usize,
    pub answered_review: usize,
}

impl StatusCounts {
    fn add(&mut self, status: QuestionStatus) {
        match status {
            QuestionStatus::NotVisited => self.not_visited += 1,
            QuestionStatus::NotAnswered => self.not_answered += 1,
            QuestionStatus::Answered => self.answered += 1,
            QuestionStatus::Review => self.review += 1,
            QuestionStatus::AnsweredReview => self.answered_review += 1,
        }
    }
}

/// The save payload staged by a save action.
///
/// Produced without mutating the navigator; the caller sends it to the
/// answer-submission endpoint and calls `commit_save` only if that round
/// trip succeeds, so a failed save never advances the local status.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub subject: Subject,
    pub index: usize,
    pub question_id: i64,
    pub response: Option<Response>,
    pub mark_for_review: bool,
    new_status: QuestionStatus,
}

/// Client-held navigation state for one running exam session.
///
/// Status and staged responses live in single maps keyed by
/// (subject, index within subject), so every subject shares one code path
/// and switching subjects cannot bleed state across them. The status map
/// is a display aid only; persisted correctness always comes from the
/// server-side scorer.
#[derive(Debug, Clone)]
pub struct ExamNavigator {
    /// Question ids per subject, in test order.
    questions: BTreeMap<Subject, Vec<i64>>,
    current_subject: Subject,
    /// Zero-based index within the current subject.
    current_index: usize,
    status: HashMap<(Subject, usize), QuestionStatus>,
    responses: HashMap<(Subject, usize), Response>,
}

impl ExamNavigator {
    /// Builds the navigator from the ordered question list of a test.
    /// The displayed question starts at the first question of the first
    /// subject that has any.
    pub fn new(questions: &[PublicQuestion]) -> Self {
        let mut by_subject: BTreeMap<Subject, Vec<i64>> = BTreeMap::new();
        for q in questions {
            by_subject.entry(q.subject).or_default().push(q.id);
        }

        let current_subject = Subject::ALL
            .iter()
            .copied()
            .find(|s| by_subject.contains_key(s))
            .unwrap_or(Subject::Physics);

        ExamNavigator {
            questions: by_subject,
            current_subject,
            current_index: 0,
            status: HashMap::new(),
            responses: HashMap::new(),
        }
    }

    pub fn current_subject(&self) -> Subject {
        self.current_subject
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question_id(&self) -> Option<i64> {
        self.subject_questions(self.current_subject)
            .get(self.current_index)
            .copied()
    }

    pub fn question_count(&self, subject: Subject) -> usize {
        self.subject_questions(subject).len()
    }

    pub fn status_of(&self, subject: Subject, index: usize) -> QuestionStatus {
        self.status
            .get(&(subject, index))
            .copied()
            .unwrap_or(QuestionStatus::NotVisited)
    }

    /// The response staged for the current question, if any.
    pub fn staged_response(&self) -> Option<&Response> {
        self.responses.get(&(self.current_subject, self.current_index))
    }

    fn subject_questions(&self, subject: Subject) -> &[i64] {
        self.questions.get(&subject).map(Vec::as_slice).unwrap_or(&[])
    }

    fn current_key(&self) -> (Subject, usize) {
        (self.current_subject, self.current_index)
    }

    /// Switches the displayed subject and resets to its first question.
    /// Each subject's status and staged responses are untouched by the
    /// switch.
    pub fn switch_subject(&mut self, subject: Subject) {
        self.current_subject = subject;
        self.current_index = 0;
    }

    /// Direct palette jump. A first visit moves the question from
    /// not-visited to not-answered; revisiting changes nothing.
    pub fn jump_to(&mut self, index: usize) {
        if index >= self.question_count(self.current_subject) {
            return;
        }
        self.current_index = index;
        self.status
            .entry(self.current_key())
            .or_insert(QuestionStatus::NotAnswered);
    }

    /// Moves to the next question within the current subject; no-op on the
    /// last one.
    pub fn next(&mut self) {
        if self.current_index + 1 < self.question_count(self.current_subject) {
            self.current_index += 1;
        }
    }

    /// Moves to the previous question within the current subject; no-op on
    /// the first one.
    pub fn previous(&mut self) {
        if self.current_index > 0 {
            self.current_index -= 1;
        }
    }

    /// Stages a response for the current question. Nothing is persisted
    /// until a save action is staged and committed.
    pub fn set_response(&mut self, response: Response) {
        self.responses.insert(self.current_key(), response);
    }

    /// Clears the staged response for the current question and sets its
    /// status to not-answered. Local only, like the original CLEAR
    /// RESPONSE button.
    pub fn clear_response(&mut self) {
        self.responses.remove(&self.current_key());
        self.status
            .insert(self.current_key(), QuestionStatus::NotAnswered);
    }

    /// Marks the current question for review without saving, then
    /// advances. The review status applies whether or not a response is
    /// staged.
    pub fn mark_review_and_next(&mut self) {
        self.status.insert(self.current_key(), QuestionStatus::Review);
        self.next();
    }

    /// Stages a SAVE & NEXT / SAVE & MARK FOR REVIEW action for the
    /// current question. Returns None when no question is displayed (empty
    /// subject). The navigator is not mutated; pass the result to
    /// `commit_save` after the server accepted it.
    pub fn stage_save(&self, mark_for_review: bool) -> Option<PendingSave> {
        let question_id = self.current_question_id()?;
        let response = self.staged_response().cloned();

        let new_status = match (&response, mark_for_review) {
            (Some(_), false) => QuestionStatus::Answered,
            (Some(_), true) => QuestionStatus::AnsweredReview,
            (None, false) => QuestionStatus::NotAnswered,
            (None, true) => QuestionStatus::Review,
        };

        Some(PendingSave {
            subject: self.current_subject,
            index: self.current_index,
            question_id,
            response,
            mark_for_review,
            new_status,
        })
    }

    /// Applies a staged save after its round trip succeeded: records the
    /// status transition and advances within the subject the save was
    /// staged in.
    pub fn commit_save(&mut self, save: &PendingSave) {
        self.status
            .insert((save.subject, save.index), save.new_status);
        if save.subject == self.current_subject && save.index == self.current_index {
            self.next();
        }
    }

    /// Status counters for one subject's palette.
    pub fn subject_counts(&self, subject: Subject) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for index in 0..self.question_count(subject) {
            counts.add(self.status_of(subject, index));
        }
        counts
    }

    /// Status counters across every subject, shown in the submit
    /// confirmation dialog.
    pub fn overall_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for subject in Subject::ALL {
            for index in 0..self.question_count(subject) {
                counts.add(self.status_of(subject, index));
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionKind;

    fn question(id: i64, subject: Subject, position: i32) -> PublicQuestion {
        PublicQuestion {
            id,
            test_id: 1,
            subject,
            kind: QuestionKind::SingleChoice,
            prompt: format!("question {}", id),
            options: vec![],
            images: vec![],
            position,
        }
    }

    /// Three physics, two chemistry, one mathematics question.
    fn navigator() -> ExamNavigator {
        ExamNavigator::new(&[
            question(1, Subject::Physics, 1),
            question(2, Subject::Physics, 2),
            question(3, Subject::Physics, 3),
            question(4, Subject::Chemistry, 4),
            question(5, Subject::Chemistry, 5),
            question(6, Subject::Mathematics, 6),
        ])
    }

    #[test]
    fn starts_at_first_physics_question_with_everything_unvisited() {
        let nav = navigator();
        assert_eq!(nav.current_subject(), Subject::Physics);
        assert_eq!(nav.current_question_id(), Some(1));
        assert_eq!(nav.subject_counts(Subject::Physics).not_visited, 3);
    }

    #[test]
    fn palette_jump_marks_first_visit_only() {
        let mut nav = navigator();
        nav.jump_to(2);
        assert_eq!(nav.status_of(Subject::Physics, 2), QuestionStatus::NotAnswered);

        // Answer it, then revisit: the answered status must survive.
        nav.set_response(Response::Selected("a".to_string()));
        let save = nav.stage_save(false).unwrap();
        nav.commit_save(&save);
        nav.jump_to(2);
        assert_eq!(nav.status_of(Subject::Physics, 2), QuestionStatus::Answered);
    }

    #[test]
    fn save_with_response_marks_answered_and_advances() {
        let mut nav = navigator();
        nav.set_response(Response::Selected("b".to_string()));

        let save = nav.stage_save(false).unwrap();
        assert_eq!(save.question_id, 1);
        assert_eq!(save.response, Some(Response::Selected("b".to_string())));

        nav.commit_save(&save);
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::Answered);
        assert_eq!(nav.current_question_id(), Some(2));
    }

    #[test]
    fn save_without_response_marks_not_answered() {
        let mut nav = navigator();
        let save = nav.stage_save(false).unwrap();
        nav.commit_save(&save);
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::NotAnswered);
    }

    #[test]
    fn save_and_mark_review_depends_on_response_presence() {
        let mut nav = navigator();

        let without = nav.stage_save(true).unwrap();
        nav.commit_save(&without);
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::Review);

        nav.set_response(Response::Numerical(2.5));
        let with = nav.stage_save(true).unwrap();
        nav.commit_save(&with);
        assert_eq!(
            nav.status_of(Subject::Physics, 1),
            QuestionStatus::AnsweredReview
        );
    }

    #[test]
    fn failed_save_leaves_status_and_position_untouched() {
        let mut nav = navigator();
        nav.set_response(Response::Selected("a".to_string()));

        // Staging alone must not transition anything: the round trip may
        // still fail.
        let _pending = nav.stage_save(false).unwrap();
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::NotVisited);
        assert_eq!(nav.current_question_id(), Some(1));
    }

    #[test]
    fn mark_review_and_next_skips_the_save() {
        let mut nav = navigator();
        nav.mark_review_and_next();
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::Review);
        assert_eq!(nav.current_question_id(), Some(2));
    }

    #[test]
    fn clear_response_resets_to_not_answered() {
        let mut nav = navigator();
        nav.set_response(Response::Selected("c".to_string()));
        let save = nav.stage_save(false).unwrap();
        nav.commit_save(&save);

        nav.previous();
        nav.clear_response();
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::NotAnswered);
        assert!(nav.staged_response().is_none());
    }

    #[test]
    fn subject_switch_resets_index_and_preserves_state() {
        let mut nav = navigator();
        nav.set_response(Response::Selected("a".to_string()));
        let save = nav.stage_save(false).unwrap();
        nav.commit_save(&save);

        nav.switch_subject(Subject::Chemistry);
        assert_eq!(nav.current_question_id(), Some(4));
        assert_eq!(nav.subject_counts(Subject::Chemistry).not_visited, 2);

        // Coming back: physics status and position bookkeeping survived.
        nav.switch_subject(Subject::Physics);
        assert_eq!(nav.current_question_id(), Some(1));
        assert_eq!(nav.status_of(Subject::Physics, 0), QuestionStatus::Answered);
    }

    #[test]
    fn advance_stops_at_the_last_question_of_the_subject() {
        let mut nav = navigator();
        nav.switch_subject(Subject::Mathematics);
        nav.next();
        assert_eq!(nav.current_question_id(), Some(6));

        let save = nav.stage_save(false).unwrap();
        nav.commit_save(&save);
        assert_eq!(nav.current_question_id(), Some(6));
    }

    #[test]
    fn overall_counts_cover_every_subject() {
        let mut nav = navigator();
        nav.set_response(Response::Selected("a".to_string()));
        let save = nav.stage_save(false).unwrap();
        nav.commit_save(&save);

        nav.switch_subject(Subject::Chemistry);
        nav.mark_review_and_next();

        let counts = nav.overall_counts();
        assert_eq!(counts.answered, 1);
        assert_eq!(counts.review, 1);
        assert_eq!(counts.not_visited, 4);
    }
}
