// src/aggregate.rs

use crate::config::{CORRECT_MARKS, INCORRECT_PENALTY};
use crate::models::response::Verdict;
use crate::models::result::AnswerEntry;
use crate::models::subject::Rollups;

/// Recomputes the per-subject rollups and derived totals from the full
/// answer list.
///
/// The rollup map starts from zero on every call and never reads
/// previously stored counters, so a partial earlier write converges to the
/// correct values on the next recomputation. Undetermined entries are
/// excluded from the subject totals; they are visited, not attempted.
pub fn recompute(entries: &[AnswerEntry]) -> Rollups {
    let mut rollups = Rollups::zeroed();

    for entry in entries {
        let subject = rollups.subjects.entry(entry.subject).or_default();

        match entry.verdict {
            Verdict::Correct => {
                subject.total += 1;
                subject.correct += 1;
                subject.score += CORRECT_MARKS;
            }
            Verdict::Incorrect => {
                subject.total += 1;
                subject.incorrect += 1;
                subject.score -= INCORRECT_PENALTY;
            }
            Verdict::Undetermined => {}
        }
    }

    for rollup in rollups.subjects.values() {
        rollups.total_score += rollup.score;
        rollups.attempted_questions += rollup.total;
        rollups.correct_answers += rollup.correct;
        rollups.incorrect_answers += rollup.incorrect;
    }

    rollups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::Response;
    use crate::models::subject::Subject;

    fn entry(question_id: i64, subject: Subject, verdict: Verdict) -> AnswerEntry {
        let (response, score) = match verdict {
            Verdict::Correct => (Some(Response::Selected("a".to_string())), 4),
            Verdict::Incorrect => (Some(Response::Selected("b".to_string())), -1),
            Verdict::Undetermined => (None, 0),
        };
        AnswerEntry {
            question_id,
            subject,
            response,
            verdict,
            score,
            marked_for_review: false,
        }
    }

    #[test]
    fn empty_entry_list_yields_zeroed_rollups() {
        let rollups = recompute(&[]);
        assert_eq!(rollups, Rollups::zeroed());
        // Every subject is present even with no entries.
        assert_eq!(rollups.subjects.len(), Subject::ALL.len());
    }

    #[test]
    fn known_mix_produces_exact_rollups() {
        let entries = vec![
            entry(1, Subject::Physics, Verdict::Correct),
            entry(2, Subject::Physics, Verdict::Incorrect),
            entry(3, Subject::Physics, Verdict::Undetermined),
            entry(4, Subject::Chemistry, Verdict::Correct),
            entry(5, Subject::Chemistry, Verdict::Correct),
            entry(6, Subject::Mathematics, Verdict::Incorrect),
        ];

        let rollups = recompute(&entries);

        let physics = &rollups.subjects[&Subject::Physics];
        assert_eq!((physics.total, physics.correct, physics.incorrect), (2, 1, 1));
        assert_eq!(physics.score, 3); // 4 - 1

        let chemistry = &rollups.subjects[&Subject::Chemistry];
        assert_eq!((chemistry.total, chemistry.correct, chemistry.incorrect), (2, 2, 0));
        assert_eq!(chemistry.score, 8);

        let mathematics = &rollups.subjects[&Subject::Mathematics];
        assert_eq!(
            (mathematics.total, mathematics.correct, mathematics.incorrect),
            (1, 0, 1)
        );
        assert_eq!(mathematics.score, -1);

        assert_eq!(rollups.total_score, 10);
        assert_eq!(rollups.attempted_questions, 5);
        assert_eq!(rollups.correct_answers, 3);
        assert_eq!(rollups.incorrect_answers, 2);
    }

    #[test]
    fn total_score_matches_four_correct_minus_incorrect() {
        let entries = vec![
            entry(1, Subject::Physics, Verdict::Correct),
            entry(2, Subject::Chemistry, Verdict::Incorrect),
            entry(3, Subject::Mathematics, Verdict::Correct),
            entry(4, Subject::Mathematics, Verdict::Incorrect),
        ];

        let rollups = recompute(&entries);
        assert_eq!(
            rollups.total_score,
            4 * rollups.correct_answers - rollups.incorrect_answers
        );
        assert_eq!(
            rollups.attempted_questions,
            rollups.subjects.values().map(|r| r.total).sum::<i64>()
        );
    }

    #[test]
    fn recomputation_ignores_prior_state() {
        let entries = vec![entry(1, Subject::Physics, Verdict::Correct)];
        // Two calls over the same list are equal regardless of what was
        // stored before.
        assert_eq!(recompute(&entries), recompute(&entries));
    }
}
