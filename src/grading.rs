use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::models::{
    AnswerRecord, AnswerValue, Question, QuestionKind, Submission, SubmissionStatus,
};

/// Minimum percentage to validate a module. A fixed platform constant, not
/// configurable per assessment.
pub const PASS_THRESHOLD: f64 = 70.0;

/// Coarse performance band, used only for feedback wording, never for the
/// pass/fail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Excellent,
    Good,
    Passable,
    Insufficient,
}

impl Tier {
    fn from_percentage(percentage: f64) -> Self {
        if percentage >= 85.0 {
            Tier::Excellent
        } else if percentage >= PASS_THRESHOLD {
            Tier::Good
        } else if percentage >= 50.0 {
            Tier::Passable
        } else {
            Tier::Insufficient
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Bien",
            Tier::Passable => "Passable",
            Tier::Insufficient => "Insuffisant",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub correct_count: usize,
    pub total_questions: usize,
    pub score: f64,
    pub percentage: f64,
    pub passed: bool,
    pub tier: Tier,
    /// True when the assessment had no questions: nothing was graded, and
    /// the zeros above are not a failing result.
    pub ungraded: bool,
    pub per_question: Vec<AnswerRecord>,
}

/// Reject a submission attempt while questions are still unanswered. This
/// runs before any network call, mirroring the disabled submit button.
pub fn ensure_complete(
    questions: &[Question],
    answers: &BTreeMap<usize, AnswerValue>,
) -> Result<()> {
    let unanswered = (0..questions.len())
        .filter(|idx| !answers.contains_key(idx))
        .count();
    if unanswered > 0 {
        return Err(Error::InvalidInput(format!(
            "{unanswered} question(s) left unanswered"
        )));
    }
    Ok(())
}

fn is_correct(question: &Question, answer: &AnswerValue) -> bool {
    match question.kind {
        QuestionKind::SingleChoice | QuestionKind::TrueFalse => {
            match (answer.as_one(), question.correct.as_one()) {
                (Some(submitted), Some(correct)) => submitted == correct,
                _ => false,
            }
        }
        // exact set equality, no partial credit
        QuestionKind::MultiChoice => answer.as_set() == question.correct.as_set(),
        QuestionKind::Ordering => answer.as_sequence() == question.correct.as_sequence(),
    }
}

/// Grade a completed attempt: per-question correctness, aggregate score on
/// `max_marks` (one decimal), percentage, pass/fail at [`PASS_THRESHOLD`]
/// and the feedback tier.
pub fn grade(
    questions: &[Question],
    answers: &BTreeMap<usize, AnswerValue>,
    max_marks: f64,
) -> GradeReport {
    if questions.is_empty() {
        return GradeReport {
            correct_count: 0,
            total_questions: 0,
            score: 0.0,
            percentage: 0.0,
            passed: false,
            tier: Tier::Insufficient,
            ungraded: true,
            per_question: Vec::new(),
        };
    }

    let mut correct_count = 0;
    let per_question = questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            let submitted = answers.get(&idx);
            let correct = submitted.is_some_and(|answer| is_correct(question, answer));
            if correct {
                correct_count += 1;
            }
            AnswerRecord {
                question_id: question.id.unwrap_or(idx as i64),
                student_answer: submitted.cloned(),
                is_correct: correct,
                correct_answer: question.correct.clone(),
            }
        })
        .collect();

    let fraction = correct_count as f64 / questions.len() as f64;
    let percentage = fraction * 100.0;
    let score = (fraction * max_marks * 10.0).round() / 10.0;
    GradeReport {
        correct_count,
        total_questions: questions.len(),
        score,
        percentage,
        passed: percentage >= PASS_THRESHOLD,
        tier: Tier::from_percentage(percentage),
        ungraded: false,
        per_question,
    }
}

impl GradeReport {
    /// Feedback line shown to the student, selected on the same cutoffs the
    /// course pages use.
    pub fn feedback(&self) -> &'static str {
        if self.ungraded {
            "Aucune question à corriger : cet examen n'a pas encore été configuré."
        } else if self.percentage >= 80.0 {
            "Excellent ! Vous avez une excellente maîtrise du sujet."
        } else if self.percentage >= 60.0 {
            "Bien ! Vous avez compris les concepts essentiels."
        } else {
            "Besoin de révision. Repassez le cours pour consolider vos acquis."
        }
    }

    /// Build the submission payload for the gateway. Auto-graded attempts
    /// are stored as already graded; an ungraded report stays `Submitted`
    /// for manual review.
    pub fn into_submission(self, student_id: i64, assessment_id: i64) -> Submission {
        let now = OffsetDateTime::now_utc();
        let feedback = self.feedback().to_string();
        let graded = !self.ungraded;
        Submission {
            id: None,
            student_id,
            assessment_id,
            marks_obtained: self.score,
            submission_status: if graded {
                SubmissionStatus::Graded
            } else {
                SubmissionStatus::Submitted
            },
            submitted_at: now,
            graded_at: graded.then_some(now),
            feedback: Some(feedback),
            answers: serde_json::to_string(&self.per_question).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(correct: usize) -> Question {
        Question {
            id: None,
            text: "q".to_string(),
            kind: QuestionKind::SingleChoice,
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct: AnswerValue::One(correct),
        }
    }

    fn multi(correct: &[usize]) -> Question {
        Question {
            id: None,
            text: "q".to_string(),
            kind: QuestionKind::MultiChoice,
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct: AnswerValue::Many(correct.to_vec()),
        }
    }

    fn answers(pairs: &[(usize, AnswerValue)]) -> BTreeMap<usize, AnswerValue> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn four_questions_three_correct() {
        let questions = vec![single(0), single(1), single(2), single(0)];
        let submitted = answers(&[
            (0, AnswerValue::One(0)),
            (1, AnswerValue::One(1)),
            (2, AnswerValue::One(2)),
            (3, AnswerValue::One(1)),
        ]);
        let report = grade(&questions, &submitted, 20.0);
        assert_eq!(report.correct_count, 3);
        assert_eq!(report.percentage, 75.0);
        assert_eq!(report.score, 15.0);
        assert!(report.passed);
        assert_eq!(report.tier, Tier::Good);
        assert!(!report.ungraded);
    }

    #[test]
    fn multi_answer_subset_is_incorrect() {
        let questions = vec![multi(&[0, 2])];
        let subset = answers(&[(0, AnswerValue::Many(vec![0]))]);
        assert_eq!(grade(&questions, &subset, 10.0).correct_count, 0);
        let superset = answers(&[(0, AnswerValue::Many(vec![0, 1, 2]))]);
        assert_eq!(grade(&questions, &superset, 10.0).correct_count, 0);
        let exact = answers(&[(0, AnswerValue::Many(vec![2, 0]))]);
        assert_eq!(grade(&questions, &exact, 10.0).correct_count, 1);
    }

    #[test]
    fn ordering_requires_exact_sequence() {
        let question = Question {
            kind: QuestionKind::Ordering,
            correct: AnswerValue::Many(vec![2, 0, 1]),
            ..single(0)
        };
        let wrong = answers(&[(0, AnswerValue::Many(vec![0, 1, 2]))]);
        assert_eq!(grade(&[question.clone()], &wrong, 10.0).correct_count, 0);
        let right = answers(&[(0, AnswerValue::Many(vec![2, 0, 1]))]);
        assert_eq!(grade(&[question], &right, 10.0).correct_count, 1);
    }

    #[test]
    fn pass_boundary_inclusive_at_70() {
        // 7/10 correct lands exactly on the threshold
        let questions: Vec<_> = (0..10).map(|_| single(0)).collect();
        let submitted = answers(
            &(0..10)
                .map(|i| (i, AnswerValue::One(if i < 7 { 0 } else { 1 })))
                .collect::<Vec<_>>(),
        );
        let report = grade(&questions, &submitted, 10.0);
        assert_eq!(report.percentage, 70.0);
        assert!(report.passed);

        // one fewer correct answer fails
        let submitted = answers(
            &(0..10)
                .map(|i| (i, AnswerValue::One(if i < 6 { 0 } else { 1 })))
                .collect::<Vec<_>>(),
        );
        assert!(!grade(&questions, &submitted, 10.0).passed);

        // 9/13 is 69.23%, just under the threshold, and must not pass
        let questions: Vec<_> = (0..13).map(|_| single(0)).collect();
        let submitted = answers(
            &(0..13)
                .map(|i| (i, AnswerValue::One(if i < 9 { 0 } else { 1 })))
                .collect::<Vec<_>>(),
        );
        let report = grade(&questions, &submitted, 10.0);
        assert!(report.percentage < PASS_THRESHOLD);
        assert!(report.percentage > 69.0);
        assert!(!report.passed);
        assert_eq!(report.tier, Tier::Passable);
    }

    #[test]
    fn zero_questions_is_ungraded_not_failed() {
        let report = grade(&[], &BTreeMap::new(), 20.0);
        assert!(report.ungraded);
        assert_eq!(report.percentage, 0.0);
        assert!(!report.passed);
        let submission = report.into_submission(1, 2);
        assert_eq!(submission.submission_status, SubmissionStatus::Submitted);
        assert_eq!(submission.graded_at, None);
    }

    #[test]
    fn unanswered_question_blocks_submit() {
        let questions = vec![single(0), single(1)];
        let partial = answers(&[(0, AnswerValue::One(0))]);
        assert!(ensure_complete(&questions, &partial).is_err());
        let full = answers(&[(0, AnswerValue::One(0)), (1, AnswerValue::One(1))]);
        assert!(ensure_complete(&questions, &full).is_ok());
    }

    #[test]
    fn score_rounds_to_one_decimal() {
        // 2/3 of 10 marks = 6.666... -> 6.7
        let questions = vec![single(0), single(0), single(0)];
        let submitted = answers(&[
            (0, AnswerValue::One(0)),
            (1, AnswerValue::One(0)),
            (2, AnswerValue::One(1)),
        ]);
        let report = grade(&questions, &submitted, 10.0);
        assert_eq!(report.score, 6.7);
        assert!(!report.passed);
        assert_eq!(report.tier, Tier::Passable);
    }

    #[test]
    fn graded_submission_payload() {
        let questions = vec![single(0), single(1)];
        let submitted = answers(&[(0, AnswerValue::One(0)), (1, AnswerValue::One(1))]);
        let report = grade(&questions, &submitted, 20.0);
        assert_eq!(report.tier, Tier::Excellent);
        let submission = report.into_submission(5, 9);
        assert_eq!(submission.student_id, 5);
        assert_eq!(submission.assessment_id, 9);
        assert_eq!(submission.marks_obtained, 20.0);
        assert_eq!(submission.submission_status, SubmissionStatus::Graded);
        let records = submission.answer_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_correct));
    }
}
