use itertools::Itertools;

use crate::problem::{Operator, Problem};
use crate::records::{ChallengeRecord, ExerciseRecord, JsonRecordStore};
use crate::util::{mean, percentage};

/// Aggregates over individually graded practice answers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PracticeStats {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub accuracy: f64,
    pub average_time: f64,
}

impl PracticeStats {
    pub fn from_records(records: &[ExerciseRecord]) -> Self {
        let correct_answers = records.iter().filter(|r| r.is_correct).count();
        let times: Vec<f64> = records.iter().map(|r| r.time_taken).collect();

        Self {
            total_questions: records.len(),
            correct_answers,
            accuracy: percentage(correct_answers, records.len()),
            average_time: mean(&times).unwrap_or(0.0),
        }
    }
}

/// Aggregates over finished timed challenges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChallengeStats {
    pub total_challenges: usize,
    pub total_questions: usize,
    pub attempted_questions: usize,
    pub correct_answers: usize,
    pub accuracy: f64,
    pub completion_rate: f64,
}

impl ChallengeStats {
    pub fn from_records(records: &[ChallengeRecord]) -> Self {
        let total_questions = records.iter().map(|r| r.total_questions).sum();
        let attempted_questions = records.iter().map(|r| r.attempted).sum();
        let correct_answers = records.iter().map(|r| r.correct).sum();

        Self {
            total_challenges: records.len(),
            total_questions,
            attempted_questions,
            correct_answers,
            accuracy: percentage(correct_answers, attempted_questions),
            completion_rate: percentage(attempted_questions, total_questions),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorStats {
    pub operator: Operator,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub average_time: f64,
}

/// Per-operator figures for practice answers, in `Operator` order.
/// Records whose question text cannot be parsed are left out.
pub fn operator_breakdown(records: &[ExerciseRecord]) -> Vec<OperatorStats> {
    records
        .iter()
        .filter_map(|r| Problem::parse_question(&r.question).map(|(_, op, _)| (op, r)))
        .into_group_map()
        .into_iter()
        .map(|(operator, group)| {
            let correct = group.iter().filter(|r| r.is_correct).count();
            let times: Vec<f64> = group.iter().map(|r| r.time_taken).collect();
            OperatorStats {
                operator,
                attempts: group.len(),
                correct,
                accuracy: percentage(correct, group.len()),
                average_time: mean(&times).unwrap_or(0.0),
            }
        })
        .sorted_by_key(|s| s.operator)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsReport {
    pub days: u32,
    pub practice: PracticeStats,
    pub challenge: ChallengeStats,
    pub operators: Vec<OperatorStats>,
}

impl StatsReport {
    pub fn from_history(
        days: u32,
        practice: &[ExerciseRecord],
        challenges: &[ChallengeRecord],
    ) -> Self {
        Self {
            days,
            practice: PracticeStats::from_records(practice),
            challenge: ChallengeStats::from_records(challenges),
            operators: operator_breakdown(practice),
        }
    }

    pub fn load(store: &JsonRecordStore, days: u32) -> Self {
        let practice = store.practice_history(days);
        let challenges = store.challenge_history(days);
        tracing::debug!(
            days,
            practice = practice.len(),
            challenges = challenges.len(),
            "loaded history"
        );
        Self::from_history(days, &practice, &challenges)
    }

    pub fn is_empty(&self) -> bool {
        self.practice.total_questions == 0 && self.challenge.total_challenges == 0
    }
}
