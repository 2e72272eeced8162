//! Timed challenge: a fixed batch of problems answered against a deadline.
//!
//! The deadline is checked lazily. Nothing runs in the background; the
//! owner polls [`TimedSession::time_remaining`] (the TUI does so on every
//! tick) and the challenge finishes on the first poll at or past the limit.

use std::rc::Rc;

use serde::Serialize;

use crate::attempt::{parse_answer, Attempt};
use crate::clock::Clock;
use crate::generator::ProblemGenerator;
use crate::problem::{Difficulty, OperatorSet};
use crate::records::ChallengeRecord;
use crate::util::percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    NotStarted,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome {
    pub is_correct: bool,
    /// Answer to the question that was just checked, if there was one.
    pub correct_answer: Option<i64>,
    pub is_finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChallengeResults {
    pub total_questions: usize,
    pub attempted: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub time_taken: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// 1-based position of the question on screen.
    pub current: usize,
    pub total: usize,
    pub correct: usize,
    pub remaining_time: f64,
}

pub struct TimedSession {
    generator: ProblemGenerator,
    clock: Rc<dyn Clock>,
    attempts: Vec<Attempt>,
    index: usize,
    correct: usize,
    time_limit: f64,
    started_at: f64,
    finished_at: Option<f64>,
    state: ChallengeState,
    pending_record: Option<ChallengeRecord>,
}

impl TimedSession {
    pub fn new(generator: ProblemGenerator, clock: Rc<dyn Clock>) -> Self {
        Self {
            generator,
            clock,
            attempts: Vec::new(),
            index: 0,
            correct: 0,
            time_limit: 0.0,
            started_at: 0.0,
            finished_at: None,
            state: ChallengeState::NotStarted,
            pending_record: None,
        }
    }

    /// Discards any previous challenge and generates every question up front.
    /// A zero question count is raised to one.
    pub fn start_challenge(
        &mut self,
        operators: &OperatorSet,
        difficulty: Difficulty,
        question_count: usize,
        time_limit: f64,
    ) {
        if question_count == 0 {
            tracing::warn!("challenge needs at least one question, using 1");
        }
        let question_count = question_count.max(1);

        self.attempts.clear();
        let now = self.clock.now();
        for _ in 0..question_count {
            let problem = self.generator.generate(difficulty, operators);
            self.attempts.push(Attempt::new(problem, now));
        }

        self.index = 0;
        self.correct = 0;
        self.time_limit = time_limit.max(0.0);
        self.started_at = now;
        self.finished_at = None;
        self.pending_record = None;
        self.state = ChallengeState::Running;

        tracing::info!(
            question_count,
            time_limit = self.time_limit,
            %difficulty,
            %operators,
            "challenge started"
        );
    }

    /// Seconds left. Finishes the challenge when the deadline has passed.
    pub fn time_remaining(&mut self) -> f64 {
        if self.state != ChallengeState::Running {
            return 0.0;
        }

        let remaining = (self.time_limit - self.elapsed()).max(0.0);
        if remaining <= 0.0 {
            tracing::info!(attempted = self.index, "challenge timed out");
            self.finish();
        }
        remaining
    }

    /// Grades the current question and moves on.
    ///
    /// Never fails: outside a running challenge it reports finished, and an
    /// answer that is not a number is reported as incorrect without using up
    /// the question.
    pub fn check_answer(&mut self, raw_input: &str) -> CheckOutcome {
        if self.state == ChallengeState::Running {
            self.time_remaining();
        }
        if self.state != ChallengeState::Running {
            return CheckOutcome {
                is_correct: false,
                correct_answer: self.current().map(|a| a.problem.correct_answer),
                is_finished: true,
            };
        }

        let now = self.clock.now();
        let attempt = &mut self.attempts[self.index];
        let correct_answer = Some(attempt.problem.correct_answer);

        let answer = match parse_answer(raw_input) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring malformed challenge answer");
                return CheckOutcome {
                    is_correct: false,
                    correct_answer,
                    is_finished: false,
                };
            }
        };

        attempt.grade(Some(answer), now);
        let is_correct = attempt.is_correct == Some(true);
        if is_correct {
            self.correct += 1;
        }

        self.index += 1;
        if let Some(next) = self.attempts.get_mut(self.index) {
            next.reveal(now);
        } else {
            self.finish();
        }

        CheckOutcome {
            is_correct,
            correct_answer,
            is_finished: self.state == ChallengeState::Finished,
        }
    }

    /// Snapshot of the scores; valid mid-challenge too.
    pub fn results(&self) -> ChallengeResults {
        ChallengeResults {
            total_questions: self.attempts.len(),
            attempted: self.index,
            correct: self.correct,
            accuracy: percentage(self.correct, self.index),
            time_taken: self.elapsed().min(self.time_limit),
        }
    }

    pub fn progress(&self) -> Progress {
        let remaining_time = match self.state {
            ChallengeState::Running => (self.time_limit - self.elapsed()).max(0.0),
            _ => 0.0,
        };
        Progress {
            current: (self.index + 1).min(self.attempts.len()),
            total: self.attempts.len(),
            correct: self.correct,
            remaining_time,
        }
    }

    /// The finished challenge's record, handed out once.
    pub fn take_finished_record(&mut self) -> Option<ChallengeRecord> {
        self.pending_record.take()
    }

    pub fn state(&self) -> ChallengeState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ChallengeState::Running
    }

    pub fn time_limit(&self) -> f64 {
        self.time_limit
    }

    /// The question awaiting an answer, or the last one once all are answered.
    pub fn current(&self) -> Option<&Attempt> {
        self.attempts
            .get(self.index)
            .or_else(|| self.attempts.last())
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    fn elapsed(&self) -> f64 {
        match self.state {
            ChallengeState::NotStarted => 0.0,
            _ => self.finished_at.unwrap_or_else(|| self.clock.now()) - self.started_at,
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(self.clock.now());
        self.state = ChallengeState::Finished;

        let results = self.results();
        tracing::info!(
            attempted = results.attempted,
            correct = results.correct,
            time_taken = results.time_taken,
            "challenge finished"
        );
        self.pending_record = Some(ChallengeRecord::new(&results, &self.attempts));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::generator::ScriptedRandom;
    use crate::problem::Operator;

    /// Challenge of `count` questions, all `1 + 1`.
    fn ones_challenge(count: usize, limit: f64) -> (TimedSession, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let script = std::iter::repeat([0, 1, 1]).take(count).flatten();
        let generator = ProblemGenerator::new(Box::new(ScriptedRandom::new(script)));
        let mut session = TimedSession::new(generator, clock.clone());
        session.start_challenge(
            &OperatorSet::new([Operator::Add]).unwrap(),
            Difficulty::Easy,
            count,
            limit,
        );
        (session, clock)
    }

    #[test]
    fn test_not_started() {
        let clock = Rc::new(ManualClock::new());
        let mut session = TimedSession::new(ProblemGenerator::live(), clock);

        assert_eq!(session.state(), ChallengeState::NotStarted);
        assert_eq!(session.time_remaining(), 0.0);
        let outcome = session.check_answer("2");
        assert!(outcome.is_finished);
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_answer, None);
    }

    #[test]
    fn test_problems_are_generated_eagerly() {
        let (session, _) = ones_challenge(5, 60.0);
        assert_eq!(session.attempts().len(), 5);
        assert_eq!(session.state(), ChallengeState::Running);
        assert_eq!(session.results().attempted, 0);
    }

    #[test]
    fn test_all_correct_before_timeout() {
        let (mut session, clock) = ones_challenge(3, 60.0);

        for i in 0..3 {
            clock.advance(2.0);
            let outcome = session.check_answer("2");
            assert!(outcome.is_correct);
            assert_eq!(outcome.correct_answer, Some(2));
            assert_eq!(outcome.is_finished, i == 2);
        }

        let results = session.results();
        assert_eq!(results.correct, 3);
        assert_eq!(results.attempted, 3);
        assert_eq!(results.accuracy, 100.0);
        assert_eq!(results.time_taken, 6.0);
        assert_eq!(session.state(), ChallengeState::Finished);
    }

    #[test]
    fn test_timeout_with_partial_progress() {
        let (mut session, clock) = ones_challenge(3, 60.0);
        session.check_answer("2");

        clock.advance(30.0);
        assert_eq!(session.time_remaining(), 30.0);
        assert!(session.is_running());

        clock.advance(31.0);
        assert_eq!(session.time_remaining(), 0.0);
        assert_eq!(session.state(), ChallengeState::Finished);

        let results = session.results();
        assert_eq!(results.attempted, 1);
        assert_eq!(results.total_questions, 3);
        assert_eq!(results.time_taken, 60.0);
    }

    #[test]
    fn test_check_after_finish_leaves_counters() {
        let (mut session, _) = ones_challenge(1, 60.0);
        assert!(session.check_answer("2").is_finished);

        let outcome = session.check_answer("2");
        assert!(outcome.is_finished);
        assert!(!outcome.is_correct);
        assert_eq!(session.results().correct, 1);
        assert_eq!(session.results().attempted, 1);
    }

    #[test]
    fn test_answer_after_deadline_is_not_counted() {
        let (mut session, clock) = ones_challenge(3, 10.0);
        clock.advance(11.0);

        let outcome = session.check_answer("2");

        assert!(outcome.is_finished);
        assert!(!outcome.is_correct);
        assert_eq!(session.results().attempted, 0);
    }

    #[test]
    fn test_malformed_answer_does_not_advance() {
        let (mut session, _) = ones_challenge(2, 60.0);

        let outcome = session.check_answer("two");

        assert!(!outcome.is_correct);
        assert!(!outcome.is_finished);
        assert_eq!(outcome.correct_answer, Some(2));
        assert_eq!(session.results().attempted, 0);
        assert_eq!(session.progress().current, 1);
    }

    #[test]
    fn test_wrong_answer_still_advances() {
        let (mut session, _) = ones_challenge(2, 60.0);

        let outcome = session.check_answer("3");

        assert!(!outcome.is_correct);
        assert_eq!(session.results().attempted, 1);
        assert_eq!(session.results().correct, 0);
        assert_eq!(session.attempts()[0].submitted_answer, Some(3));
    }

    #[test]
    fn test_record_is_handed_out_once() {
        let (mut session, _) = ones_challenge(1, 60.0);
        assert!(session.take_finished_record().is_none());

        session.check_answer("2");

        let record = session.take_finished_record().unwrap();
        assert_eq!(record.correct, 1);
        assert_eq!(record.questions.len(), 1);
        assert!(session.take_finished_record().is_none());
    }

    #[test]
    fn test_time_taken_freezes_at_finish() {
        let (mut session, clock) = ones_challenge(1, 60.0);
        clock.advance(4.0);
        session.check_answer("2");
        clock.advance(100.0);
        assert_eq!(session.results().time_taken, 4.0);
    }

    #[test]
    fn test_restart_discards_previous_challenge() {
        let (mut session, clock) = ones_challenge(2, 60.0);
        session.check_answer("2");
        clock.advance(70.0);
        session.time_remaining();
        assert_eq!(session.state(), ChallengeState::Finished);

        session.start_challenge(&OperatorSet::all(), Difficulty::Hard, 4, 30.0);

        assert!(session.is_running());
        assert_eq!(session.attempts().len(), 4);
        assert_eq!(session.results().attempted, 0);
        assert_eq!(session.progress().remaining_time, 30.0);
        assert!(session.take_finished_record().is_none());
    }

    #[test]
    fn test_progress() {
        let (mut session, clock) = ones_challenge(3, 60.0);
        session.check_answer("2");
        clock.advance(15.0);

        let progress = session.progress();
        assert_eq!(progress.current, 2);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.correct, 1);
        assert_eq!(progress.remaining_time, 45.0);
    }
}
