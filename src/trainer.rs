use std::rc::Rc;

use crate::attempt::Attempt;
use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use crate::generator::ProblemGenerator;
use crate::problem::{Difficulty, Operator, OperatorSet};
use crate::records::{ExerciseRecord, Record, RecordSink};
use crate::session::{SessionState, Submission};
use crate::settings::Settings;
use crate::timed::{CheckOutcome, TimedSession};

/// Owns both practice modes and forwards graded work to a record sink.
///
/// Practice answers are recorded the first time they are scored. A timed
/// challenge is recorded once, when it finishes by answer or by timeout.
pub struct Trainer {
    settings: Settings,
    practice: SessionState,
    challenge: TimedSession,
    sink: Box<dyn RecordSink>,
}

impl Trainer {
    pub fn new(
        settings: Settings,
        practice_generator: ProblemGenerator,
        challenge_generator: ProblemGenerator,
        clock: Rc<dyn Clock>,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        let practice = SessionState::new(
            practice_generator,
            clock.clone(),
            settings.difficulty,
            settings.operator_set(),
        );
        let challenge = TimedSession::new(challenge_generator, clock);

        Self {
            settings,
            practice,
            challenge,
            sink,
        }
    }

    pub fn live(settings: Settings, sink: Box<dyn RecordSink>) -> Self {
        Self::new(
            settings,
            ProblemGenerator::live(),
            ProblemGenerator::live(),
            Rc::new(SystemClock::new()),
            sink,
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn practice(&self) -> &SessionState {
        &self.practice
    }

    pub fn challenge(&self) -> &TimedSession {
        &self.challenge
    }

    pub fn start_practice(&mut self) -> &Attempt {
        self.practice.start();
        self.practice.next_or_new()
    }

    pub fn next_problem(&mut self) -> &Attempt {
        self.practice.next_or_new()
    }

    pub fn previous_problem(&mut self) -> Result<&Attempt, SessionError> {
        self.practice.previous()
    }

    pub fn submit_practice(&mut self, raw_input: &str) -> Result<Submission, SessionError> {
        let answered_before = self.practice.summary().total_answered;
        let result = self.practice.submit_answer(raw_input);

        if self.practice.summary().total_answered > answered_before {
            if let Some(attempt) = self.practice.current() {
                self.sink
                    .save(Record::Basic(ExerciseRecord::from_attempt(attempt)));
            }
        }
        result
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
        self.reconfigure_practice();
    }

    pub fn set_operators(&mut self, operators: &OperatorSet) {
        self.settings.set_operators(operators);
        self.reconfigure_practice();
    }

    /// Adds or removes `op`. Removing the last operator is refused.
    pub fn toggle_operator(&mut self, op: Operator) -> bool {
        let current = self.settings.operator_set();
        let toggled: Vec<Operator> = if current.contains(op) {
            current.as_slice().iter().copied().filter(|o| *o != op).collect()
        } else {
            current
                .as_slice()
                .iter()
                .copied()
                .chain(std::iter::once(op))
                .collect()
        };

        match OperatorSet::new(toggled) {
            Ok(ops) => {
                self.set_operators(&ops);
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, %op, "operator toggle refused");
                false
            }
        }
    }

    pub fn set_timed_mode(&mut self, time_limit: u64, question_count: usize) {
        self.settings.timed_mode.time_limit = time_limit;
        self.settings.timed_mode.question_count = question_count;
    }

    /// Starts a challenge from the current settings.
    pub fn start_challenge(&mut self) {
        let timed = self.settings.timed_mode;
        self.challenge.start_challenge(
            &self.settings.operator_set(),
            self.settings.difficulty,
            timed.question_count,
            timed.time_limit as f64,
        );
    }

    pub fn check_challenge(&mut self, raw_input: &str) -> CheckOutcome {
        let outcome = self.challenge.check_answer(raw_input);
        self.flush_challenge();
        outcome
    }

    /// Polls the running challenge. Returns the seconds left.
    pub fn tick(&mut self) -> f64 {
        let remaining = self.challenge.time_remaining();
        self.flush_challenge();
        remaining
    }

    /// The settings to persist, with `last_login` refreshed.
    pub fn into_settings(mut self) -> Settings {
        self.settings.touch_login();
        self.settings
    }

    fn reconfigure_practice(&mut self) {
        self.practice
            .configure(self.settings.difficulty, self.settings.operator_set());
    }

    fn flush_challenge(&mut self) {
        if let Some(record) = self.challenge.take_finished_record() {
            self.sink.save(Record::Timed(record));
        }
    }
}
