use std::rc::Rc;

use serde::Serialize;

use crate::attempt::{parse_answer, Attempt};
use crate::clock::Clock;
use crate::error::SessionError;
use crate::generator::ProblemGenerator;
use crate::problem::{Difficulty, OperatorSet};
use crate::util::percentage;

pub const POINTS_PER_CORRECT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_generated: usize,
    pub total_answered: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Result of grading the attempt under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub is_correct: bool,
    pub correct_answer: i64,
    /// False when the attempt had already been graded; counters were left alone.
    pub newly_scored: bool,
}

/// Free practice: problems are generated on demand and can be revisited.
pub struct SessionState {
    generator: ProblemGenerator,
    clock: Rc<dyn Clock>,
    difficulty: Difficulty,
    operators: OperatorSet,
    attempts: Vec<Attempt>,
    cursor: Option<usize>,
    answered: usize,
    correct: usize,
}

impl SessionState {
    pub fn new(
        generator: ProblemGenerator,
        clock: Rc<dyn Clock>,
        difficulty: Difficulty,
        operators: OperatorSet,
    ) -> Self {
        Self {
            generator,
            clock,
            difficulty,
            operators,
            attempts: Vec::new(),
            cursor: None,
            answered: 0,
            correct: 0,
        }
    }

    pub fn start(&mut self) {
        self.attempts.clear();
        self.cursor = None;
        self.answered = 0;
        self.correct = 0;
        tracing::debug!(difficulty = %self.difficulty, operators = %self.operators, "practice started");
    }

    /// Only affects problems generated from now on.
    pub fn configure(&mut self, difficulty: Difficulty, operators: OperatorSet) {
        self.difficulty = difficulty;
        self.operators = operators;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn operators(&self) -> &OperatorSet {
        &self.operators
    }

    /// Moves forward, revisiting an existing attempt when there is one
    /// and generating a fresh problem only past the end.
    pub fn next_or_new(&mut self) -> &Attempt {
        let now = self.clock.now();
        let next = self.cursor.map_or(0, |c| c + 1);

        if next == self.attempts.len() {
            let problem = self.generator.generate(self.difficulty, &self.operators);
            tracing::trace!(%problem, "generated");
            self.attempts.push(Attempt::new(problem, now));
        } else {
            self.attempts[next].reveal(now);
        }

        self.cursor = Some(next);
        &self.attempts[next]
    }

    pub fn previous(&mut self) -> Result<&Attempt, SessionError> {
        match self.cursor {
            None => Err(SessionError::NoActiveProblem),
            Some(0) => Err(SessionError::AlreadyFirst),
            Some(c) => {
                let now = self.clock.now();
                self.cursor = Some(c - 1);
                let attempt = &mut self.attempts[c - 1];
                attempt.reveal(now);
                Ok(&*attempt)
            }
        }
    }

    /// Grades `raw_input` against the attempt under the cursor.
    ///
    /// Counters move only the first time an attempt is graded. Unparseable
    /// input is graded as incorrect and then reported as a `FormatError` so
    /// the caller can ask for a number.
    pub fn submit_answer(&mut self, raw_input: &str) -> Result<Submission, SessionError> {
        let idx = self.cursor.ok_or(SessionError::NoActiveProblem)?;
        let parsed = parse_answer(raw_input);
        let now = self.clock.now();

        let attempt = &mut self.attempts[idx];
        let newly_scored = attempt.grade(parsed.as_ref().ok().copied(), now);
        let is_correct = attempt.is_correct == Some(true);
        let correct_answer = attempt.problem.correct_answer;

        if newly_scored {
            self.answered += 1;
            if is_correct {
                self.correct += 1;
            }
        }

        tracing::debug!(index = idx, is_correct, newly_scored, "practice answer graded");

        parsed?;
        Ok(Submission {
            is_correct,
            correct_answer,
            newly_scored,
        })
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_generated: self.attempts.len(),
            total_answered: self.answered,
            correct: self.correct,
            accuracy: percentage(self.correct, self.answered),
        }
    }

    pub fn score(&self) -> usize {
        self.correct * POINTS_PER_CORRECT
    }

    pub fn current(&self) -> Option<&Attempt> {
        self.cursor.map(|c| &self.attempts[c])
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }
}
