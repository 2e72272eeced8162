use serde::Serialize;

use crate::error::FormatError;
use crate::problem::Problem;

/// Parses a typed answer. Surrounding whitespace and a leading `+` are accepted.
pub fn parse_answer(raw: &str) -> Result<i64, FormatError> {
    raw.trim().parse::<i64>().map_err(|_| FormatError {
        input: raw.to_string(),
    })
}

/// One problem together with what the user did with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub problem: Problem,
    pub submitted_answer: Option<i64>,
    pub is_correct: Option<bool>,
    pub elapsed_time: f64,
    #[serde(skip)]
    shown_at: f64,
}

impl Attempt {
    pub fn new(problem: Problem, shown_at: f64) -> Self {
        Self {
            problem,
            submitted_answer: None,
            is_correct: None,
            elapsed_time: 0.0,
            shown_at,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.is_correct.is_some()
    }

    /// Restarts the answer timer when the attempt is shown again.
    pub(crate) fn reveal(&mut self, now: f64) {
        self.shown_at = now;
    }

    /// Records a graded answer; `None` means the input was not a number.
    /// Returns true when this is the first time the attempt was graded.
    pub(crate) fn grade(&mut self, answer: Option<i64>, now: f64) -> bool {
        let first = !self.is_answered();
        self.submitted_answer = answer;
        self.is_correct = Some(answer.is_some_and(|a| self.problem.is_correct(a)));
        self.elapsed_time = (now - self.shown_at).max(0.0);
        first
    }
}
