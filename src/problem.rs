use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    /// `None` when the result does not fit in an `i64` or the divisor is zero.
    fn apply(self, left: i64, right: i64) -> Option<i64> {
        match self {
            Operator::Add => left.checked_add(right),
            Operator::Sub => left.checked_sub(right),
            Operator::Mul => left.checked_mul(right),
            Operator::Div => left.checked_div(right),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "add" | "plus" => Ok(Operator::Add),
            "-" | "sub" | "minus" => Ok(Operator::Sub),
            "*" | "x" | "×" | "mul" | "times" => Ok(Operator::Mul),
            "/" | "÷" | "div" => Ok(Operator::Div),
            _ => Err(ConfigurationError::UnknownOperator(s.to_string())),
        }
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Non-empty, de-duplicated set of operators a generator may pick from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSet(Vec<Operator>);

impl OperatorSet {
    pub fn new<I: IntoIterator<Item = Operator>>(ops: I) -> Result<Self, ConfigurationError> {
        let mut ops: Vec<Operator> = ops.into_iter().collect();
        ops.sort();
        ops.dedup();
        if ops.is_empty() {
            return Err(ConfigurationError::EmptyOperatorSet);
        }
        Ok(Self(ops))
    }

    /// Resolves an empty selection to addition.
    pub fn from_selection_or_default<I: IntoIterator<Item = Operator>>(ops: I) -> Self {
        match Self::new(ops) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to addition");
                Self(vec![Operator::Add])
            }
        }
    }

    pub fn all() -> Self {
        Self(Operator::ALL.to_vec())
    }

    pub fn as_slice(&self) -> &[Operator] {
        &self.0
    }

    pub fn contains(&self, op: Operator) -> bool {
        self.0.contains(&op)
    }
}

impl Default for OperatorSet {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for OperatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<String> = self.0.iter().map(|op| op.to_string()).collect();
        write!(f, "{}", symbols.join(" "))
    }
}

/// A single arithmetic question with its precomputed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub left_operand: i64,
    pub operator: Operator,
    pub right_operand: i64,
    pub correct_answer: i64,
}

impl Problem {
    /// Builds a problem, rejecting negative differences, inexact or zero division,
    /// and answers that overflow.
    pub fn new(left_operand: i64, operator: Operator, right_operand: i64) -> Option<Self> {
        let valid = match operator {
            Operator::Sub => left_operand >= right_operand,
            Operator::Div => right_operand > 0 && left_operand % right_operand == 0,
            Operator::Add | Operator::Mul => true,
        };
        if !valid {
            return None;
        }

        let correct_answer = operator.apply(left_operand, right_operand)?;
        Some(Self {
            left_operand,
            operator,
            right_operand,
            correct_answer,
        })
    }

    pub fn is_correct(&self, answer: i64) -> bool {
        answer == self.correct_answer
    }

    pub fn question(&self) -> String {
        self.to_string()
    }

    /// Recovers operands and operator from the `"a op b = ?"` display form.
    pub fn parse_question(text: &str) -> Option<(i64, Operator, i64)> {
        let mut parts = text.split_whitespace();
        let left = parts.next()?.parse().ok()?;
        let op = parts.next()?.parse().ok()?;
        let right = parts.next()?.parse().ok()?;
        Some((left, op, right))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} = ?",
            self.left_operand, self.operator, self.right_operand
        )
    }
}
