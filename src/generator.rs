use std::collections::VecDeque;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use crate::error::ConfigurationError;
use crate::problem::{Difficulty, Operator, OperatorSet, Problem};

/// Uniform randomness consumed by the generator.
pub trait RandomSource {
    /// Uniform integer in `lo..=hi`.
    fn randint(&mut self, lo: i64, hi: i64) -> i64;

    /// Uniform index in `0..len`; `len` is never zero.
    fn choose_index(&mut self, len: usize) -> usize;
}

pub fn choice<T: Copy>(random: &mut dyn RandomSource, items: &[T]) -> T {
    items[random.choose_index(items.len())]
}

/// `RandomSource` backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::thread_rng())
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn randint(&mut self, lo: i64, hi: i64) -> i64 {
        self.0.gen_range(lo..=hi)
    }

    fn choose_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Replays queued values, clamped into whatever range is asked for.
/// Once the queue is empty it keeps returning the low bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<i64>,
}

impl ScriptedRandom {
    pub fn new<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn randint(&mut self, lo: i64, hi: i64) -> i64 {
        self.values.pop_front().unwrap_or(lo).clamp(lo, hi)
    }

    fn choose_index(&mut self, len: usize) -> usize {
        let value = self.values.pop_front().unwrap_or(0).max(0) as usize;
        value % len
    }
}

/// Largest operand magnitude a range may reach. Products of two such
/// operands stay well inside `i64`.
pub const MAX_OPERAND: i64 = 1_000_000;

/// Inclusive, non-empty operand bounds within `±MAX_OPERAND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandRange {
    min: i64,
    max: i64,
}

impl OperandRange {
    pub fn new(min: i64, max: i64) -> Result<Self, ConfigurationError> {
        let bounded = |v: i64| (-MAX_OPERAND..=MAX_OPERAND).contains(&v);
        if min > max || !bounded(min) || !bounded(max) {
            return Err(ConfigurationError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// `1..=max` for the built-in tiers.
    const fn up_to(max: i64) -> Self {
        Self { min: 1, max }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    fn draw(&self, random: &mut dyn RandomSource) -> i64 {
        random.randint(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRanges {
    /// Operands for `+` and `-`.
    pub additive: OperandRange,
    pub multiplicative: OperandRange,
    pub divisor: OperandRange,
    pub quotient: OperandRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandRanges {
    pub easy: TierRanges,
    pub medium: TierRanges,
    pub hard: TierRanges,
}

impl OperandRanges {
    pub fn for_difficulty(&self, difficulty: Difficulty) -> &TierRanges {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

impl Default for OperandRanges {
    fn default() -> Self {
        let tier = |additive, multiplicative| TierRanges {
            additive: OperandRange::up_to(additive),
            multiplicative: OperandRange::up_to(multiplicative),
            divisor: OperandRange::up_to(multiplicative),
            quotient: OperandRange::up_to(10),
        };
        Self {
            easy: tier(20, 10),
            medium: tier(50, 20),
            hard: tier(100, 30),
        }
    }
}

/// Produces problems that always satisfy the `Problem` invariants.
pub struct ProblemGenerator {
    random: Box<dyn RandomSource>,
    ranges: OperandRanges,
}

impl ProblemGenerator {
    pub fn new(random: Box<dyn RandomSource>) -> Self {
        Self::with_ranges(random, OperandRanges::default())
    }

    /// Every `OperandRange` is non-empty and bounded, so any set of ranges
    /// can be drawn from.
    pub fn with_ranges(random: Box<dyn RandomSource>, ranges: OperandRanges) -> Self {
        Self { random, ranges }
    }

    pub fn live() -> Self {
        Self::new(Box::new(RngSource::thread()))
    }

    pub fn generate(&mut self, difficulty: Difficulty, operators: &OperatorSet) -> Problem {
        loop {
            if let Some(problem) = self.draw(difficulty, operators) {
                return problem;
            }
            tracing::debug!(%difficulty, "redrawing rejected problem");
        }
    }

    fn draw(&mut self, difficulty: Difficulty, operators: &OperatorSet) -> Option<Problem> {
        let random = self.random.as_mut();
        let tier = self.ranges.for_difficulty(difficulty);
        let operator = choice(random, operators.as_slice());

        match operator {
            Operator::Add | Operator::Sub => {
                let a = tier.additive.draw(random);
                let b = tier.additive.draw(random);
                let (left, right) = if operator == Operator::Sub && a < b {
                    (b, a)
                } else {
                    (a, b)
                };
                Problem::new(left, operator, right)
            }
            Operator::Mul => {
                let left = tier.multiplicative.draw(random);
                let right = tier.multiplicative.draw(random);
                Problem::new(left, operator, right)
            }
            Operator::Div => {
                // Divisor first, dividend derived, so division is always exact.
                let divisor = tier.divisor.draw(random).max(1);
                let quotient = tier.quotient.draw(random);
                Problem::new(divisor * quotient, operator, divisor)
            }
        }
    }
}

impl std::fmt::Debug for ProblemGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProblemGenerator")
            .field("ranges", &self.ranges)
            .finish_non_exhaustive()
    }
}
