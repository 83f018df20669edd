pub mod standings;

pub use standings::{assign_ranks, compute_standings, PredictionEntry, Standing};

use serde::{Deserialize, Serialize};

/// A (home, away) goal-count pair. Absence of a scoreline is modeled as
/// `Option<Scoreline>` by callers; an unset result is distinct from 0-0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreline {
    pub home: u32,
    pub away: u32,
}

impl Scoreline {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn outcome(&self) -> Outcome {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

impl std::fmt::Display for Scoreline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

/// Match outcome category derived from a scoreline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

/// Points awarded for a single exact scoreline hit.
pub const EXACT_HIT_POINTS: u32 = 6;

/// Scores one prediction against one actual result.
///
/// Returns 0 when either scoreline is absent. An exact hit is worth 6 and
/// is exclusive of the tiered bonuses; otherwise the outcome category is
/// worth 2 and each correctly predicted side is worth 1.
pub fn score(predicted: Option<Scoreline>, actual: Option<Scoreline>) -> u32 {
    let (pred, real) = match (predicted, actual) {
        (Some(p), Some(r)) => (p, r),
        _ => return 0,
    };

    if pred == real {
        return EXACT_HIT_POINTS;
    }

    let mut points = 0;
    if pred.outcome() == real.outcome() {
        points += 2;
    }
    if pred.home == real.home {
        points += 1;
    }
    if pred.away == real.away {
        points += 1;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn s(home: u32, away: u32) -> Option<Scoreline> {
        Some(Scoreline::new(home, away))
    }

    #[rstest]
    #[case(s(2, 1), s(2, 1), 6)] // exact hit
    #[case(s(1, 0), s(2, 1), 2)] // outcome only
    #[case(s(2, 0), s(2, 1), 3)] // outcome + home goals
    #[case(s(0, 1), s(2, 1), 1)] // away goals only, outcome differs
    #[case(s(0, 0), s(2, 2), 2)] // predicted draw, different scoreline
    #[case(s(1, 1), s(2, 1), 0)] // nothing right
    #[case(s(3, 1), s(2, 1), 3)] // outcome + away goals
    fn tiered_scoring(
        #[case] predicted: Option<Scoreline>,
        #[case] actual: Option<Scoreline>,
        #[case] expected: u32,
    ) {
        assert_eq!(score(predicted, actual), expected);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(4, 2)]
    #[case(0, 7)]
    fn exact_hit_is_always_six(#[case] home: u32, #[case] away: u32) {
        assert_eq!(score(s(home, away), s(home, away)), EXACT_HIT_POINTS);
    }

    #[test]
    fn missing_scoreline_scores_zero() {
        assert_eq!(score(None, s(2, 1)), 0);
        assert_eq!(score(s(2, 1), None), 0);
        assert_eq!(score(None, None), 0);
    }

    #[test]
    fn outcome_categories() {
        assert_eq!(Scoreline::new(2, 1).outcome(), Outcome::HomeWin);
        assert_eq!(Scoreline::new(0, 3).outcome(), Outcome::AwayWin);
        assert_eq!(Scoreline::new(1, 1).outcome(), Outcome::Draw);
    }
}
