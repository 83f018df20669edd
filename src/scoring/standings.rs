use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::score;
use crate::pool::models::{Match, MatchId, Scorelines};

/// One row of a pool's scoring table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standing {
    pub user_id: String,
    pub display_name: String,
    pub total_points: u32,
    pub points_by_match: HashMap<MatchId, u32>,
    pub rank: u32,
}

/// A user's prediction entry as consumed by the aggregator.
#[derive(Debug, Clone)]
pub struct PredictionEntry {
    pub user_id: String,
    pub display_name: String,
    pub scorelines: Scorelines,
}

/// Computes the ranked scoring table for one pool.
///
/// Matches without an actual result score 0 for every user. Rows are
/// ordered by total points descending, then by display name so ties have
/// a deterministic order, and ranked with competition ranking (1, 1, 3).
pub fn compute_standings(
    matches: &[Match],
    actuals: &Scorelines,
    predictions: &[PredictionEntry],
) -> Vec<Standing> {
    let mut rows: Vec<Standing> = predictions
        .iter()
        .map(|entry| {
            let mut points_by_match = HashMap::with_capacity(matches.len());
            let mut total_points = 0;
            for m in matches {
                let points = score(
                    entry.scorelines.get(&m.id).copied(),
                    actuals.get(&m.id).copied(),
                );
                total_points += points;
                points_by_match.insert(m.id.clone(), points);
            }
            Standing {
                user_id: entry.user_id.clone(),
                display_name: entry.display_name.clone(),
                total_points,
                points_by_match,
                rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    assign_ranks(&mut rows, |row| row.total_points, |row, rank| row.rank = rank);
    rows
}

/// Assigns competition ranks over an already sorted (descending) slice:
/// equal scores share a rank and the next distinct score takes its
/// 1-based position.
pub fn assign_ranks<T, S, F, G>(rows: &mut [T], score_of: F, mut set_rank: G)
where
    S: PartialEq,
    F: Fn(&T) -> S,
    G: FnMut(&mut T, u32),
{
    let mut rank = 0;
    let mut last_score: Option<S> = None;
    for (index, row) in rows.iter_mut().enumerate() {
        let current = score_of(row);
        if last_score.as_ref() != Some(&current) {
            rank = index as u32 + 1;
            last_score = Some(current);
        }
        set_rank(row, rank);
    }
}
