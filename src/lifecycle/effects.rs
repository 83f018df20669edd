use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pool::models::{Pool, WinnerEntry};
use crate::scoring::{Standing, EXACT_HIT_POINTS};
use crate::stats::models::{achievements, UserRecord};

/// Thresholds for the pool-scoped badges.
const HIGH_SCORER_POINTS: u32 = 30;
const DIAMOND_EXACT_HITS: u32 = 5;

/// Counter mutations for one scored user, fully resolved before anything
/// is written. `unlock` already contains the pool-scoped badges so the
/// store only has to apply it, never evaluate rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDelta {
    pub user_id: String,
    pub display_name: String,
    /// The user's total score in this pool.
    pub points: u32,
    /// Matches this user hit exactly in this pool.
    pub exact_hits: u32,
    /// True when the user's score equals the pool minimum. Ties for last
    /// place all count.
    pub last_place: bool,
    pub unlock: Vec<String>,
}

/// Everything `close` applies to user counters and the leaderboard, as
/// one all-or-nothing unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseEffects {
    pub pool_id: String,
    pub winners: Vec<WinnerEntry>,
    pub deltas: Vec<UserDelta>,
}

/// Builds the close effects for a pool from its freshly computed
/// standings. `records` holds the users' current lifetime state, which
/// the first-last-place badge depends on; users without a record yet are
/// treated as blank.
pub fn build_close_effects(
    pool: &Pool,
    standings: &[Standing],
    records: &HashMap<String, UserRecord>,
) -> CloseEffects {
    if standings.is_empty() {
        return CloseEffects {
            pool_id: pool.id.clone(),
            winners: Vec::new(),
            deltas: Vec::new(),
        };
    }

    let max_score = standings.iter().map(|s| s.total_points).max().unwrap_or(0);
    let min_score = standings.iter().map(|s| s.total_points).min().unwrap_or(0);

    let winners = standings
        .iter()
        .filter(|s| s.total_points == max_score)
        .map(|s| WinnerEntry {
            user_id: s.user_id.clone(),
            display_name: s.display_name.clone(),
            points: s.total_points,
        })
        .collect();

    let deltas = standings
        .iter()
        .map(|standing| {
            let exact_hits = standing
                .points_by_match
                .values()
                .filter(|&&points| points == EXACT_HIT_POINTS)
                .count() as u32;
            let last_place = standing.total_points == min_score;
            let unlock = pool_badges(pool, standing, exact_hits, last_place, records);
            UserDelta {
                user_id: standing.user_id.clone(),
                display_name: standing.display_name.clone(),
                points: standing.total_points,
                exact_hits,
                last_place,
                unlock,
            }
        })
        .collect();

    CloseEffects {
        pool_id: pool.id.clone(),
        winners,
        deltas,
    }
}

/// Counter mutations `reopen` reverses, recomputed from current
/// standings. Badges are intentionally absent: achievements survive a
/// reopen.
pub fn build_reopen_deltas(standings: &[Standing]) -> Vec<UserDelta> {
    if standings.is_empty() {
        return Vec::new();
    }
    let min_score = standings.iter().map(|s| s.total_points).min().unwrap_or(0);
    standings
        .iter()
        .map(|standing| UserDelta {
            user_id: standing.user_id.clone(),
            display_name: standing.display_name.clone(),
            points: standing.total_points,
            exact_hits: 0,
            last_place: standing.total_points == min_score,
            unlock: Vec::new(),
        })
        .collect()
}

fn pool_badges(
    pool: &Pool,
    standing: &Standing,
    exact_hits: u32,
    last_place: bool,
    records: &HashMap<String, UserRecord>,
) -> Vec<String> {
    let mut unlock = Vec::new();
    if standing.total_points >= HIGH_SCORER_POINTS {
        unlock.push(achievements::GOLEADOR_FECHA.to_string());
    }
    if exact_hits >= DIAMOND_EXACT_HITS {
        unlock.push(achievements::QUINIELA_DIAMANTE.to_string());
    }
    if exact_hits == 0 && !pool.matches.is_empty() {
        unlock.push(achievements::POLVORA_MOJADA.to_string());
    }
    if last_place {
        let first_time = records
            .get(&standing.user_id)
            .map_or(true, |r| r.last_place_finishes == 0);
        if first_time {
            unlock.push(achievements::DEBUT_FONDO.to_string());
        }
    }
    unlock
}
