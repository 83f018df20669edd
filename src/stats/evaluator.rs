use serde::{Deserialize, Serialize};

use super::models::achievements;
use crate::pool::models::{Pool, Prediction};
use crate::scoring::{score, EXACT_HIT_POINTS};

/// Lifetime points needed for the milestone badge.
const POINTS_MILESTONE: u64 = 500;
/// Consecutive wins needed for the streak badge.
const STREAK_BADGE_RUNS: u32 = 3;

/// One closed pool the user took part in, in chronological order.
#[derive(Debug, Clone)]
pub struct Participation {
    pub pool: Pool,
    pub prediction: Prediction,
}

impl Participation {
    fn was_winner(&self, user_id: &str) -> bool {
        self.pool.winners_data.iter().any(|w| w.user_id == user_id)
    }
}

/// An exact scoreline hit, kept for the profile's detail wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactHitDetail {
    pub pool_id: String,
    pub pool_name: String,
    pub match_id: String,
    pub home: String,
    pub away: String,
    pub scoreline: crate::scoring::Scoreline,
}

/// Derived lifetime statistics from a scan over closed pools.
#[derive(Debug, Clone, Default)]
pub struct LifetimeStats {
    pub pools_played: u32,
    pub total_exact_hits: u32,
    /// Longest run of consecutive wins, unfiltered. The profile reports
    /// 0 when this is below 2, but the streak badge uses the raw value.
    pub best_win_streak_raw: u32,
    pub exact_hits: Vec<ExactHitDetail>,
}

impl LifetimeStats {
    /// Streak as shown on the profile: isolated single wins do not count
    /// as a streak.
    pub fn displayed_win_streak(&self) -> u32 {
        if self.best_win_streak_raw < 2 {
            0
        } else {
            self.best_win_streak_raw
        }
    }
}

/// Scans a user's closed-pool participations, oldest first.
pub fn scan_participations(user_id: &str, participations: &[Participation]) -> LifetimeStats {
    let mut stats = LifetimeStats {
        pools_played: participations.len() as u32,
        ..LifetimeStats::default()
    };

    let mut current_streak = 0;
    for participation in participations {
        if participation.was_winner(user_id) {
            current_streak += 1;
            stats.best_win_streak_raw = stats.best_win_streak_raw.max(current_streak);
        } else {
            current_streak = 0;
        }

        for m in &participation.pool.matches {
            let predicted = participation.prediction.scorelines.get(&m.id).copied();
            let actual = participation.pool.real_results.get(&m.id).copied();
            if score(predicted, actual) == EXACT_HIT_POINTS {
                stats.total_exact_hits += 1;
                // score == 6 implies both sides are present and equal.
                if let Some(scoreline) = actual {
                    stats.exact_hits.push(ExactHitDetail {
                        pool_id: participation.pool.id.clone(),
                        pool_name: participation.pool.name.clone(),
                        match_id: m.id.clone(),
                        home: m.home.clone(),
                        away: m.away.clone(),
                        scoreline,
                    });
                }
            }
        }
    }

    stats
}

/// The lifetime-scan badge rules. Returns every badge whose condition
/// currently holds; the caller diffs against the persisted set.
pub fn lifetime_badges(stats: &LifetimeStats, total_points: u64, total_wins: u32) -> Vec<String> {
    let mut badges = Vec::new();
    if stats.pools_played > 0 {
        badges.push(achievements::ROMPIENDO_HIELO.to_string());
    }
    if total_wins > 0 {
        badges.push(achievements::REY_COLINA.to_string());
    }
    if stats.best_win_streak_raw >= STREAK_BADGE_RUNS {
        badges.push(achievements::EN_RACHA.to_string());
    }
    if stats.total_exact_hits > 0 {
        badges.push(achievements::FRANCOTIRADOR.to_string());
    }
    if total_points >= POINTS_MILESTONE {
        badges.push(achievements::MARATON_PUNTOS.to_string());
    }
    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::models::{Match, WinnerEntry};
    use crate::scoring::Scoreline;

    fn participation(name: &str, won_by: &[&str], exact_for_user: bool) -> Participation {
        let mut pool = Pool::new(name.to_string(), vec![Match::manual("m1", "A", "B", "Cup")]);
        pool.is_closed = true;
        pool.real_results
            .insert("m1".to_string(), Scoreline::new(2, 1));
        pool.winners_data = won_by
            .iter()
            .map(|id| WinnerEntry {
                user_id: id.to_string(),
                display_name: id.to_string(),
                points: 6,
            })
            .collect();

        let predicted = if exact_for_user {
            Scoreline::new(2, 1)
        } else {
            Scoreline::new(0, 0)
        };
        Participation {
            pool,
            prediction: Prediction::new(
                "alice".to_string(),
                "Alice".to_string(),
                [("m1".to_string(), predicted)].into(),
            ),
        }
    }

    #[test]
    fn counts_participations_and_exact_hits() {
        let participations = vec![
            participation("J1", &[], true),
            participation("J2", &[], false),
            participation("J3", &[], true),
        ];
        let stats = scan_participations("alice", &participations);

        assert_eq!(stats.pools_played, 3);
        assert_eq!(stats.total_exact_hits, 2);
        assert_eq!(stats.exact_hits.len(), 2);
        assert_eq!(stats.exact_hits[0].pool_name, "J1");
        assert_eq!(stats.exact_hits[0].scoreline, Scoreline::new(2, 1));
    }

    #[test]
    fn streak_resets_on_loss() {
        let participations = vec![
            participation("J1", &["alice"], false),
            participation("J2", &["alice"], false),
            participation("J3", &["bob"], false),
            participation("J4", &["alice"], false),
        ];
        let stats = scan_participations("alice", &participations);
        assert_eq!(stats.best_win_streak_raw, 2);
        assert_eq!(stats.displayed_win_streak(), 2);
    }

    #[test]
    fn single_win_displays_as_no_streak() {
        let participations = vec![
            participation("J1", &["alice"], false),
            participation("J2", &["bob"], false),
        ];
        let stats = scan_participations("alice", &participations);
        assert_eq!(stats.best_win_streak_raw, 1);
        assert_eq!(stats.displayed_win_streak(), 0);
    }

    #[test]
    fn streak_badge_uses_raw_value() {
        let participations = vec![
            participation("J1", &["alice"], false),
            participation("J2", &["alice"], false),
            participation("J3", &["alice"], false),
        ];
        let stats = scan_participations("alice", &participations);
        let badges = lifetime_badges(&stats, 0, 3);
        assert!(badges.contains(&achievements::EN_RACHA.to_string()));
    }

    #[test]
    fn lifetime_badge_thresholds() {
        let stats = scan_participations("alice", &[participation("J1", &[], true)]);

        let badges = lifetime_badges(&stats, 499, 0);
        assert!(badges.contains(&achievements::ROMPIENDO_HIELO.to_string()));
        assert!(badges.contains(&achievements::FRANCOTIRADOR.to_string()));
        assert!(!badges.contains(&achievements::REY_COLINA.to_string()));
        assert!(!badges.contains(&achievements::MARATON_PUNTOS.to_string()));

        let badges = lifetime_badges(&stats, 500, 1);
        assert!(badges.contains(&achievements::MARATON_PUNTOS.to_string()));
        assert!(badges.contains(&achievements::REY_COLINA.to_string()));
    }

    #[test]
    fn no_participations_no_badges() {
        let stats = scan_participations("alice", &[]);
        assert_eq!(stats.pools_played, 0);
        assert!(lifetime_badges(&stats, 0, 0).is_empty());
    }
}
