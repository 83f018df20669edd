use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Badge identifiers. These are persisted in user records and shown by
/// clients, so the literal values must stay stable.
pub mod achievements {
    /// Participated in a first pool.
    pub const ROMPIENDO_HIELO: &str = "ROMPIENDO_HIELO";
    /// Won a first pool.
    pub const REY_COLINA: &str = "REY_COLINA";
    /// First exact scoreline hit.
    pub const FRANCOTIRADOR: &str = "FRANCOTIRADOR";
    /// Won 3 or more pools in a row.
    pub const EN_RACHA: &str = "EN_RACHA";
    /// 30 or more points in a single pool.
    pub const GOLEADOR_FECHA: &str = "GOLEADOR_FECHA";
    /// 5 or more exact hits in a single pool.
    pub const QUINIELA_DIAMANTE: &str = "QUINIELA_DIAMANTE";
    /// 500 lifetime points.
    pub const MARATON_PUNTOS: &str = "MARATON_PUNTOS";
    /// First-ever last-place finish.
    pub const DEBUT_FONDO: &str = "DEBUT_FONDO";
    /// Finished a pool without a single exact hit.
    pub const POLVORA_MOJADA: &str = "POLVORA_MOJADA";
}

/// Per-user cumulative state spanning all pools. Counters move up and
/// down as pools close and reopen; achievements only ever grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub display_name: String,
    pub total_points: u64,
    pub last_place_finishes: u32,
    pub achievements: BTreeSet<String>,
}

impl UserRecord {
    pub fn new(user_id: String, display_name: String) -> Self {
        Self {
            user_id,
            display_name,
            total_points: 0,
            last_place_finishes: 0,
            achievements: BTreeSet::new(),
        }
    }
}

/// One row of the global leaderboard, updated transactionally alongside
/// pool closure and reopening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub total_wins: u32,
    pub last_win_at: Option<DateTime<Utc>>,
}

impl LeaderboardEntry {
    pub fn new(user_id: String, display_name: String) -> Self {
        Self {
            user_id,
            display_name,
            total_wins: 0,
            last_win_at: None,
        }
    }
}
