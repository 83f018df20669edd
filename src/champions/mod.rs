pub mod handlers;
pub mod models;
pub mod scoring;

pub use models::{ChampionsBook, ChampionsPlayer, League, LeagueVariant};
pub use scoring::{compute_table, score_domestic_pairs, score_top_four, ChampionsRow};
