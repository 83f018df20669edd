use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::models::{ChampionsBook, LeagueVariant};
use crate::scoring::assign_ranks;

const EXACT_CHAMPION_POINTS: u32 = 5;
const EXACT_SLOT_POINTS: u32 = 3;
const PRESENCE_POINTS: u32 = 1;
const PAIR_CHAMPION_POINTS: u32 = 5;
const PAIR_RUNNER_UP_POINTS: u32 = 2;

/// One row of the champions table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionsRow {
    pub name: String,
    pub total_points: u32,
    pub points_by_league: HashMap<String, u32>,
    pub rank: u32,
}

/// Scores a ranked top-4 prediction against the true top-4.
///
/// Exact slot 0 is worth 5, exact slots 1-3 are worth 3, and a predicted
/// team present anywhere in the true top-4 earns 1 unless it already
/// scored an exact slot. Returns 0 when the true standings are short.
pub fn score_top_four(prediction: &[String], actual: &[String]) -> u32 {
    if prediction.len() < 4 || actual.len() < 4 {
        return 0;
    }

    let mut points = 0;
    let mut exact: HashSet<&str> = HashSet::new();
    for i in 0..4 {
        if prediction[i] == actual[i] {
            points += if i == 0 {
                EXACT_CHAMPION_POINTS
            } else {
                EXACT_SLOT_POINTS
            };
            exact.insert(prediction[i].as_str());
        }
    }
    for predicted in prediction.iter().take(4) {
        if !exact.contains(predicted.as_str()) && actual.contains(predicted) {
            points += PRESENCE_POINTS;
        }
    }
    points
}

/// Scores the domestic variant: the true top 2 are an unordered champions
/// pair and the next 2 an unordered runners-up pair. Each true champion
/// matched by the predicted champions sub-pair earns 5, each true
/// runner-up matched by the predicted runners-up sub-pair earns 2.
/// Awarded once per true team, so a duplicated predicted name cannot
/// double-score.
pub fn score_domestic_pairs(prediction: &[String], actual: &[String]) -> u32 {
    if prediction.len() < 4 || actual.len() < 4 {
        return 0;
    }

    let predicted_champions: HashSet<&str> =
        prediction[..2].iter().map(String::as_str).collect();
    let predicted_runners_up: HashSet<&str> =
        prediction[2..4].iter().map(String::as_str).collect();

    let mut points = 0;
    for champion in &actual[..2] {
        if predicted_champions.contains(champion.as_str()) {
            points += PAIR_CHAMPION_POINTS;
        }
    }
    for runner_up in &actual[2..4] {
        if predicted_runners_up.contains(runner_up.as_str()) {
            points += PAIR_RUNNER_UP_POINTS;
        }
    }
    points
}

/// Computes the full champions table from whatever standings are
/// available. Leagues whose standings are missing or shorter than four
/// teams contribute nothing, so a failed fetch degrades the table
/// instead of breaking it.
pub fn compute_table(
    book: &ChampionsBook,
    standings: &HashMap<String, Vec<String>>,
) -> Vec<ChampionsRow> {
    let mut rows: Vec<ChampionsRow> = book
        .players
        .iter()
        .map(|player| {
            let mut points_by_league = HashMap::new();
            let mut total_points = 0;
            for (index, league) in book.leagues.iter().enumerate() {
                let prediction = match player.predictions.get(index) {
                    Some(p) => p,
                    None => continue,
                };
                let actual = match standings.get(&league.name) {
                    Some(actual) if actual.len() >= 4 => actual,
                    _ => continue,
                };
                let points = match league.variant {
                    LeagueVariant::TopFour => score_top_four(prediction, actual),
                    LeagueVariant::DomesticPairs => score_domestic_pairs(prediction, actual),
                };
                points_by_league.insert(league.name.clone(), points);
                total_points += points;
            }
            ChampionsRow {
                name: player.name.clone(),
                total_points,
                points_by_league,
                rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.name.cmp(&b.name))
    });
    assign_ranks(&mut rows, |row| row.total_points, |row, rank| row.rank = rank);
    rows
}
