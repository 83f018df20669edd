use serde::{Deserialize, Serialize};

/// How a league's final standings are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueVariant {
    /// Ranked top-4: exact champion 5, exact slots 2-4 worth 3, presence
    /// in the top-4 worth 1.
    TopFour,
    /// Top 2 form an unordered champions pair (5 each), next 2 an
    /// unordered runners-up pair (2 each). No presence bonus.
    DomesticPairs,
}

/// One league in the champions roster. `competition_id` is the sports
/// API id; leagues without one rely on statically configured standings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub name: String,
    pub competition_id: Option<u64>,
    pub variant: LeagueVariant,
    #[serde(default)]
    pub emblem: Option<String>,
    /// Final standings entered by hand, used when the league has no
    /// API id or as a fallback while the season is still running.
    #[serde(default)]
    pub static_standings: Vec<String>,
}

/// A participant in the champions pool with one ranked 4-slot prediction
/// list per league, in roster order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionsPlayer {
    pub name: String,
    pub predictions: Vec<Vec<String>>,
}

/// The season-long champions pool: a fixed league roster and the fixed
/// set of players. Unlike regular pools it has no lifecycle; the table
/// is recomputed from live standings on every view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionsBook {
    pub leagues: Vec<League>,
    pub players: Vec<ChampionsPlayer>,
}

impl ChampionsBook {
    pub fn empty() -> Self {
        Self {
            leagues: Vec::new(),
            players: Vec::new(),
        }
    }

    /// The 2025-26 roster: four API-backed European leagues scored as
    /// ranked top-4, plus the Colombian league scored as unordered
    /// champion/runner-up pairs.
    pub fn default_roster() -> Self {
        let leagues = vec![
            League {
                name: "La Liga".to_string(),
                competition_id: Some(2014),
                variant: LeagueVariant::TopFour,
                emblem: Some("https://crests.football-data.org/PD.png".to_string()),
                static_standings: Vec::new(),
            },
            League {
                name: "Premier League".to_string(),
                competition_id: Some(2021),
                variant: LeagueVariant::TopFour,
                emblem: Some("https://crests.football-data.org/PL.png".to_string()),
                static_standings: Vec::new(),
            },
            League {
                name: "Bundesliga".to_string(),
                competition_id: Some(2002),
                variant: LeagueVariant::TopFour,
                emblem: Some("https://crests.football-data.org/BL1.png".to_string()),
                static_standings: Vec::new(),
            },
            League {
                name: "Serie A".to_string(),
                competition_id: Some(2019),
                variant: LeagueVariant::TopFour,
                emblem: Some("https://crests.football-data.org/SA.svg".to_string()),
                static_standings: Vec::new(),
            },
            League {
                name: "Liga Colombiana".to_string(),
                competition_id: None,
                variant: LeagueVariant::DomesticPairs,
                emblem: None,
                static_standings: Vec::new(),
            },
        ];

        let players = vec![
            ChampionsPlayer {
                name: "DANIEL".to_string(),
                predictions: vec![
                    strings(&["Real Madrid CF", "FC Barcelona", "Club Atlético de Madrid", "Athletic Club"]),
                    strings(&["Liverpool FC", "Arsenal FC", "Chelsea FC", "Manchester City FC"]),
                    strings(&["FC Bayern München", "Borussia Dortmund", "Eintracht Frankfurt", "Bayer 04 Leverkusen"]),
                    strings(&["FC Internazionale Milano", "SSC Napoli", "AS Roma", "Atalanta BC"]),
                    strings(&["Junior", "Santafe", "Nacional", "Medellin"]),
                ],
            },
            ChampionsPlayer {
                name: "ANDRES".to_string(),
                predictions: vec![
                    strings(&["FC Barcelona", "Club Atlético de Madrid", "Real Madrid CF", "Athletic Club"]),
                    strings(&["Arsenal FC", "Liverpool FC", "Tottenham Hotspur FC", "Manchester United FC"]),
                    strings(&["FC Bayern München", "Borussia Dortmund", "RB Leipzig", "Bayer 04 Leverkusen"]),
                    strings(&["SSC Napoli", "FC Internazionale Milano", "Juventus FC", "AC Milan"]),
                    strings(&["Junior", "Santafe", "Nacional", "Tolima"]),
                ],
            },
            ChampionsPlayer {
                name: "JAVIER".to_string(),
                predictions: vec![
                    strings(&["FC Barcelona", "Real Madrid CF", "Club Atlético de Madrid", "Villarreal CF"]),
                    strings(&["Chelsea FC", "Liverpool FC", "Arsenal FC", "Manchester City FC"]),
                    strings(&["FC Bayern München", "Bayer 04 Leverkusen", "Borussia Dortmund", "Eintracht Frankfurt"]),
                    strings(&["FC Internazionale Milano", "Juventus FC", "AC Milan", "SSC Napoli"]),
                    strings(&["Medellin", "Nacional", "Junior", "Caldas"]),
                ],
            },
            ChampionsPlayer {
                name: "HUGO".to_string(),
                predictions: vec![
                    strings(&["FC Barcelona", "Real Madrid CF", "Club Atlético de Madrid", "Real Sociedad de Fútbol"]),
                    strings(&["Liverpool FC", "Arsenal FC", "Manchester City FC", "Chelsea FC"]),
                    strings(&["FC Bayern München", "Borussia Dortmund", "Bayer 04 Leverkusen", "Eintracht Frankfurt"]),
                    strings(&["FC Internazionale Milano", "SSC Napoli", "Atalanta BC", "AS Roma"]),
                    strings(&["Junior", "Santafe", "Nacional", "Medellin"]),
                ],
            },
        ];

        Self { leagues, players }
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
