//! Plain records exchanged between the extractors and the store.
//!
//! `New*` types are extractor output keyed by their natural key; the
//! unprefixed types are rows read back with their surrogate id.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::codec::{decode_goal_times, decode_score_probabilities};

// ==================== Extractor output ====================

/// League row from the competitions index.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeague {
    pub name: String,
    pub country: String,
    pub season: String,
    pub url: String,
}

/// Team row from a league page.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub league_id: i64,
    pub name: String,
    pub url: String,
}

/// Player row from a team squad page.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    pub team_id: i64,
    pub name: String,
    pub position: String,
    pub nationality: String,
    pub age: Option<u32>,
    pub url: String,
}

/// Season aggregate from a player page. Unique per (player_id, season).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub player_id: i64,
    pub season: String,
    pub matches_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub minutes_played: i64,
    pub xg: f64,
    pub xa: f64,
    pub shots: i64,
    pub key_passes: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
}

/// Goals per 15-minute window of regulation time.
///
/// Stoppage time beyond 90 is not part of the persisted histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalHistogram {
    pub goals_0_15: u32,
    pub goals_16_30: u32,
    pub goals_31_45: u32,
    pub goals_46_60: u32,
    pub goals_61_75: u32,
    pub goals_76_90: u32,
}

impl GoalHistogram {
    /// Window labels in `as_array` order.
    pub const LABELS: [&str; 6] = ["0-15", "16-30", "31-45", "46-60", "61-75", "76-90"];

    pub fn total(&self) -> u32 {
        self.goals_0_15
            + self.goals_16_30
            + self.goals_31_45
            + self.goals_46_60
            + self.goals_61_75
            + self.goals_76_90
    }

    pub fn as_array(&self) -> [u32; 6] {
        [
            self.goals_0_15,
            self.goals_16_30,
            self.goals_31_45,
            self.goals_46_60,
            self.goals_61_75,
            self.goals_76_90,
        ]
    }

    pub fn from_array(counts: [u32; 6]) -> Self {
        Self {
            goals_0_15: counts[0],
            goals_16_30: counts[1],
            goals_31_45: counts[2],
            goals_46_60: counts[3],
            goals_61_75: counts[4],
            goals_76_90: counts[5],
        }
    }
}

/// Match record ready for upsert. Unique per source URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMatch {
    pub url: String,
    pub date: Option<NaiveDate>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_goals: i64,
    pub away_goals: i64,
    pub result: String,
    pub possession_home: f64,
    pub possession_away: f64,
    pub shots_home: i64,
    pub shots_away: i64,
    pub xg_home: f64,
    pub xg_away: f64,
    pub passes_home: i64,
    pub passes_away: i64,
    pub pass_accuracy_home: f64,
    pub pass_accuracy_away: f64,
    pub fouls_home: i64,
    pub fouls_away: i64,
    pub corners_home: i64,
    pub corners_away: i64,
    pub saves_home: i64,
    pub saves_away: i64,
    pub goal_times: Vec<u32>,
    pub correct_score: String,
    pub score_probabilities: BTreeMap<String, f64>,
}

/// Per (player, match) detail. Unique per (player_id, match_id).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchStats {
    pub player_id: i64,
    pub match_id: i64,
    pub season: String,
    pub xg: f64,
    pub xa: f64,
    pub xg_chain: f64,
    pub xg_buildup: f64,
    pub total_passes: i64,
    pub accurate_passes: i64,
    pub pass_accuracy: f64,
    pub key_passes: i64,
    pub through_balls: i64,
    pub crosses: i64,
    pub long_balls: i64,
    pub saves: i64,
    pub saves_inside_box: i64,
    pub saves_penalties: i64,
    pub punches: i64,
    pub catches: i64,
    pub fouls_committed: i64,
    pub fouls_suffered: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub touches: i64,
    pub touches_att_third: i64,
    pub carries: i64,
    pub progressive_carries: i64,
    pub goals: GoalHistogram,
}

/// Per (team, match) aggregate. Unique per (team_id, match_id).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMatchStats {
    pub team_id: i64,
    pub match_id: i64,
    pub season: String,
    pub possession: f64,
    pub total_passes: i64,
    pub accurate_passes: i64,
    pub pass_accuracy: f64,
    pub total_shots: i64,
    pub shots_on_target: i64,
    pub shots_off_target: i64,
    pub shots_blocked: i64,
    pub xg: f64,
    pub xg_against: f64,
    pub fouls_committed: i64,
    pub fouls_suffered: i64,
    pub saves: i64,
    pub interceptions: i64,
    pub tackles: i64,
    pub clearances: i64,
    pub blocks: i64,
    pub corners: i64,
    pub offsides: i64,
    pub crosses: i64,
    pub win_probability: f64,
    pub draw_probability: f64,
    pub loss_probability: f64,
    pub goals: GoalHistogram,
}

// ==================== Stored rows ====================

#[derive(Debug, Clone, PartialEq)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub season: String,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: i64,
    pub league_id: i64,
    pub name: String,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub position: String,
    pub nationality: String,
    pub age: Option<u32>,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

/// Stored match. Serialized columns are decoded on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: i64,
    pub url: String,
    pub date: Option<NaiveDate>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_goals: i64,
    pub away_goals: i64,
    pub result: String,
    pub possession_home: f64,
    pub possession_away: f64,
    pub xg_home: f64,
    pub xg_away: f64,
    pub correct_score: String,
    pub goal_times: String,
    pub score_probabilities: String,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Goal minutes in event order.
    pub fn goal_times_list(&self) -> Vec<u32> {
        decode_goal_times(&self.goal_times)
    }

    /// Score → percentage mapping.
    pub fn score_probabilities_map(&self) -> BTreeMap<String, f64> {
        decode_score_probabilities(&self.score_probabilities)
    }
}

/// Whether an upsert created a row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted(i64),
    Updated(i64),
}

impl Upserted {
    pub fn id(&self) -> i64 {
        match self {
            Upserted::Inserted(id) | Upserted::Updated(id) => *id,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Upserted::Inserted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_total() {
        let h = GoalHistogram::from_array([1, 0, 2, 0, 0, 1]);
        assert_eq!(h.total(), 4);
        assert_eq!(h.as_array(), [1, 0, 2, 0, 0, 1]);
    }

    #[test]
    fn test_upserted_id() {
        assert_eq!(Upserted::Inserted(3).id(), 3);
        assert_eq!(Upserted::Updated(7).id(), 7);
        assert!(Upserted::Inserted(1).is_insert());
        assert!(!Upserted::Updated(1).is_insert());
    }
}
