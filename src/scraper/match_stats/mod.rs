//! Match report extraction.
//!
//! Each extractor works on its own and returns defaults when its markup is
//! missing, so a partially rendered page still yields every other category.

pub mod events;
pub mod header;
pub mod probability;
pub mod summary;
pub mod tables;

pub use events::{GoalAnalysis, Side};
pub use probability::{PoissonScoreModel, ScoreInput, ScoreModel, ScorePrediction};

use std::collections::BTreeSet;

use scraper::Html;
use tracing::debug;

use events::{capped_histogram, extract_goal_events, goal_analysis, GoalEvent};
use header::{extract_header, MatchHeader};
use summary::{extract_team_summary, Split, TeamSummary};
use tables::{
    DefensiveLine, KeeperLine, MiscLine, PassingLine, PossessionLine, ShootingLine, SideTables,
};

use crate::storage::{NewMatch, PlayerMatchStats, TeamMatchStats};

/// Everything extracted from one match report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchStats {
    pub header: Option<MatchHeader>,
    pub summary: TeamSummary,
    pub passing: SideTables<PassingLine>,
    pub shooting: SideTables<ShootingLine>,
    pub defensive: SideTables<DefensiveLine>,
    pub possession: SideTables<PossessionLine>,
    pub goalkeeping: SideTables<KeeperLine>,
    pub misc: SideTables<MiscLine>,
    pub goal_events: Vec<GoalEvent>,
    pub goal_times: Vec<u32>,
    pub goal_analysis: GoalAnalysis,
    pub xg: Split<f64>,
    pub prediction: ScorePrediction,
}

/// Run every match extractor over `html`.
pub fn extract_match_stats(html: &str, base_url: &str, model: &dyn ScoreModel) -> MatchStats {
    let document = Html::parse_document(html);

    let header = extract_header(&document, base_url);
    let shooting = tables::extract_shooting(&document);
    let goal_events = extract_goal_events(&document);
    let goal_times: Vec<u32> = goal_events.iter().map(|e| e.minute).collect();

    // Player-level xG when the shooting tables are present, else the scorebox.
    let side_xg = |side: Side, scorebox: Option<f64>| -> Option<f64> {
        if shooting.side(side).is_empty() {
            scorebox
        } else {
            Some(shooting.sum(side, |l| l.xg))
        }
    };
    let xg_home = side_xg(Side::Home, header.as_ref().and_then(|h| h.home_xg));
    let xg_away = side_xg(Side::Away, header.as_ref().and_then(|h| h.away_xg));
    let prediction = model.predict(&ScoreInput { xg_home, xg_away });

    let stats = MatchStats {
        summary: extract_team_summary(&document),
        passing: tables::extract_passing(&document),
        defensive: tables::extract_defensive(&document),
        possession: tables::extract_possession_table(&document),
        goalkeeping: tables::extract_goalkeeping(&document),
        misc: tables::extract_misc(&document),
        goal_analysis: goal_analysis(&goal_times),
        xg: Split::new(xg_home.unwrap_or(0.0), xg_away.unwrap_or(0.0)),
        header,
        shooting,
        goal_events,
        goal_times,
        prediction,
    };

    for (category, missing) in [
        ("passing", stats.passing.is_empty()),
        ("shooting", stats.shooting.is_empty()),
        ("defensive", stats.defensive.is_empty()),
        ("possession", stats.possession.is_empty()),
        ("goalkeeping", stats.goalkeeping.is_empty()),
        ("misc", stats.misc.is_empty()),
    ] {
        if missing {
            debug!("No {} tables in match report", category);
        }
    }
    stats
}

/// Prefer the first non-zero value.
fn first_nonzero(values: &[i64]) -> i64 {
    values.iter().copied().find(|v| *v != 0).unwrap_or(0)
}

fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 10000.0).round() / 100.0
}

impl MatchStats {
    pub fn total_passes(&self, side: Side) -> i64 {
        self.passing.sum(side, |l| l.total_passes)
    }

    pub fn accurate_passes(&self, side: Side) -> i64 {
        self.passing.sum(side, |l| l.completed_passes)
    }

    pub fn shots(&self, side: Side) -> i64 {
        first_nonzero(&[
            self.summary.shots.get(side),
            self.shooting.sum(side, |l| l.shots),
        ])
    }

    pub fn fouls(&self, side: Side) -> i64 {
        first_nonzero(&[
            self.summary.fouls.get(side),
            self.misc.sum(side, |l| l.fouls_committed),
            self.defensive.sum(side, |l| l.fouls),
        ])
    }

    pub fn saves(&self, side: Side) -> i64 {
        first_nonzero(&[
            self.summary.saves.get(side),
            self.goalkeeping.sum(side, |l| l.saves),
            self.defensive.sum(side, |l| l.saves),
        ])
    }

    /// Goal minutes attributed to `side`.
    pub fn goal_minutes(&self, side: Side) -> Vec<u32> {
        self.goal_events
            .iter()
            .filter(|e| e.side == Some(side))
            .map(|e| e.minute)
            .collect()
    }

    fn goals(&self, side: Side) -> i64 {
        match (&self.header, side) {
            (Some(h), Side::Home) => h.home_goals,
            (Some(h), Side::Away) => h.away_goals,
            (None, _) => self.goal_minutes(side).len() as i64,
        }
    }

    /// Match row; `None` without a header.
    pub fn to_new_match(
        &self,
        url: &str,
        home_team_id: i64,
        away_team_id: i64,
    ) -> Option<NewMatch> {
        let header = self.header.as_ref()?;
        let (home, away) = (Side::Home, Side::Away);

        Some(NewMatch {
            url: url.to_string(),
            date: header.date,
            home_team_id,
            away_team_id,
            home_goals: header.home_goals,
            away_goals: header.away_goals,
            result: header.result().to_string(),
            possession_home: self.summary.possession.home,
            possession_away: self.summary.possession.away,
            shots_home: self.shots(home),
            shots_away: self.shots(away),
            xg_home: self.xg.home,
            xg_away: self.xg.away,
            passes_home: self.total_passes(home),
            passes_away: self.total_passes(away),
            pass_accuracy_home: percentage(self.accurate_passes(home), self.total_passes(home)),
            pass_accuracy_away: percentage(self.accurate_passes(away), self.total_passes(away)),
            fouls_home: self.fouls(home),
            fouls_away: self.fouls(away),
            corners_home: self.summary.corners.home,
            corners_away: self.summary.corners.away,
            saves_home: self.saves(home),
            saves_away: self.saves(away),
            goal_times: self.goal_times.clone(),
            correct_score: header.correct_score(),
            score_probabilities: self.prediction.score_probabilities.clone(),
        })
    }

    /// Team aggregate for one side. Ids are filled in by the caller.
    pub fn team_stats(&self, side: Side, season: &str) -> TeamMatchStats {
        let opponent = side.opponent();
        let total_shots = self.shots(side);
        let shots_on_target = self.shooting.sum(side, |l| l.shots_on_target);
        let shots_blocked = self.shooting.sum(side, |l| l.blocked);
        let goals = u32::try_from(self.goals(side).max(0)).unwrap_or(0);

        let (win, loss) = match side {
            Side::Home => (self.prediction.home_win, self.prediction.away_win),
            Side::Away => (self.prediction.away_win, self.prediction.home_win),
        };

        TeamMatchStats {
            season: season.to_string(),
            possession: self.summary.possession.get(side),
            total_passes: self.total_passes(side),
            accurate_passes: self.accurate_passes(side),
            pass_accuracy: percentage(self.accurate_passes(side), self.total_passes(side)),
            total_shots,
            shots_on_target,
            shots_off_target: (total_shots - shots_on_target - shots_blocked).max(0),
            shots_blocked,
            xg: self.xg.get(side),
            xg_against: self.xg.get(opponent),
            fouls_committed: self.fouls(side),
            fouls_suffered: first_nonzero(&[
                self.misc.sum(side, |l| l.fouls_suffered),
                self.fouls(opponent),
            ]),
            saves: self.saves(side),
            interceptions: self.defensive.sum(side, |l| l.interceptions),
            tackles: self.defensive.sum(side, |l| l.tackles),
            clearances: self.defensive.sum(side, |l| l.clearances),
            blocks: self.defensive.sum(side, |l| l.blocks),
            corners: self.summary.corners.get(side),
            offsides: self.summary.offsides.get(side),
            crosses: first_nonzero(&[
                self.summary.crosses.get(side),
                self.misc.sum(side, |l| l.crosses),
            ]),
            win_probability: win,
            draw_probability: self.prediction.draw,
            loss_probability: loss,
            goals: capped_histogram(&self.goal_minutes(side), goals),
            ..Default::default()
        }
    }

    /// Names appearing in any per-player table for `side`.
    pub fn player_names(&self, side: Side) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        names.extend(self.passing.side(side).keys().cloned());
        names.extend(self.shooting.side(side).keys().cloned());
        names.extend(self.defensive.side(side).keys().cloned());
        names.extend(self.possession.side(side).keys().cloned());
        names.extend(self.goalkeeping.side(side).keys().cloned());
        names.extend(self.misc.side(side).keys().cloned());
        names
    }

    /// Per-player detail for `name` on `side`. Ids are filled in by the caller.
    pub fn player_stats(&self, side: Side, name: &str, season: &str) -> PlayerMatchStats {
        let passing = self.passing.side(side).get(name).copied().unwrap_or_default();
        let shooting = self.shooting.side(side).get(name).copied();
        let defensive = self.defensive.side(side).get(name).copied().unwrap_or_default();
        let possession = self.possession.side(side).get(name).copied().unwrap_or_default();
        let keeper = self.goalkeeping.side(side).get(name).copied().unwrap_or_default();
        let misc = self.misc.side(side).get(name).copied().unwrap_or_default();

        let minutes: Vec<u32> = self
            .goal_events
            .iter()
            .filter(|e| e.side.map_or(true, |s| s == side))
            .filter(|e| {
                e.scorer
                    .as_deref()
                    .is_some_and(|scorer| scorer.eq_ignore_ascii_case(name))
            })
            .map(|e| e.minute)
            .collect();
        let goals = match shooting {
            Some(line) => u32::try_from(line.goals.max(0)).unwrap_or(0),
            None => minutes.len() as u32,
        };
        let shooting = shooting.unwrap_or_default();

        PlayerMatchStats {
            season: season.to_string(),
            xg: shooting.xg,
            xa: passing.xa,
            xg_chain: shooting.xg_chain,
            xg_buildup: shooting.xg_buildup,
            total_passes: passing.total_passes,
            accurate_passes: passing.completed_passes,
            pass_accuracy: passing.pass_accuracy,
            key_passes: passing.key_passes,
            through_balls: passing.through_balls,
            crosses: misc.crosses,
            long_balls: passing.long_balls,
            saves: first_nonzero(&[keeper.saves, defensive.saves]),
            saves_inside_box: keeper.saves_inside_box,
            saves_penalties: keeper.saves_penalties,
            punches: keeper.punches,
            catches: keeper.catches,
            fouls_committed: first_nonzero(&[misc.fouls_committed, defensive.fouls]),
            fouls_suffered: misc.fouls_suffered,
            yellow_cards: misc.yellow_cards,
            red_cards: misc.red_cards,
            touches: possession.touches,
            touches_att_third: possession.touches_att_third,
            carries: possession.carries,
            progressive_carries: possession.progressive_carries,
            goals: capped_histogram(&minutes, goals),
            ..Default::default()
        }
    }
}
