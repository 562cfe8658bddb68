//! Find-or-create per entity type.
//!
//! Every function takes the caller's connection, which is normally the open
//! [`rusqlite::Transaction`] of one extractor invocation. A row is looked up
//! by its natural key; an existing row has its mutable columns and
//! `updated_at` refreshed and keeps its id, a missing row is inserted.
//! Parent keys (`league_id` of a team, `team_id` of a player) are written
//! on insert only, so a row stays under the parent that first listed it.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use super::codec::{encode_goal_times, encode_score_probabilities};
use super::models::{
    GoalHistogram, NewLeague, NewMatch, NewPlayer, NewTeam, PlayerMatchStats, SeasonStats,
    TeamMatchStats, Upserted,
};

type Column<'a> = (&'static str, &'a dyn ToSql);

fn col<'a>(name: &'static str, value: &'a dyn ToSql) -> Column<'a> {
    (name, value)
}

/// Look up `key` in `table`, then update `fields` or insert key + parent + fields.
fn upsert_row(
    conn: &Connection,
    table: &'static str,
    key: &[Column],
    parent: &[Column],
    fields: &[Column],
) -> Result<Upserted> {
    let now = Utc::now().to_rfc3339();

    let key_clause = key
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");
    let select = format!("SELECT id FROM {} WHERE {}", table, key_clause);

    let existing: Option<i64> = conn
        .query_row(&select, params_from_iter(key.iter().map(|(_, v)| *v)), |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("Failed to look up {} row", table))?;

    if let Some(id) = existing {
        let mut assignments: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect();
        assignments.push(format!("updated_at = ?{}", fields.len() + 1));
        let update = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            assignments.join(", "),
            fields.len() + 2
        );

        let mut values: Vec<&dyn ToSql> = fields.iter().map(|(_, v)| *v).collect();
        values.push(&now);
        values.push(&id);
        conn.execute(&update, params_from_iter(values))
            .with_context(|| format!("Failed to update {} row {}", table, id))?;

        return Ok(Upserted::Updated(id));
    }

    let columns: Vec<&str> = key
        .iter()
        .chain(parent.iter())
        .chain(fields.iter())
        .map(|(name, _)| *name)
        .chain(std::iter::once("updated_at"))
        .collect();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );

    let mut values: Vec<&dyn ToSql> = key
        .iter()
        .chain(parent.iter())
        .chain(fields.iter())
        .map(|(_, v)| *v)
        .collect();
    values.push(&now);
    conn.execute(&insert, params_from_iter(values))
        .with_context(|| format!("Failed to insert {} row", table))?;

    Ok(Upserted::Inserted(conn.last_insert_rowid()))
}

pub fn upsert_league(conn: &Connection, league: &NewLeague) -> Result<Upserted> {
    upsert_row(
        conn,
        "leagues",
        &[col("url", &league.url)],
        &[],
        &[
            col("name", &league.name),
            col("country", &league.country),
            col("season", &league.season),
        ],
    )
}

pub fn upsert_team(conn: &Connection, team: &NewTeam) -> Result<Upserted> {
    upsert_row(
        conn,
        "teams",
        &[col("url", &team.url)],
        &[col("league_id", &team.league_id)],
        &[col("name", &team.name)],
    )
}

pub fn upsert_player(conn: &Connection, player: &NewPlayer) -> Result<Upserted> {
    upsert_row(
        conn,
        "players",
        &[col("url", &player.url)],
        &[col("team_id", &player.team_id)],
        &[
            col("name", &player.name),
            col("position", &player.position),
            col("nationality", &player.nationality),
            col("age", &player.age),
        ],
    )
}

pub fn upsert_player_stats(conn: &Connection, stats: &SeasonStats) -> Result<Upserted> {
    upsert_row(
        conn,
        "player_stats",
        &[col("player_id", &stats.player_id), col("season", &stats.season)],
        &[],
        &[
            col("matches_played", &stats.matches_played),
            col("goals", &stats.goals),
            col("assists", &stats.assists),
            col("minutes_played", &stats.minutes_played),
            col("xg", &stats.xg),
            col("xa", &stats.xa),
            col("shots", &stats.shots),
            col("key_passes", &stats.key_passes),
            col("yellow_cards", &stats.yellow_cards),
            col("red_cards", &stats.red_cards),
        ],
    )
}

pub fn upsert_match(conn: &Connection, m: &NewMatch) -> Result<Upserted> {
    let date = m.date.map(|d| d.to_string());
    let goal_times = encode_goal_times(&m.goal_times);
    let score_probabilities = encode_score_probabilities(&m.score_probabilities);

    upsert_row(
        conn,
        "matches",
        &[col("url", &m.url)],
        &[],
        &[
            col("date", &date),
            col("home_team_id", &m.home_team_id),
            col("away_team_id", &m.away_team_id),
            col("home_goals", &m.home_goals),
            col("away_goals", &m.away_goals),
            col("result", &m.result),
            col("possession_home", &m.possession_home),
            col("possession_away", &m.possession_away),
            col("shots_home", &m.shots_home),
            col("shots_away", &m.shots_away),
            col("xg_home", &m.xg_home),
            col("xg_away", &m.xg_away),
            col("passes_home", &m.passes_home),
            col("passes_away", &m.passes_away),
            col("pass_accuracy_home", &m.pass_accuracy_home),
            col("pass_accuracy_away", &m.pass_accuracy_away),
            col("fouls_home", &m.fouls_home),
            col("fouls_away", &m.fouls_away),
            col("corners_home", &m.corners_home),
            col("corners_away", &m.corners_away),
            col("saves_home", &m.saves_home),
            col("saves_away", &m.saves_away),
            col("goal_times", &goal_times),
            col("correct_score", &m.correct_score),
            col("score_probabilities", &score_probabilities),
        ],
    )
}

fn histogram_columns(goals: &GoalHistogram) -> [Column<'_>; 6] {
    [
        col("goals_0_15", &goals.goals_0_15),
        col("goals_16_30", &goals.goals_16_30),
        col("goals_31_45", &goals.goals_31_45),
        col("goals_46_60", &goals.goals_46_60),
        col("goals_61_75", &goals.goals_61_75),
        col("goals_76_90", &goals.goals_76_90),
    ]
}

pub fn upsert_player_match_stats(conn: &Connection, s: &PlayerMatchStats) -> Result<Upserted> {
    let mut fields: Vec<Column> = vec![
        col("season", &s.season),
        col("xg", &s.xg),
        col("xa", &s.xa),
        col("xg_chain", &s.xg_chain),
        col("xg_buildup", &s.xg_buildup),
        col("total_passes", &s.total_passes),
        col("accurate_passes", &s.accurate_passes),
        col("pass_accuracy", &s.pass_accuracy),
        col("key_passes", &s.key_passes),
        col("through_balls", &s.through_balls),
        col("crosses", &s.crosses),
        col("long_balls", &s.long_balls),
        col("saves", &s.saves),
        col("saves_inside_box", &s.saves_inside_box),
        col("saves_penalties", &s.saves_penalties),
        col("punches", &s.punches),
        col("catches", &s.catches),
        col("fouls_committed", &s.fouls_committed),
        col("fouls_suffered", &s.fouls_suffered),
        col("yellow_cards", &s.yellow_cards),
        col("red_cards", &s.red_cards),
        col("touches", &s.touches),
        col("touches_att_third", &s.touches_att_third),
        col("carries", &s.carries),
        col("progressive_carries", &s.progressive_carries),
    ];
    fields.extend(histogram_columns(&s.goals));

    upsert_row(
        conn,
        "advanced_player_stats",
        &[col("player_id", &s.player_id), col("match_id", &s.match_id)],
        &[],
        &fields,
    )
}

pub fn upsert_team_match_stats(conn: &Connection, s: &TeamMatchStats) -> Result<Upserted> {
    let mut fields: Vec<Column> = vec![
        col("season", &s.season),
        col("possession", &s.possession),
        col("total_passes", &s.total_passes),
        col("accurate_passes", &s.accurate_passes),
        col("pass_accuracy", &s.pass_accuracy),
        col("total_shots", &s.total_shots),
        col("shots_on_target", &s.shots_on_target),
        col("shots_off_target", &s.shots_off_target),
        col("shots_blocked", &s.shots_blocked),
        col("xg", &s.xg),
        col("xg_against", &s.xg_against),
        col("fouls_committed", &s.fouls_committed),
        col("fouls_suffered", &s.fouls_suffered),
        col("saves", &s.saves),
        col("interceptions", &s.interceptions),
        col("tackles", &s.tackles),
        col("clearances", &s.clearances),
        col("blocks", &s.blocks),
        col("corners", &s.corners),
        col("offsides", &s.offsides),
        col("crosses", &s.crosses),
        col("win_probability", &s.win_probability),
        col("draw_probability", &s.draw_probability),
        col("loss_probability", &s.loss_probability),
    ];
    fields.extend(histogram_columns(&s.goals));

    upsert_row(
        conn,
        "team_stats",
        &[col("team_id", &s.team_id), col("match_id", &s.match_id)],
        &[],
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::create_tables;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn league() -> NewLeague {
        NewLeague {
            name: "Premier League".to_string(),
            country: "England".to_string(),
            season: "2023-2024".to_string(),
            url: "https://fbref.com/en/comps/9/Premier-League-Stats".to_string(),
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_league_upsert_idempotent() {
        let conn = conn();
        let first = upsert_league(&conn, &league()).unwrap();
        assert!(first.is_insert());

        let mut renamed = league();
        renamed.name = "Premier League (ENG)".to_string();
        let second = upsert_league(&conn, &renamed).unwrap();

        assert_eq!(second, Upserted::Updated(first.id()));
        assert_eq!(count(&conn, "leagues"), 1);
        let name: String = conn
            .query_row("SELECT name FROM leagues WHERE id = ?1", [first.id()], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Premier League (ENG)");
    }

    #[test]
    fn test_team_and_player_upsert_keep_identity() {
        let conn = conn();
        let league_id = upsert_league(&conn, &league()).unwrap().id();
        let team = NewTeam {
            league_id,
            name: "Arsenal".to_string(),
            url: "https://fbref.com/en/squads/18bb7c10/Arsenal-Stats".to_string(),
        };
        let team_id = upsert_team(&conn, &team).unwrap().id();
        assert_eq!(upsert_team(&conn, &team).unwrap(), Upserted::Updated(team_id));

        let player = NewPlayer {
            team_id,
            name: "Bukayo Saka".to_string(),
            position: "FW".to_string(),
            nationality: "eng ENG".to_string(),
            age: Some(22),
            url: "https://fbref.com/en/players/bc7dc64d/Bukayo-Saka".to_string(),
        };
        let player_id = upsert_player(&conn, &player).unwrap().id();
        assert_eq!(upsert_player(&conn, &player).unwrap(), Upserted::Updated(player_id));
        assert_eq!(count(&conn, "teams"), 1);
        assert_eq!(count(&conn, "players"), 1);
    }

    #[test]
    fn test_existing_team_keeps_first_league() {
        let conn = conn();
        let premier = upsert_league(&conn, &league()).unwrap().id();
        let mut cup = league();
        cup.name = "FA Cup".to_string();
        cup.url = "https://fbref.com/en/comps/514/FA-Cup-Stats".to_string();
        let cup = upsert_league(&conn, &cup).unwrap().id();

        let mut team = NewTeam {
            league_id: premier,
            name: "Arsenal".to_string(),
            url: "https://fbref.com/en/squads/18bb7c10/Arsenal-Stats".to_string(),
        };
        let team_id = upsert_team(&conn, &team).unwrap().id();
        team.league_id = cup;
        team.name = "Arsenal FC".to_string();
        assert_eq!(upsert_team(&conn, &team).unwrap(), Upserted::Updated(team_id));

        let (league_id, name): (i64, String) = conn
            .query_row("SELECT league_id, name FROM teams WHERE id = ?1", [team_id], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(league_id, premier);
        assert_eq!(name, "Arsenal FC");

        let mut player = NewPlayer {
            team_id,
            name: "Bukayo Saka".to_string(),
            position: "FW".to_string(),
            nationality: "eng ENG".to_string(),
            age: Some(22),
            url: "https://fbref.com/en/players/bc7dc64d/Bukayo-Saka".to_string(),
        };
        let player_id = upsert_player(&conn, &player).unwrap().id();
        let other_team = upsert_team(
            &conn,
            &NewTeam {
                league_id: premier,
                name: "Chelsea".to_string(),
                url: "https://fbref.com/en/squads/cff3d9bb/Chelsea-Stats".to_string(),
            },
        )
        .unwrap()
        .id();
        player.team_id = other_team;
        player.age = Some(23);
        upsert_player(&conn, &player).unwrap();

        let (stored_team, age): (i64, u32) = conn
            .query_row("SELECT team_id, age FROM players WHERE id = ?1", [player_id], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(stored_team, team_id);
        assert_eq!(age, 23);
    }

    #[test]
    fn test_player_stats_updates_existing_season() {
        let conn = conn();
        let league_id = upsert_league(&conn, &league()).unwrap().id();
        let team_id = upsert_team(
            &conn,
            &NewTeam {
                league_id,
                name: "Arsenal".to_string(),
                url: "t".to_string(),
            },
        )
        .unwrap()
        .id();
        let player_id = upsert_player(
            &conn,
            &NewPlayer {
                team_id,
                name: "Saka".to_string(),
                position: String::new(),
                nationality: String::new(),
                age: None,
                url: "p".to_string(),
            },
        )
        .unwrap()
        .id();

        let mut stats = SeasonStats {
            player_id,
            season: "2023-2024".to_string(),
            goals: 10,
            ..Default::default()
        };
        let first = upsert_player_stats(&conn, &stats).unwrap();
        stats.goals = 14;
        let second = upsert_player_stats(&conn, &stats).unwrap();

        assert_eq!(second, Upserted::Updated(first.id()));
        assert_eq!(count(&conn, "player_stats"), 1);
        let goals: i64 = conn
            .query_row("SELECT goals FROM player_stats", [], |r| r.get(0))
            .unwrap();
        assert_eq!(goals, 14);

        stats.season = "2022-2023".to_string();
        assert!(upsert_player_stats(&conn, &stats).unwrap().is_insert());
        assert_eq!(count(&conn, "player_stats"), 2);
    }

    #[test]
    fn test_orphan_team_rejected() {
        let conn = conn();
        let team = NewTeam {
            league_id: 999,
            name: "Nowhere FC".to_string(),
            url: "x".to_string(),
        };
        assert!(upsert_team(&conn, &team).is_err());
    }
}
