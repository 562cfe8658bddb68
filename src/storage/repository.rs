//! SQLite store: connection lifecycle, transaction scopes and read queries.
//!
//! Relationship traversal is always an explicit query
//! (`find_teams_by_league`, `find_players_by_team`, ...); records never
//! lazy-load their parents or children.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::Serialize;
use std::path::Path;
use tracing::error;

use super::models::{GoalHistogram, League, Match, Player, SeasonStats, Team, TeamMatchStats};
use super::schema::create_tables;

/// Row counts reported by the self-test job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub leagues: i64,
    pub teams: i64,
    pub players: i64,
    pub player_stats: i64,
    pub matches: i64,
}

/// Persistent store for scraped data
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (and initialise) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        Self::init(conn)
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn).context("Failed to create tables")?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` succeeds. Any error rolls back every write made by
    /// `f` and is logged with `context` before being returned.
    pub fn with_transaction<T, F>(&mut self, context: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction()
            .with_context(|| format!("Failed to begin transaction for {}", context))?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()
                    .with_context(|| format!("Failed to commit {}", context))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!("Rollback failed for {}: {}", context, rollback_err);
                }
                error!("Rolled back {}: {:#}", context, e);
                Err(e)
            }
        }
    }

    /// `SELECT 1` round trip
    pub fn ping(&self) -> Result<bool> {
        let one: i64 = self.conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one == 1)
    }

    // ==================== Leagues ====================

    pub fn list_leagues(&self) -> Result<Vec<League>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, country, season, url, updated_at FROM leagues ORDER BY id",
        )?;
        let leagues = stmt
            .query_map([], league_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(leagues)
    }

    pub fn get_league(&self, id: i64) -> Result<Option<League>> {
        let league = self
            .conn
            .query_row(
                "SELECT id, name, country, season, url, updated_at FROM leagues WHERE id = ?1",
                [id],
                league_from_row,
            )
            .optional()?;
        Ok(league)
    }

    // ==================== Teams ====================

    pub fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, league_id, name, url, updated_at FROM teams ORDER BY id")?;
        let teams = stmt
            .query_map([], team_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    pub fn get_team(&self, id: i64) -> Result<Option<Team>> {
        let team = self
            .conn
            .query_row(
                "SELECT id, league_id, name, url, updated_at FROM teams WHERE id = ?1",
                [id],
                team_from_row,
            )
            .optional()?;
        Ok(team)
    }

    pub fn find_teams_by_league(&self, league_id: i64) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, league_id, name, url, updated_at FROM teams WHERE league_id = ?1 ORDER BY id",
        )?;
        let teams = stmt
            .query_map([league_id], team_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    // ==================== Players ====================

    pub fn list_players(&self) -> Result<Vec<Player>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, team_id, name, position, nationality, age, url, updated_at
             FROM players ORDER BY id",
        )?;
        let players = stmt
            .query_map([], player_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(players)
    }

    pub fn get_player(&self, id: i64) -> Result<Option<Player>> {
        let player = self
            .conn
            .query_row(
                "SELECT id, team_id, name, position, nationality, age, url, updated_at
                 FROM players WHERE id = ?1",
                [id],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }

    pub fn find_players_by_team(&self, team_id: i64) -> Result<Vec<Player>> {
        find_players_by_team(&self.conn, team_id)
    }

    pub fn find_player_stats(&self, player_id: i64) -> Result<Vec<SeasonStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, season, matches_played, goals, assists, minutes_played,
                    xg, xa, shots, key_passes, yellow_cards, red_cards
             FROM player_stats WHERE player_id = ?1 ORDER BY season",
        )?;
        let stats = stmt
            .query_map([player_id], |row| {
                Ok(SeasonStats {
                    player_id: row.get(0)?,
                    season: row.get(1)?,
                    matches_played: row.get(2)?,
                    goals: row.get(3)?,
                    assists: row.get(4)?,
                    minutes_played: row.get(5)?,
                    xg: row.get(6)?,
                    xa: row.get(7)?,
                    shots: row.get(8)?,
                    key_passes: row.get(9)?,
                    yellow_cards: row.get(10)?,
                    red_cards: row.get(11)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    // ==================== Matches ====================

    pub fn get_match(&self, id: i64) -> Result<Option<Match>> {
        let m = self
            .conn
            .query_row(
                "SELECT id, url, date, home_team_id, away_team_id, home_goals, away_goals,
                        result, possession_home, possession_away, xg_home, xg_away,
                        correct_score, goal_times, score_probabilities, updated_at
                 FROM matches WHERE id = ?1",
                [id],
                |row| {
                    let date: Option<String> = row.get(2)?;
                    Ok(Match {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        date: date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
                        home_team_id: row.get(3)?,
                        away_team_id: row.get(4)?,
                        home_goals: row.get(5)?,
                        away_goals: row.get(6)?,
                        result: row.get(7)?,
                        possession_home: row.get(8)?,
                        possession_away: row.get(9)?,
                        xg_home: row.get(10)?,
                        xg_away: row.get(11)?,
                        correct_score: row.get(12)?,
                        goal_times: row.get(13)?,
                        score_probabilities: row.get(14)?,
                        updated_at: parse_timestamp(row.get(15)?),
                    })
                },
            )
            .optional()?;
        Ok(m)
    }

    pub fn match_exists(&self, url: &str) -> Result<bool> {
        match_exists(&self.conn, url)
    }

    pub fn find_team_stats(&self, team_id: i64, match_id: i64) -> Result<Option<TeamMatchStats>> {
        let stats = self
            .conn
            .query_row(
                "SELECT team_id, match_id, season, possession, total_passes, accurate_passes,
                        pass_accuracy, total_shots, shots_on_target, xg, xg_against,
                        fouls_committed, saves, corners, win_probability, draw_probability,
                        loss_probability, goals_0_15, goals_16_30, goals_31_45, goals_46_60,
                        goals_61_75, goals_76_90
                 FROM team_stats WHERE team_id = ?1 AND match_id = ?2",
                params![team_id, match_id],
                |row| {
                    Ok(TeamMatchStats {
                        team_id: row.get(0)?,
                        match_id: row.get(1)?,
                        season: row.get(2)?,
                        possession: row.get(3)?,
                        total_passes: row.get(4)?,
                        accurate_passes: row.get(5)?,
                        pass_accuracy: row.get(6)?,
                        total_shots: row.get(7)?,
                        shots_on_target: row.get(8)?,
                        xg: row.get(9)?,
                        xg_against: row.get(10)?,
                        fouls_committed: row.get(11)?,
                        saves: row.get(12)?,
                        corners: row.get(13)?,
                        win_probability: row.get(14)?,
                        draw_probability: row.get(15)?,
                        loss_probability: row.get(16)?,
                        goals: GoalHistogram::from_array([
                            row.get(17)?,
                            row.get(18)?,
                            row.get(19)?,
                            row.get(20)?,
                            row.get(21)?,
                            row.get(22)?,
                        ]),
                        ..Default::default()
                    })
                },
            )
            .optional()?;
        Ok(stats)
    }

    // ==================== Counts ====================

    pub fn counts(&self) -> Result<EntityCounts> {
        let count = |table: &str| -> Result<i64> {
            let n = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n)
        };

        Ok(EntityCounts {
            leagues: count("leagues")?,
            teams: count("teams")?,
            players: count("players")?,
            player_stats: count("player_stats")?,
            matches: count("matches")?,
        })
    }
}

// ==================== Queries usable inside a transaction ====================

pub fn find_team_by_url(conn: &Connection, url: &str) -> Result<Option<Team>> {
    let team = conn
        .query_row(
            "SELECT id, league_id, name, url, updated_at FROM teams WHERE url = ?1",
            [url],
            team_from_row,
        )
        .optional()?;
    Ok(team)
}

pub fn find_players_by_team(conn: &Connection, team_id: i64) -> Result<Vec<Player>> {
    let mut stmt = conn.prepare(
        "SELECT id, team_id, name, position, nationality, age, url, updated_at
         FROM players WHERE team_id = ?1 ORDER BY id",
    )?;
    let players = stmt
        .query_map([team_id], player_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(players)
}

/// Case-insensitive name lookup within one squad.
pub fn find_player_by_name_in_team(
    conn: &Connection,
    team_id: i64,
    name: &str,
) -> Result<Option<Player>> {
    let player = conn
        .query_row(
            "SELECT id, team_id, name, position, nationality, age, url, updated_at
             FROM players WHERE team_id = ?1 AND lower(name) = lower(?2)
             ORDER BY id LIMIT 1",
            params![team_id, name.trim()],
            player_from_row,
        )
        .optional()?;
    Ok(player)
}

pub fn match_exists(conn: &Connection, url: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM matches WHERE url = ?1",
        [url],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ==================== Row mapping ====================

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn league_from_row(row: &Row) -> rusqlite::Result<League> {
    Ok(League {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        season: row.get(3)?,
        url: row.get(4)?,
        updated_at: parse_timestamp(row.get(5)?),
    })
}

fn team_from_row(row: &Row) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        league_id: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        updated_at: parse_timestamp(row.get(4)?),
    })
}

fn player_from_row(row: &Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        nationality: row.get(4)?,
        age: row.get(5)?,
        url: row.get(6)?,
        updated_at: parse_timestamp(row.get(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{NewLeague, NewMatch, NewPlayer, NewTeam};
    use crate::storage::upsert::{upsert_league, upsert_match, upsert_player, upsert_team};
    use std::collections::BTreeMap;

    fn seed(store: &mut Store) -> (i64, i64, i64) {
        store
            .with_transaction("seed", |tx| {
                let league_id = upsert_league(
                    tx,
                    &NewLeague {
                        name: "La Liga".to_string(),
                        country: "Spain".to_string(),
                        season: "2023-2024".to_string(),
                        url: "https://fbref.com/en/comps/12/La-Liga-Stats".to_string(),
                    },
                )?
                .id();
                let home = upsert_team(
                    tx,
                    &NewTeam {
                        league_id,
                        name: "Real Madrid".to_string(),
                        url: "https://fbref.com/en/squads/53a2f082/Real-Madrid-Stats".to_string(),
                    },
                )?
                .id();
                let away = upsert_team(
                    tx,
                    &NewTeam {
                        league_id,
                        name: "Barcelona".to_string(),
                        url: "https://fbref.com/en/squads/206d90db/Barcelona-Stats".to_string(),
                    },
                )?
                .id();
                upsert_player(
                    tx,
                    &NewPlayer {
                        team_id: home,
                        name: "Jude Bellingham".to_string(),
                        position: "MF".to_string(),
                        nationality: "eng ENG".to_string(),
                        age: Some(20),
                        url: "https://fbref.com/en/players/57d88cf9/Jude-Bellingham".to_string(),
                    },
                )?;
                Ok((league_id, home, away))
            })
            .unwrap()
    }

    #[test]
    fn test_queries_follow_relationships() {
        let mut store = Store::in_memory().unwrap();
        let (league_id, home, away) = seed(&mut store);

        let teams = store.find_teams_by_league(league_id).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].id, home);
        assert_eq!(teams[1].id, away);

        let players = store.find_players_by_team(home).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].age, Some(20));
        assert!(store.find_players_by_team(away).unwrap().is_empty());

        let found = find_player_by_name_in_team(store.conn(), home, " jude bellingham ").unwrap();
        assert_eq!(found.map(|p| p.name).as_deref(), Some("Jude Bellingham"));

        let league = store.get_league(league_id).unwrap().unwrap();
        assert_eq!(league.country, "Spain");
        assert!(league.updated_at.timestamp() > 0);
    }

    #[test]
    fn test_rollback_leaves_no_rows() {
        let mut store = Store::in_memory().unwrap();

        let result: Result<()> = store.with_transaction("league + orphan team", |tx| {
            let league_id = upsert_league(
                tx,
                &NewLeague {
                    name: "Serie A".to_string(),
                    country: "Italy".to_string(),
                    season: "2023-2024".to_string(),
                    url: "https://fbref.com/en/comps/11/Serie-A-Stats".to_string(),
                },
            )?
            .id();
            upsert_team(
                tx,
                &NewTeam {
                    league_id: league_id + 100,
                    name: "Juventus".to_string(),
                    url: "https://fbref.com/en/squads/e0652b02/Juventus-Stats".to_string(),
                },
            )?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(store.counts().unwrap(), EntityCounts::default());
    }

    #[test]
    fn test_match_round_trip_decodes_columns() {
        let mut store = Store::in_memory().unwrap();
        let (_, home, away) = seed(&mut store);

        let mut probs = BTreeMap::new();
        probs.insert("1-1".to_string(), 11.5);
        let new_match = NewMatch {
            url: "https://fbref.com/en/matches/abc/El-Clasico".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 21),
            home_team_id: home,
            away_team_id: away,
            home_goals: 3,
            away_goals: 2,
            result: "H".to_string(),
            goal_times: vec![6, 18, 69, 73, 91],
            correct_score: "3-2".to_string(),
            score_probabilities: probs.clone(),
            ..Default::default()
        };

        let id = store
            .with_transaction("match", |tx| Ok(upsert_match(tx, &new_match)?.id()))
            .unwrap();

        let stored = store.get_match(id).unwrap().unwrap();
        assert_eq!(stored.goal_times, "6,18,69,73,91");
        assert_eq!(stored.goal_times_list(), vec![6, 18, 69, 73, 91]);
        assert_eq!(stored.score_probabilities_map(), probs);
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 4, 21));
        assert!(store.match_exists(&new_match.url).unwrap());
    }

    #[test]
    fn test_ping_and_counts() {
        let mut store = Store::in_memory().unwrap();
        assert!(store.ping().unwrap());
        seed(&mut store);
        let counts = store.counts().unwrap();
        assert_eq!(counts.leagues, 1);
        assert_eq!(counts.teams, 2);
        assert_eq!(counts.players, 1);
    }
}
