//! SQLite schema for scraped football data
//!
//! Tables:
//! - leagues: Competitions, unique by source URL
//! - teams: Clubs per league, unique by source URL
//! - players: Squad members per team, unique by source URL
//! - player_stats: Season aggregates, unique per (player, season)
//! - matches: Match reports, unique by source URL
//! - advanced_player_stats: Per-match player detail, unique per (player, match)
//! - team_stats: Per-match team aggregates, unique per (team, match)

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            country TEXT NOT NULL DEFAULT '',
            season TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL UNIQUE,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            league_id INTEGER NOT NULL REFERENCES leagues(id),
            name TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL REFERENCES teams(id),
            name TEXT NOT NULL,
            position TEXT NOT NULL DEFAULT '',
            nationality TEXT NOT NULL DEFAULT '',
            age INTEGER,
            url TEXT NOT NULL UNIQUE,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS player_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL REFERENCES players(id),
            season TEXT NOT NULL,
            matches_played INTEGER NOT NULL DEFAULT 0,
            goals INTEGER NOT NULL DEFAULT 0,
            assists INTEGER NOT NULL DEFAULT 0,
            minutes_played INTEGER NOT NULL DEFAULT 0,
            xg REAL NOT NULL DEFAULT 0,
            xa REAL NOT NULL DEFAULT 0,
            shots INTEGER NOT NULL DEFAULT 0,
            key_passes INTEGER NOT NULL DEFAULT 0,
            yellow_cards INTEGER NOT NULL DEFAULT 0,
            red_cards INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(player_id, season)
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            date TEXT,
            home_team_id INTEGER NOT NULL REFERENCES teams(id),
            away_team_id INTEGER NOT NULL REFERENCES teams(id),
            home_goals INTEGER NOT NULL DEFAULT 0,
            away_goals INTEGER NOT NULL DEFAULT 0,
            result TEXT NOT NULL DEFAULT '',
            possession_home REAL NOT NULL DEFAULT 0,
            possession_away REAL NOT NULL DEFAULT 0,
            shots_home INTEGER NOT NULL DEFAULT 0,
            shots_away INTEGER NOT NULL DEFAULT 0,
            xg_home REAL NOT NULL DEFAULT 0,
            xg_away REAL NOT NULL DEFAULT 0,
            passes_home INTEGER NOT NULL DEFAULT 0,
            passes_away INTEGER NOT NULL DEFAULT 0,
            pass_accuracy_home REAL NOT NULL DEFAULT 0,
            pass_accuracy_away REAL NOT NULL DEFAULT 0,
            fouls_home INTEGER NOT NULL DEFAULT 0,
            fouls_away INTEGER NOT NULL DEFAULT 0,
            corners_home INTEGER NOT NULL DEFAULT 0,
            corners_away INTEGER NOT NULL DEFAULT 0,
            saves_home INTEGER NOT NULL DEFAULT 0,
            saves_away INTEGER NOT NULL DEFAULT 0,
            goal_times TEXT NOT NULL DEFAULT '',
            correct_score TEXT NOT NULL DEFAULT '',
            score_probabilities TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS advanced_player_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL REFERENCES players(id),
            match_id INTEGER NOT NULL REFERENCES matches(id),
            season TEXT NOT NULL DEFAULT '',
            xg REAL NOT NULL DEFAULT 0,
            xa REAL NOT NULL DEFAULT 0,
            xg_chain REAL NOT NULL DEFAULT 0,
            xg_buildup REAL NOT NULL DEFAULT 0,
            total_passes INTEGER NOT NULL DEFAULT 0,
            accurate_passes INTEGER NOT NULL DEFAULT 0,
            pass_accuracy REAL NOT NULL DEFAULT 0,
            key_passes INTEGER NOT NULL DEFAULT 0,
            through_balls INTEGER NOT NULL DEFAULT 0,
            crosses INTEGER NOT NULL DEFAULT 0,
            long_balls INTEGER NOT NULL DEFAULT 0,
            saves INTEGER NOT NULL DEFAULT 0,
            saves_inside_box INTEGER NOT NULL DEFAULT 0,
            saves_penalties INTEGER NOT NULL DEFAULT 0,
            punches INTEGER NOT NULL DEFAULT 0,
            catches INTEGER NOT NULL DEFAULT 0,
            fouls_committed INTEGER NOT NULL DEFAULT 0,
            fouls_suffered INTEGER NOT NULL DEFAULT 0,
            yellow_cards INTEGER NOT NULL DEFAULT 0,
            red_cards INTEGER NOT NULL DEFAULT 0,
            touches INTEGER NOT NULL DEFAULT 0,
            touches_att_third INTEGER NOT NULL DEFAULT 0,
            carries INTEGER NOT NULL DEFAULT 0,
            progressive_carries INTEGER NOT NULL DEFAULT 0,
            goals_0_15 INTEGER NOT NULL DEFAULT 0,
            goals_16_30 INTEGER NOT NULL DEFAULT 0,
            goals_31_45 INTEGER NOT NULL DEFAULT 0,
            goals_46_60 INTEGER NOT NULL DEFAULT 0,
            goals_61_75 INTEGER NOT NULL DEFAULT 0,
            goals_76_90 INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(player_id, match_id)
        );

        CREATE TABLE IF NOT EXISTS team_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL REFERENCES teams(id),
            match_id INTEGER NOT NULL REFERENCES matches(id),
            season TEXT NOT NULL DEFAULT '',
            possession REAL NOT NULL DEFAULT 0,
            total_passes INTEGER NOT NULL DEFAULT 0,
            accurate_passes INTEGER NOT NULL DEFAULT 0,
            pass_accuracy REAL NOT NULL DEFAULT 0,
            total_shots INTEGER NOT NULL DEFAULT 0,
            shots_on_target INTEGER NOT NULL DEFAULT 0,
            shots_off_target INTEGER NOT NULL DEFAULT 0,
            shots_blocked INTEGER NOT NULL DEFAULT 0,
            xg REAL NOT NULL DEFAULT 0,
            xg_against REAL NOT NULL DEFAULT 0,
            fouls_committed INTEGER NOT NULL DEFAULT 0,
            fouls_suffered INTEGER NOT NULL DEFAULT 0,
            saves INTEGER NOT NULL DEFAULT 0,
            interceptions INTEGER NOT NULL DEFAULT 0,
            tackles INTEGER NOT NULL DEFAULT 0,
            clearances INTEGER NOT NULL DEFAULT 0,
            blocks INTEGER NOT NULL DEFAULT 0,
            corners INTEGER NOT NULL DEFAULT 0,
            offsides INTEGER NOT NULL DEFAULT 0,
            crosses INTEGER NOT NULL DEFAULT 0,
            win_probability REAL NOT NULL DEFAULT 0,
            draw_probability REAL NOT NULL DEFAULT 0,
            loss_probability REAL NOT NULL DEFAULT 0,
            goals_0_15 INTEGER NOT NULL DEFAULT 0,
            goals_16_30 INTEGER NOT NULL DEFAULT 0,
            goals_31_45 INTEGER NOT NULL DEFAULT 0,
            goals_46_60 INTEGER NOT NULL DEFAULT 0,
            goals_61_75 INTEGER NOT NULL DEFAULT 0,
            goals_76_90 INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(team_id, match_id)
        );

        CREATE INDEX IF NOT EXISTS idx_teams_league ON teams(league_id);
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
        CREATE INDEX IF NOT EXISTS idx_player_stats_player ON player_stats(player_id);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        CREATE INDEX IF NOT EXISTS idx_adv_stats_match ON advanced_player_stats(match_id);
        CREATE INDEX IF NOT EXISTS idx_team_stats_team ON team_stats(team_id);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('leagues', 'teams', 'players', 'player_stats', 'matches',
                  'advanced_player_stats', 'team_stats')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let insert = "INSERT INTO leagues (name, url, updated_at) VALUES ('PL', 'u', 'now')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
