//! CLI commands for futstats.
//!
//! `run` starts the scheduler; the other commands perform one job and exit.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::orchestrator::{CrawlReport, MatchOutcome, Orchestrator, StageReport};
use crate::scheduler::Scheduler;
use crate::scraper::HttpFetcher;
use crate::storage::{GoalHistogram, Store};

#[derive(Parser)]
#[command(name = "futstats")]
#[command(version, about = "Football statistics scraper and scheduler", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scheduler (daily update, weekly advanced update, self-test)
    Run,

    /// Run a full update once
    Update {
        /// Also collect advanced match statistics
        #[arg(long)]
        advanced: bool,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Collect advanced match statistics for every stored team
    Advanced {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Scrape a single match report
    Match {
        /// Match report URL
        #[arg(value_name = "URL")]
        url: String,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show a stored player with their team, league and season lines
    Player {
        /// Player id
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Check value coercion and database connectivity
    SelfTest {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator<HttpFetcher>> {
    let store = Store::open(&config.database.path)?;
    let fetcher = HttpFetcher::new(&config.scraper)?;
    Ok(Orchestrator::new(
        fetcher,
        store,
        config.scraper.clone(),
        &config.model,
    ))
}

/// Run the scheduler until interrupted.
pub async fn run_scheduler(config: AppConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&config)?;
    let mut scheduler = Scheduler::new(
        orchestrator,
        config.schedule.clone(),
        Local::now().naive_local(),
    )
    .context("Invalid schedule configuration")?;

    tokio::select! {
        result = scheduler.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down scheduler");
            Ok(())
        }
    }
}

pub async fn run_update(config: AppConfig, advanced: bool, format: String) -> Result<()> {
    let mut orchestrator = build_orchestrator(&config)?;
    let report = if advanced {
        orchestrator.update_with_advanced().await?
    } else {
        orchestrator.update_all().await?
    };
    print_report(&report, &format)
}

pub async fn run_advanced(config: AppConfig, format: String) -> Result<()> {
    let mut orchestrator = build_orchestrator(&config)?;
    let report = CrawlReport {
        matches: orchestrator.update_advanced().await?,
        ..Default::default()
    };
    print_report(&report, &format)
}

pub async fn run_match(config: AppConfig, url: String, format: String) -> Result<()> {
    let mut orchestrator = build_orchestrator(&config)?;
    let outcome = orchestrator.scrape_match(&url).await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome)?),
        "table" => print_match_table(orchestrator.store(), &outcome)?,
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_match_table(orchestrator.store(), &outcome)?;
        }
    }
    Ok(())
}

fn print_match_table(store: &Store, outcome: &MatchOutcome) -> Result<()> {
    let stored = store
        .get_match(outcome.match_id)?
        .with_context(|| format!("Match {} missing after insert", outcome.match_id))?;
    let home = team_name(store, stored.home_team_id)?;
    let away = team_name(store, stored.away_team_id)?;

    println!("Match #{}: {} vs {}", stored.id, home, away);
    println!("Source: {}", stored.url);
    println!(
        "Score: {} ({}), xG {:.2} - {:.2}",
        stored.correct_score, stored.result, stored.xg_home, stored.xg_away
    );
    println!(
        "Possession: {:.0}% - {:.0}%",
        stored.possession_home, stored.possession_away
    );
    println!("Goal minutes: {:?}", stored.goal_times_list());

    let analysis = &outcome.analysis;
    println!(
        "Goals: {} ({} first half, {} second half)",
        analysis.total_goals, analysis.first_half, analysis.second_half
    );
    let buckets: Vec<String> = analysis
        .distribution
        .entries()
        .map(|(label, count)| format!("{} {}", label, count))
        .collect();
    println!("  by window: {}", buckets.join(", "));

    for (team_id, name) in [(stored.home_team_id, &home), (stored.away_team_id, &away)] {
        if let Some(stats) = store.find_team_stats(team_id, stored.id)? {
            println!("  {:<24} {}", name, format_histogram(&stats.goals));
        }
    }

    let p = &outcome.prediction;
    println!(
        "Model: H {:.2}% / D {:.2}% / A {:.2}%, most likely {}",
        p.home_win, p.draw, p.away_win, p.most_likely_score
    );
    println!(
        "       BTTS {:.2}%, over 2.5 {:.2}%, under 2.5 {:.2}%",
        p.both_teams_score, p.over_2_5, p.under_2_5
    );
    println!("Player lines stored: {}", outcome.players);
    Ok(())
}

fn team_name(store: &Store, id: i64) -> Result<String> {
    Ok(store
        .get_team(id)?
        .map(|t| t.name)
        .unwrap_or_else(|| format!("team #{}", id)))
}

fn format_histogram(histogram: &GoalHistogram) -> String {
    let windows: Vec<String> = GoalHistogram::LABELS
        .iter()
        .zip(histogram.as_array())
        .map(|(label, count)| format!("{}:{}", label, count))
        .collect();
    format!("{} (total {})", windows.join(" "), histogram.total())
}

pub fn run_player(config: AppConfig, id: i64) -> Result<()> {
    let store = Store::open(&config.database.path)?;
    let player = store
        .get_player(id)?
        .with_context(|| format!("Player {} not found", id))?;
    let team = store.get_team(player.team_id)?;
    let league = match &team {
        Some(team) => store.get_league(team.league_id)?,
        None => None,
    };

    println!("Player #{}: {}", player.id, player.name);
    println!(
        "Position: {}  Nationality: {}  Age: {}",
        or_dash(&player.position),
        or_dash(&player.nationality),
        player.age.map_or_else(|| "-".to_string(), |a| a.to_string())
    );
    match (&team, &league) {
        (Some(team), Some(league)) => println!(
            "Team: {} ({} {}, {})",
            team.name,
            league.name,
            league.season,
            or_dash(&league.country)
        ),
        (Some(team), None) => println!("Team: {}", team.name),
        _ => println!("Team: #{}", player.team_id),
    }

    let seasons = store.find_player_stats(player.id)?;
    if seasons.is_empty() {
        println!("No season lines stored");
        return Ok(());
    }

    println!(
        "{:<10} {:>4} {:>5} {:>5} {:>6} {:>6} {:>6}",
        "Season", "MP", "Gls", "Ast", "Min", "xG", "xA"
    );
    for s in &seasons {
        println!(
            "{:<10} {:>4} {:>5} {:>5} {:>6} {:>6.1} {:>6.1}",
            s.season, s.matches_played, s.goals, s.assists, s.minutes_played, s.xg, s.xa
        );
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub async fn run_self_test(config: AppConfig, format: String) -> Result<()> {
    let orchestrator = build_orchestrator(&config)?;
    let report = orchestrator.self_test()?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("Coercion:  {}", pass_fail(report.coercion_ok));
            println!("Database:  {}", pass_fail(report.database_ok));
            println!(
                "Rows:      {} leagues, {} teams, {} players, {} season lines, {} matches",
                report.counts.leagues,
                report.counts.teams,
                report.counts.players,
                report.counts.player_stats,
                report.counts.matches
            );
        }
    }

    if !report.passed() {
        bail!("Self-test failed");
    }
    Ok(())
}

fn pass_fail(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "FAILED"
    }
}

fn print_report(report: &CrawlReport, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        "table" => print_report_table(report),
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_report_table(report);
        }
    }
    Ok(())
}

fn print_report_table(report: &CrawlReport) {
    println!("{:<14} {:>9} {:>7} {:>8}", "Stage", "Succeeded", "Failed", "Skipped");
    println!("{}", "-".repeat(41));
    let rows: [(&str, &StageReport); 5] = [
        ("leagues", &report.leagues),
        ("teams", &report.teams),
        ("players", &report.players),
        ("player stats", &report.player_stats),
        ("matches", &report.matches),
    ];
    for (name, stage) in rows {
        println!(
            "{:<14} {:>9} {:>7} {:>8}",
            name, stage.succeeded, stage.failed, stage.skipped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_advanced() {
        let cli = Cli::parse_from(["futstats", "update", "--advanced"]);
        match cli.command {
            Commands::Update { advanced, format } => {
                assert!(advanced);
                assert_eq!(format, "table");
            }
            _ => panic!("expected update"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::parse_from([
            "futstats",
            "match",
            "https://fbref.com/en/matches/abc/x",
            "--config",
            "prod.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        match cli.command {
            Commands::Match { url, format } => {
                assert!(url.ends_with("/abc/x"));
                assert_eq!(format, "table");
            }
            _ => panic!("expected match"),
        }
    }

    #[test]
    fn test_parse_player() {
        let cli = Cli::parse_from(["futstats", "player", "42"]);
        assert!(matches!(cli.command, Commands::Player { id: 42 }));
    }

    #[test]
    fn test_format_histogram() {
        let histogram = GoalHistogram::from_array([1, 0, 2, 0, 0, 1]);
        assert_eq!(
            format_histogram(&histogram),
            "0-15:1 16-30:0 31-45:2 46-60:0 61-75:0 76-90:1 (total 4)"
        );
    }

    #[test]
    fn test_parse_self_test() {
        let cli = Cli::parse_from(["futstats", "self-test", "-f", "json"]);
        assert!(matches!(cli.command, Commands::SelfTest { ref format } if format == "json"));
    }
}
