//! Configuration for futstats.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `futstats.toml` (or the file given with `--config`), then `FUTSTATS__*`
//! environment variables. A `.env` file is loaded first.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/futstats.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Season label stored on leagues and match statistics
    #[serde(default = "default_season")]
    pub season: String,
    #[serde(default = "default_team_delay_ms")]
    pub team_delay_ms: u64,
    #[serde(default = "default_player_delay_ms")]
    pub player_delay_ms: u64,
    #[serde(default = "default_stats_delay_ms")]
    pub stats_delay_ms: u64,
    #[serde(default = "default_match_delay_ms")]
    pub match_delay_ms: u64,
    #[serde(default)]
    pub fetch_retries: u32,
    /// Re-scrape match reports that are already stored
    #[serde(default)]
    pub refresh_matches: bool,
}

fn default_base_url() -> String {
    "https://fbref.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_season() -> String {
    "2023-2024".to_string()
}

fn default_team_delay_ms() -> u64 {
    1000
}

fn default_player_delay_ms() -> u64 {
    1000
}

fn default_stats_delay_ms() -> u64 {
    2000
}

fn default_match_delay_ms() -> u64 {
    2000
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            timeout_secs: default_timeout_secs(),
            season: default_season(),
            team_delay_ms: default_team_delay_ms(),
            player_delay_ms: default_player_delay_ms(),
            stats_delay_ms: default_stats_delay_ms(),
            match_delay_ms: default_match_delay_ms(),
            fetch_retries: 0,
            refresh_matches: false,
        }
    }
}

impl ScraperConfig {
    pub fn comps_url(&self) -> String {
        format!("{}/en/comps/", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Same settings with every inter-request delay set to zero.
    pub fn without_delays(mut self) -> Self {
        self.team_delay_ms = 0;
        self.player_delay_ms = 0;
        self.stats_delay_ms = 0;
        self.match_delay_ms = 0;
        self
    }
}

/// Scheduler configuration. Times are local `HH:MM`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_daily_at")]
    pub daily_at: String,
    #[serde(default = "default_weekly_day")]
    pub weekly_day: String,
    #[serde(default = "default_weekly_at")]
    pub weekly_at: String,
    #[serde(default = "default_self_test_at")]
    pub self_test_at: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Run one update immediately on startup
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

fn default_daily_at() -> String {
    "02:00".to_string()
}

fn default_weekly_day() -> String {
    "sun".to_string()
}

fn default_weekly_at() -> String {
    "04:00".to_string()
}

fn default_self_test_at() -> String {
    "06:00".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_run_on_start() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_at: default_daily_at(),
            weekly_day: default_weekly_day(),
            weekly_at: default_weekly_at(),
            self_test_at: default_self_test_at(),
            poll_interval_secs: default_poll_interval_secs(),
            run_on_start: default_run_on_start(),
        }
    }
}

impl ScheduleConfig {
    pub fn daily_time(&self) -> anyhow::Result<NaiveTime> {
        parse_clock(&self.daily_at)
    }

    pub fn weekly_time(&self) -> anyhow::Result<NaiveTime> {
        parse_clock(&self.weekly_at)
    }

    pub fn self_test_time(&self) -> anyhow::Result<NaiveTime> {
        parse_clock(&self.self_test_at)
    }

    pub fn weekday(&self) -> anyhow::Result<Weekday> {
        self.weekly_day
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("Invalid weekly_day: {}", self.weekly_day))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

fn parse_clock(value: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| anyhow::anyhow!("Invalid time {:?} (expected HH:MM): {}", value, e))
}

/// Score model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// League-average home goals, used when a match has no xG
    #[serde(default = "default_home_goal_rate")]
    pub home_goal_rate: f64,
    #[serde(default = "default_away_goal_rate")]
    pub away_goal_rate: f64,
    #[serde(default = "default_max_goals")]
    pub max_goals: u32,
}

fn default_home_goal_rate() -> f64 {
    1.45
}

fn default_away_goal_rate() -> f64 {
    1.15
}

fn default_max_goals() -> u32 {
    10
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            home_goal_rate: default_home_goal_rate(),
            away_goal_rate: default_away_goal_rate(),
            max_goals: default_max_goals(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

impl AppConfig {
    /// Load configuration from defaults, config file and environment
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        // A missing .env is fine
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("futstats").required(false)),
        };

        let config = builder
            // FUTSTATS__DATABASE__PATH, FUTSTATS__SCRAPER__FETCH_RETRIES, ...
            .add_source(
                config::Environment::with_prefix("FUTSTATS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, PathBuf::from("data/futstats.db"));
        assert_eq!(config.scraper.comps_url(), "https://fbref.com/en/comps/");
        assert_eq!(config.scraper.team_delay_ms, 1000);
        assert_eq!(config.scraper.stats_delay_ms, 2000);
        assert_eq!(config.scraper.fetch_retries, 0);
        assert_eq!(config.schedule.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.model.max_goals, 10);
    }

    #[test]
    fn test_schedule_parsing() {
        let schedule = ScheduleConfig::default();
        assert_eq!(
            schedule.daily_time().unwrap(),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap()
        );
        assert_eq!(schedule.weekday().unwrap(), Weekday::Sun);

        let broken = ScheduleConfig {
            daily_at: "25:99".to_string(),
            weekly_day: "someday".to_string(),
            ..Default::default()
        };
        assert!(broken.daily_time().is_err());
        assert!(broken.weekday().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("futstats-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("custom.toml");
        std::fs::write(
            &path,
            "[scraper]\nseason = \"2024-2025\"\nfetch_retries = 2\n\n[schedule]\ndaily_at = \"03:30\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scraper.season, "2024-2025");
        assert_eq!(config.scraper.fetch_retries, 2);
        assert_eq!(config.scraper.base_url, "https://fbref.com");
        assert_eq!(config.schedule.daily_at, "03:30");

        std::fs::remove_dir_all(&dir).ok();
    }
}
