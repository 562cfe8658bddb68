//! Crawl driver: leagues → teams → players → season stats → match reports.
//!
//! Every stage reads the parents persisted by the previous stage and
//! scrapes them one at a time with a minimum delay between requests. A
//! parent that fails (fetch error, rollback) is logged and counted; its
//! siblings still run.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{ModelConfig, ScraperConfig};
use crate::scraper::match_stats::{
    extract_match_stats, GoalAnalysis, PoissonScoreModel, ScoreModel, ScorePrediction, Side,
};
use crate::scraper::numeric::{parse_safe_float, parse_safe_int};
use crate::scraper::parsers::{
    LeagueParser, MatchLinkParser, PlayerParser, PlayerStatsParser, TeamParser,
};
use crate::scraper::{Fetch, RateLimiter};
use crate::storage::repository::{find_player_by_name_in_team, find_team_by_url, match_exists};
use crate::storage::upsert::{
    upsert_league, upsert_match, upsert_player, upsert_player_match_stats, upsert_player_stats,
    upsert_team, upsert_team_match_stats,
};
use crate::storage::{EntityCounts, League, Player, Store, Team};

/// Outcome counts for one crawl stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StageReport {
    fn record<T>(&mut self, result: &Result<T>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub leagues: StageReport,
    pub teams: StageReport,
    pub players: StageReport,
    pub player_stats: StageReport,
    pub matches: StageReport,
}

impl CrawlReport {
    pub fn failures(&self) -> usize {
        self.leagues.failed
            + self.teams.failed
            + self.players.failed
            + self.player_stats.failed
            + self.matches.failed
    }
}

/// What one match report produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub match_id: i64,
    pub players: usize,
    pub analysis: GoalAnalysis,
    pub prediction: ScorePrediction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfTestReport {
    pub coercion_ok: bool,
    pub database_ok: bool,
    pub counts: EntityCounts,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.coercion_ok && self.database_ok
    }
}

pub struct Orchestrator<F: Fetch> {
    fetcher: F,
    store: Store,
    config: ScraperConfig,
    limiter: RateLimiter,
    model: Box<dyn ScoreModel>,
}

impl<F: Fetch> Orchestrator<F> {
    pub fn new(fetcher: F, store: Store, config: ScraperConfig, model: &ModelConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
            limiter: RateLimiter::new(),
            model: Box::new(PoissonScoreModel::new(
                model.home_goal_rate,
                model.away_goal_rate,
                model.max_goals,
            )),
        }
    }

    #[cfg(test)]
    pub fn with_model(mut self, model: Box<dyn ScoreModel>) -> Self {
        self.model = model;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    async fn fetch_throttled(&self, url: &str, delay_ms: u64) -> Result<String> {
        self.limiter.acquire(Duration::from_millis(delay_ms)).await;
        self.fetcher.fetch(url).await
    }

    // ==================== Entity stages ====================

    /// Scrape the competitions index. Returns the number of leagues upserted.
    pub async fn scrape_leagues(&mut self) -> Result<usize> {
        let url = self.config.comps_url();
        info!("Scraping leagues from {}", url);

        let html = self.fetch_throttled(&url, 0).await?;
        let leagues = LeagueParser::new(&self.config.base_url).parse(&html, &self.config.season);

        self.store.with_transaction("leagues", |tx| {
            let mut inserted = 0;
            for league in &leagues {
                if upsert_league(tx, league)?.is_insert() {
                    inserted += 1;
                    debug!("Added league {}", league.name);
                }
            }
            info!("Leagues: {} found, {} new", leagues.len(), inserted);
            Ok(leagues.len())
        })
    }

    pub async fn scrape_teams(&mut self, league: &League) -> Result<usize> {
        info!("Scraping teams of {}", league.name);
        let html = self
            .fetch_throttled(&league.url, self.config.team_delay_ms)
            .await?;
        let teams = TeamParser::new(&self.config.base_url).parse(&html, league.id);

        let label = format!("teams of league {} ({})", league.id, league.name);
        self.store.with_transaction(&label, |tx| {
            for team in &teams {
                upsert_team(tx, team)?;
            }
            Ok(teams.len())
        })
    }

    pub async fn scrape_players(&mut self, team: &Team) -> Result<usize> {
        info!("Scraping players of {}", team.name);
        let html = self
            .fetch_throttled(&team.url, self.config.player_delay_ms)
            .await?;
        let players = PlayerParser::new(&self.config.base_url).parse(&html, team.id);

        let label = format!("players of team {} ({})", team.id, team.name);
        self.store.with_transaction(&label, |tx| {
            for player in &players {
                upsert_player(tx, player)?;
            }
            Ok(players.len())
        })
    }

    pub async fn scrape_player_stats(&mut self, player: &Player) -> Result<usize> {
        debug!("Scraping season stats of {}", player.name);
        let html = self
            .fetch_throttled(&player.url, self.config.stats_delay_ms)
            .await?;
        let seasons = PlayerStatsParser::new().parse(&html, player.id);

        let label = format!("stats of player {} ({})", player.id, player.name);
        self.store.with_transaction(&label, |tx| {
            for stats in &seasons {
                upsert_player_stats(tx, stats)?;
            }
            Ok(seasons.len())
        })
    }

    // ==================== Match reports ====================

    /// Scrape one match report and persist the match, both team aggregates
    /// and the detail of every player found in the squads.
    ///
    /// Both teams must already be stored; otherwise nothing is written.
    pub async fn scrape_match(&mut self, url: &str) -> Result<MatchOutcome> {
        let html = self.fetch_throttled(url, self.config.match_delay_ms).await?;
        let stats = extract_match_stats(&html, &self.config.base_url, self.model.as_ref());
        let header = stats
            .header
            .as_ref()
            .ok_or_else(|| anyhow!("No match header in {}", url))?;
        let season = self.config.season.clone();

        let label = format!("match {}", url);
        self.store.with_transaction(&label, |tx| {
            let home = find_team_by_url(tx, &header.home.url)?
                .ok_or_else(|| anyhow!("Unknown home team {}", header.home.url))?;
            let away = find_team_by_url(tx, &header.away.url)?
                .ok_or_else(|| anyhow!("Unknown away team {}", header.away.url))?;

            let new_match = stats
                .to_new_match(url, home.id, away.id)
                .context("Match record without header")?;
            let match_id = upsert_match(tx, &new_match)?.id();

            let mut players = 0;
            for (side, team) in [(Side::Home, &home), (Side::Away, &away)] {
                let mut team_stats = stats.team_stats(side, &season);
                team_stats.team_id = team.id;
                team_stats.match_id = match_id;
                upsert_team_match_stats(tx, &team_stats)?;

                for name in stats.player_names(side) {
                    let Some(player) = find_player_by_name_in_team(tx, team.id, &name)? else {
                        debug!("No stored player {} in {}", name, team.name);
                        continue;
                    };
                    let mut line = stats.player_stats(side, &name, &season);
                    line.player_id = player.id;
                    line.match_id = match_id;
                    upsert_player_match_stats(tx, &line)?;
                    players += 1;
                }
            }

            info!(
                "Match {} {} {}: {} player lines",
                home.name,
                new_match.correct_score,
                away.name,
                players
            );
            Ok(MatchOutcome {
                match_id,
                players,
                analysis: stats.goal_analysis,
                prediction: stats.prediction.clone(),
            })
        })
    }

    /// Advanced pass: every team's match reports not yet stored.
    pub async fn update_advanced(&mut self) -> Result<StageReport> {
        info!("Collecting advanced match statistics");
        let mut report = StageReport::default();

        for team in self.store.list_teams()? {
            let html = match self
                .fetch_throttled(&team.url, self.config.match_delay_ms)
                .await
            {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch fixtures of {}: {:#}", team.name, e);
                    report.failed += 1;
                    continue;
                }
            };

            for url in MatchLinkParser::new(&self.config.base_url).parse(&html) {
                if !self.config.refresh_matches && match_exists(self.store.conn(), &url)? {
                    report.skipped += 1;
                    continue;
                }
                let result = self.scrape_match(&url).await;
                if let Err(e) = &result {
                    warn!("Failed to scrape match {}: {:#}", url, e);
                }
                report.record(&result);
            }
        }

        info!(
            "Advanced statistics: {} matches stored, {} failed, {} already known",
            report.succeeded, report.failed, report.skipped
        );
        Ok(report)
    }

    // ==================== Full update ====================

    /// Leagues, then teams of every league, players of every team and
    /// season stats of every player.
    pub async fn update_all(&mut self) -> Result<CrawlReport> {
        info!("Starting full update");
        let mut report = CrawlReport::default();

        let leagues = self.scrape_leagues().await;
        if let Err(e) = &leagues {
            error!("Failed to scrape leagues: {:#}", e);
        }
        report.leagues.record(&leagues);

        for league in self.store.list_leagues()? {
            let result = self.scrape_teams(&league).await;
            if let Err(e) = &result {
                warn!("Skipping teams of {}: {:#}", league.name, e);
            }
            report.teams.record(&result);
        }

        for team in self.store.list_teams()? {
            let result = self.scrape_players(&team).await;
            if let Err(e) = &result {
                warn!("Skipping players of {}: {:#}", team.name, e);
            }
            report.players.record(&result);
        }

        for player in self.store.list_players()? {
            let result = self.scrape_player_stats(&player).await;
            if let Err(e) = &result {
                warn!("Skipping stats of {}: {:#}", player.name, e);
            }
            report.player_stats.record(&result);
        }

        info!(
            "Full update finished: {} teams, {} players, {} player pages, {} failures",
            report.teams.succeeded,
            report.players.succeeded,
            report.player_stats.succeeded,
            report.failures()
        );
        Ok(report)
    }

    /// Full update followed by the advanced match pass.
    pub async fn update_with_advanced(&mut self) -> Result<CrawlReport> {
        let mut report = self.update_all().await?;
        report.matches = self.update_advanced().await?;
        Ok(report)
    }

    // ==================== Self-test ====================

    pub fn self_test(&self) -> Result<SelfTestReport> {
        let coercion_ok = parse_safe_int("abc") == 0
            && parse_safe_int("1,234") == 1234
            && parse_safe_float("") == 0.0
            && parse_safe_float("1.2.3") == 0.0
            && (parse_safe_float("45,67%") - 45.67).abs() < 1e-9;

        let database_ok = match self.store.ping() {
            Ok(ok) => ok,
            Err(e) => {
                error!("Database check failed: {:#}", e);
                false
            }
        };
        let counts = self.store.counts()?;

        info!(
            "Self-test: coercion {}, database {}, {} leagues, {} teams, {} players, {} matches",
            if coercion_ok { "ok" } else { "FAILED" },
            if database_ok { "ok" } else { "FAILED" },
            counts.leagues,
            counts.teams,
            counts.players,
            counts.matches
        );

        Ok(SelfTestReport {
            coercion_ok,
            database_ok,
            counts,
        })
    }
}
