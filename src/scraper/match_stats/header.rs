//! Match header: the two teams, the final score and the date.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

use crate::scraper::numeric::{parse_safe_float, parse_safe_int};
use crate::scraper::table::{absolute_url, cell_text, Link};

static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchHeader {
    pub home: Link,
    pub away: Link,
    pub home_goals: i64,
    pub away_goals: i64,
    /// Scorebox xG, when the page shows it
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl MatchHeader {
    /// `H`, `D` or `A`
    pub fn result(&self) -> &'static str {
        match self.home_goals.cmp(&self.away_goals) {
            std::cmp::Ordering::Greater => "H",
            std::cmp::Ordering::Equal => "D",
            std::cmp::Ordering::Less => "A",
        }
    }

    pub fn correct_score(&self) -> String {
        format!("{}-{}", self.home_goals, self.away_goals)
    }
}

/// Parse the `.scorebox` block. `None` unless both teams and scores are present.
pub fn extract_header(document: &Html, base_url: &str) -> Option<MatchHeader> {
    let team_selector = Selector::parse(".scorebox strong a[href]").unwrap();
    let score_selector = Selector::parse(".scorebox .score").unwrap();
    let xg_selector = Selector::parse(".scorebox .score_xg").unwrap();

    let mut teams = document.select(&team_selector).filter_map(|a| {
        let name = cell_text(&a);
        let url = absolute_url(base_url, a.value().attr("href")?)?;
        (!name.is_empty()).then_some(Link { name, url })
    });
    let home = teams.next()?;
    let away = teams.next()?;

    let mut scores = document.select(&score_selector).map(|s| cell_text(&s));
    let home_goals = parse_safe_int(&scores.next()?);
    let away_goals = parse_safe_int(&scores.next()?);

    let mut xgs = document
        .select(&xg_selector)
        .map(|s| cell_text(&s))
        .map(|text| (!text.is_empty()).then(|| parse_safe_float(&text)));
    let home_xg = xgs.next().flatten();
    let away_xg = xgs.next().flatten();

    Some(MatchHeader {
        home,
        away,
        home_goals,
        away_goals,
        home_xg,
        away_xg,
        date: extract_date(document),
    })
}

fn extract_date(document: &Html) -> Option<NaiveDate> {
    let venue_selector = Selector::parse(".venuetime[data-venue-date]").unwrap();
    let meta_selector = Selector::parse(".scorebox_meta").unwrap();

    let candidates = document
        .select(&venue_selector)
        .filter_map(|e| e.value().attr("data-venue-date").map(str::to_string))
        .chain(document.select(&meta_selector).map(|e| cell_text(&e)));

    for text in candidates {
        if let Some(m) = date_re().find(&text) {
            if let Ok(date) = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d") {
                return Some(date);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOREBOX_HTML: &str = r#"<div class="scorebox">
  <div>
    <div><strong><a href="/en/squads/18bb7c10/Arsenal-Stats">Arsenal</a></strong></div>
    <div class="scores"><div class="score">2</div><div class="score_xg">1.8</div></div>
    <div class="datapoint"><strong>Manager</strong>: Mikel Arteta</div>
  </div>
  <div>
    <div><strong><a href="/en/squads/cff3d9bb/Chelsea-Stats">Chelsea</a></strong></div>
    <div class="scores"><div class="score">2</div><div class="score_xg">0.9</div></div>
  </div>
  <div class="scorebox_meta">
    <div><strong><a href="/en/matches/2023-10-21">Saturday October 21, 2023</a></strong>
    <span class="venuetime" data-venue-date="2023-10-21" data-venue-time="17:30">17:30</span></div>
  </div>
</div>"#;

    #[test]
    fn test_extract_header() {
        let doc = Html::parse_document(SCOREBOX_HTML);
        let header = extract_header(&doc, "https://fbref.com").unwrap();

        assert_eq!(header.home.name, "Arsenal");
        assert_eq!(header.away.name, "Chelsea");
        assert_eq!(
            header.away.url,
            "https://fbref.com/en/squads/cff3d9bb/Chelsea-Stats"
        );
        assert_eq!(header.correct_score(), "2-2");
        assert_eq!(header.result(), "D");
        assert_eq!(header.date, NaiveDate::from_ymd_opt(2023, 10, 21));
        assert_eq!(header.home_xg, Some(1.8));
        assert_eq!(header.away_xg, Some(0.9));
    }

    #[test]
    fn test_missing_header() {
        let doc = Html::parse_document(
            "<div class='scorebox'><strong><a href='/x'>Only</a></strong></div>",
        );
        assert!(extract_header(&doc, "https://fbref.com").is_none());
    }
}
