//! Squad page parser: one player per row of the standard stats table.

use scraper::Html;

use crate::scraper::numeric::parse_age;
use crate::scraper::table::{cell_text, data_stats, row_tds, LocatorChain, TableLocator};
use crate::storage::NewPlayer;

use super::linked_rows;

/// Parser for a team's squad page
pub struct PlayerParser {
    locators: LocatorChain,
    base_url: String,
}

impl PlayerParser {
    pub fn new(base_url: &str) -> Self {
        let locators = LocatorChain::standard(TableLocator::Css(
            "table[id^='stats_standard']".to_string(),
        ));
        Self::with_locators(base_url, locators)
    }

    pub fn with_locators(base_url: &str, locators: LocatorChain) -> Self {
        Self {
            locators,
            base_url: base_url.to_string(),
        }
    }

    /// Parse squad rows.
    ///
    /// Position, nationality and age come from `data-stat` cells when the
    /// table is annotated; otherwise position is `td` 1 and nationality `td` 2.
    pub fn parse(&self, html: &str, team_id: i64) -> Vec<NewPlayer> {
        let document = Html::parse_document(html);

        let mut players: Vec<NewPlayer> = Vec::new();
        for (row, link) in linked_rows(&document, &self.locators, &self.base_url, "player") {
            if players.iter().any(|p| p.url == link.url) {
                continue;
            }

            let stats = data_stats(&row);
            let tds = row_tds(&row);
            let by_index = |i: usize| tds.get(i).map(cell_text).unwrap_or_default();

            let position = match stats.get("position") {
                Some(v) => v.clone(),
                None => by_index(1),
            };
            let nationality = match stats.get("nationality") {
                Some(v) => v.clone(),
                None => by_index(2),
            };
            let age = stats.get("age").and_then(|v| parse_age(v));

            players.push(NewPlayer {
                team_id,
                name: link.name,
                position,
                nationality,
                age,
                url: link.url,
            });
        }
        players
    }
}
