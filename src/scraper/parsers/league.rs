//! Competitions index parser (`/en/comps/`).

use scraper::Html;

use crate::scraper::table::{cell_text, row_cells, LocatorChain, TableLocator};
use crate::storage::NewLeague;

use super::linked_rows;

/// Parser for the competitions index
pub struct LeagueParser {
    locators: LocatorChain,
    base_url: String,
}

impl LeagueParser {
    pub fn new(base_url: &str) -> Self {
        let locators = LocatorChain::standard(TableLocator::Id("comps".to_string()));
        Self::with_locators(base_url, locators)
    }

    pub fn with_locators(base_url: &str, locators: LocatorChain) -> Self {
        Self {
            locators,
            base_url: base_url.to_string(),
        }
    }

    /// Parse league rows. Link in the first cell, country in the second.
    pub fn parse(&self, html: &str, season: &str) -> Vec<NewLeague> {
        let document = Html::parse_document(html);

        linked_rows(&document, &self.locators, &self.base_url, "league")
            .into_iter()
            .map(|(row, link)| NewLeague {
                name: link.name,
                country: row_cells(&row).get(1).map(cell_text).unwrap_or_default(),
                season: season.to_string(),
                url: link.url,
            })
            .collect()
    }
}
