//! League table parser: one team per standings row.

use scraper::Html;

use crate::scraper::table::{LocatorChain, TableLocator};
use crate::storage::NewTeam;

use super::linked_rows;

/// Parser for a league's standings page
pub struct TeamParser {
    locators: LocatorChain,
    base_url: String,
}

impl TeamParser {
    pub fn new(base_url: &str) -> Self {
        // Standings ids embed season and competition: results2023-202491_overall
        let locators = LocatorChain::standard(TableLocator::Css(
            "table[id^='results'][id$='_overall']".to_string(),
        ));
        Self::with_locators(base_url, locators)
    }

    pub fn with_locators(base_url: &str, locators: LocatorChain) -> Self {
        Self {
            locators,
            base_url: base_url.to_string(),
        }
    }

    pub fn parse(&self, html: &str, league_id: i64) -> Vec<NewTeam> {
        let document = Html::parse_document(html);

        let mut teams: Vec<NewTeam> = Vec::new();
        for (_, link) in linked_rows(&document, &self.locators, &self.base_url, "team") {
            if teams.iter().any(|t| t.url == link.url) {
                continue;
            }
            teams.push(NewTeam {
                league_id,
                name: link.name,
                url: link.url,
            });
        }
        teams
    }
}
