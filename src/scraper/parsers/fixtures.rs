//! Match report links from a team's scores & fixtures table.

use scraper::{Html, Selector};
use tracing::debug;

use crate::scraper::table::{absolute_url, cell_text, LocatorChain, TableLocator};

const MATCH_REPORT: &str = "Match Report";

/// Parser for a team's fixtures table
pub struct MatchLinkParser {
    locators: LocatorChain,
    base_url: String,
}

impl MatchLinkParser {
    pub fn new(base_url: &str) -> Self {
        let locators =
            LocatorChain::standard(TableLocator::Css("table[id^='matchlogs']".to_string()));
        Self::with_locators(base_url, locators)
    }

    pub fn with_locators(base_url: &str, locators: LocatorChain) -> Self {
        Self {
            locators,
            base_url: base_url.to_string(),
        }
    }

    /// Absolute match report URLs in document order, without duplicates.
    pub fn parse(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let Some((table, _)) = self.locators.locate(&document) else {
            debug!("No fixtures table found");
            return Vec::new();
        };

        let a_selector = Selector::parse("a[href]").unwrap();
        let mut links: Vec<String> = Vec::new();
        for anchor in table.select(&a_selector) {
            if cell_text(&anchor) != MATCH_REPORT {
                continue;
            }
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| absolute_url(&self.base_url, href))
            else {
                continue;
            };
            if !links.contains(&url) {
                links.push(url);
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_match_links() {
        let html = r#"<html><body>
<table id="matchlogs_for" class="stats_table"><tbody>
  <tr><th>2023-08-12</th><td><a href="/en/squads/x/Opp">Nott'ham Forest</a></td>
      <td><a href="/en/matches/e62685d8/Arsenal-Nottingham-Forest">Match Report</a></td></tr>
  <tr><th>2023-08-21</th><td><a href="/en/matches/5ba0a7a8/Crystal-Palace-Arsenal">Match Report</a></td></tr>
  <tr><th>2023-08-21</th><td><a href="/en/matches/5ba0a7a8/Crystal-Palace-Arsenal">Match Report</a></td></tr>
  <tr><th>2024-05-19</th><td><a href="/en/stathead/matchup">Head-to-Head</a></td></tr>
</tbody></table>
</body></html>"#;

        let links = MatchLinkParser::new("https://fbref.com").parse(html);
        assert_eq!(
            links,
            vec![
                "https://fbref.com/en/matches/e62685d8/Arsenal-Nottingham-Forest".to_string(),
                "https://fbref.com/en/matches/5ba0a7a8/Crystal-Palace-Arsenal".to_string(),
            ]
        );
    }
}
