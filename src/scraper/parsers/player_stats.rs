//! Player page parser: season rows of the standard stats table.

use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::debug;

use crate::scraper::numeric::{parse_safe_float, parse_safe_int};
use crate::scraper::table::{cell_text, data_stats, LocatorChain, TableLocator};
use crate::storage::SeasonStats;

/// Parser for a player's season history
pub struct PlayerStatsParser {
    locators: LocatorChain,
}

impl Default for PlayerStatsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStatsParser {
    pub fn new() -> Self {
        Self::with_locators(LocatorChain::standard(TableLocator::Css(
            "table[id^='stats_standard']".to_string(),
        )))
    }

    pub fn with_locators(locators: LocatorChain) -> Self {
        Self { locators }
    }

    /// Parse one record per season row.
    ///
    /// Rows are identified by a `th[scope=row]` season cell; rows marked
    /// `partial_table` and rows without a `games` value are skipped.
    pub fn parse(&self, html: &str, player_id: i64) -> Vec<SeasonStats> {
        let document = Html::parse_document(html);
        let Some((table, _)) = self.locators.locate(&document) else {
            debug!("No stats table for player {}", player_id);
            return Vec::new();
        };

        let tr_selector = Selector::parse("tr").unwrap();
        let season_selector = Selector::parse("th[scope='row']").unwrap();

        let mut seasons = Vec::new();
        for row in table.select(&tr_selector) {
            if row.value().classes().any(|c| c == "partial_table") {
                continue;
            }

            let Some(season_cell) = row.select(&season_selector).next() else {
                continue;
            };
            let season = cell_text(&season_cell);
            if season.is_empty() {
                continue;
            }

            let stats = data_stats(&row);
            if !stats.contains_key("games") {
                debug!("Skipping season {} without games", season);
                continue;
            }

            seasons.push(Self::season_stats(player_id, season, &stats));
        }
        seasons
    }

    fn season_stats(
        player_id: i64,
        season: String,
        stats: &HashMap<String, String>,
    ) -> SeasonStats {
        let int = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| stats.get(*k))
                .map(|v| parse_safe_int(v))
                .unwrap_or(0)
        };
        let float = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| stats.get(*k))
                .map(|v| parse_safe_float(v))
                .unwrap_or(0.0)
        };

        SeasonStats {
            player_id,
            season,
            matches_played: int(&["games"]),
            goals: int(&["goals"]),
            assists: int(&["assists"]),
            minutes_played: int(&["minutes"]),
            xg: float(&["xg"]),
            xa: float(&["xa", "xg_assist"]),
            shots: int(&["shots"]),
            key_passes: int(&["key_passes", "assisted_shots"]),
            yellow_cards: int(&["yellow_cards", "cards_yellow"]),
            red_cards: int(&["red_cards", "cards_red"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_HTML: &str = r#"<html><body>
<table id="stats_standard_dom_lg" class="stats_table">
  <thead><tr><th>Season</th><th>MP</th></tr></thead>
  <tbody>
    <tr>
      <th scope="row" data-stat="year_id">2022-2023</th>
      <td data-stat="games">38</td>
      <td data-stat="minutes">3,181</td>
      <td data-stat="goals">14</td>
      <td data-stat="assists">11</td>
      <td data-stat="xg">10.6</td>
      <td data-stat="xg_assist">9.2</td>
      <td data-stat="cards_yellow">6</td>
      <td data-stat="cards_red">0</td>
    </tr>
    <tr class="partial_table">
      <th scope="row" data-stat="year_id">2022-2023</th>
      <td data-stat="games">4</td>
    </tr>
    <tr>
      <th scope="row" data-stat="year_id">2023-2024</th>
      <td data-stat="games">35</td>
      <td data-stat="goals">16</td>
      <td data-stat="xg">—</td>
    </tr>
    <tr>
      <th scope="row" data-stat="year_id">2024-2025</th>
      <td data-stat="comp_level">Premier League</td>
    </tr>
  </tbody>
</table>
</body></html>"#;

    #[test]
    fn test_parse_seasons() {
        let seasons = PlayerStatsParser::new().parse(PLAYER_HTML, 42);

        assert_eq!(seasons.len(), 2);
        let first = &seasons[0];
        assert_eq!(first.player_id, 42);
        assert_eq!(first.season, "2022-2023");
        assert_eq!(first.matches_played, 38);
        assert_eq!(first.minutes_played, 3181);
        assert_eq!(first.goals, 14);
        assert!((first.xg - 10.6).abs() < 1e-9);
        assert!((first.xa - 9.2).abs() < 1e-9);
        assert_eq!(first.yellow_cards, 6);

        let second = &seasons[1];
        assert_eq!(second.season, "2023-2024");
        assert_eq!(second.goals, 16);
        assert_eq!(second.xg, 0.0);
        assert_eq!(second.assists, 0);
    }

    #[test]
    fn test_parse_without_table() {
        assert!(PlayerStatsParser::new().parse("<p>gone</p>", 1).is_empty());
    }
}
