//! HTML parsers for fbref entity pages.
//!
//! Every parser is infallible: a missing table or a malformed row yields
//! fewer records, never an error.

pub mod fixtures;
pub mod league;
pub mod player;
pub mod player_stats;
pub mod team;

pub use fixtures::MatchLinkParser;
pub use league::LeagueParser;
pub use player::PlayerParser;
pub use player_stats::PlayerStatsParser;
pub use team::TeamParser;

use scraper::{ElementRef, Html};
use tracing::debug;

use super::table::{data_rows, first_link, Link, LocatorChain};

/// Data rows of the located table paired with their canonical link.
///
/// Rows without a usable link are skipped.
pub(crate) fn linked_rows<'a>(
    document: &'a Html,
    locators: &LocatorChain,
    base_url: &str,
    what: &str,
) -> Vec<(ElementRef<'a>, Link)> {
    let Some((table, _)) = locators.locate(document) else {
        debug!("No {} table found", what);
        return Vec::new();
    };

    data_rows(table)
        .into_iter()
        .filter_map(|row| match first_link(&row, base_url) {
            Some(link) => Some((row, link)),
            None => {
                debug!("Skipping {} row without link", what);
                None
            }
        })
        .collect()
}
