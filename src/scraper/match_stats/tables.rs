//! Per-player match tables located by caption keyword.
//!
//! The first table whose caption matches is the home side, the second the
//! away side. Rows are keyed by player name; the first cell is the name and
//! the remaining cells are read by position. Trailing optional columns
//! default to zero.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::scraper::numeric::{parse_safe_float, parse_safe_int};
use crate::scraper::table::{cell_text, data_rows, row_cells};

use super::events::Side;

/// Player name → line, per side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideTables<T> {
    pub home: BTreeMap<String, T>,
    pub away: BTreeMap<String, T>,
}

impl<T> Default for SideTables<T> {
    fn default() -> Self {
        Self {
            home: BTreeMap::new(),
            away: BTreeMap::new(),
        }
    }
}

impl<T> SideTables<T> {
    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }

    pub fn side(&self, side: Side) -> &BTreeMap<String, T> {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Sum a per-player value over one side.
    pub fn sum<N: std::iter::Sum<N>>(&self, side: Side, f: impl Fn(&T) -> N) -> N {
        self.side(side).values().map(f).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassingLine {
    pub total_passes: i64,
    pub completed_passes: i64,
    pub pass_accuracy: f64,
    pub key_passes: i64,
    pub through_balls: i64,
    pub long_balls: i64,
    pub xa: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShootingLine {
    pub shots: i64,
    pub shots_on_target: i64,
    pub goals: i64,
    pub xg: f64,
    pub xg_chain: f64,
    pub xg_buildup: f64,
    pub blocked: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefensiveLine {
    pub tackles: i64,
    pub interceptions: i64,
    pub blocks: i64,
    pub clearances: i64,
    pub fouls: i64,
    pub saves: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PossessionLine {
    pub touches: i64,
    pub touches_att_third: i64,
    pub carries: i64,
    pub progressive_carries: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeeperLine {
    pub saves: i64,
    pub saves_inside_box: i64,
    pub saves_penalties: i64,
    pub punches: i64,
    pub catches: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MiscLine {
    pub fouls_committed: i64,
    pub fouls_suffered: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub crosses: i64,
}

/// Positional cell values of one row, name excluded.
struct Cols(Vec<String>);

impl Cols {
    fn int(&self, i: usize) -> i64 {
        self.0.get(i).map(|v| parse_safe_int(v)).unwrap_or(0)
    }

    fn float(&self, i: usize) -> f64 {
        self.0.get(i).map(|v| parse_safe_float(v)).unwrap_or(0.0)
    }
}

fn caption_tables<'a>(document: &'a Html, keywords: &[&str]) -> Vec<ElementRef<'a>> {
    let table_selector = Selector::parse("table").unwrap();
    let caption_selector = Selector::parse("caption").unwrap();

    document
        .select(&table_selector)
        .filter(|table| {
            table
                .select(&caption_selector)
                .next()
                .map(|caption| {
                    let text = cell_text(&caption).to_lowercase();
                    keywords.iter().any(|k| text.contains(k))
                })
                .unwrap_or(false)
        })
        .collect()
}

fn player_lines<T>(
    table: ElementRef,
    required: usize,
    parse: fn(&Cols) -> T,
) -> BTreeMap<String, T> {
    let mut lines = BTreeMap::new();
    for row in data_rows(table) {
        let cells = row_cells(&row);
        let mut texts = cells.iter().map(cell_text);
        let Some(name) = texts.next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let cols = Cols(texts.collect());
        if cols.0.len() < required {
            continue;
        }
        lines.insert(name, parse(&cols));
    }
    lines
}

fn side_tables<T>(
    document: &Html,
    keywords: &[&str],
    required: usize,
    parse: fn(&Cols) -> T,
) -> SideTables<T> {
    let tables = caption_tables(document, keywords);
    let mut sides = tables
        .into_iter()
        .map(|table| player_lines(table, required, parse));

    SideTables {
        home: sides.next().unwrap_or_default(),
        away: sides.next().unwrap_or_default(),
    }
}

/// name, total, completed, accuracy %, [key passes, through balls, long balls, xA]
pub fn extract_passing(document: &Html) -> SideTables<PassingLine> {
    side_tables(document, &["passing"], 3, |c| PassingLine {
        total_passes: c.int(0),
        completed_passes: c.int(1),
        pass_accuracy: c.float(2),
        key_passes: c.int(3),
        through_balls: c.int(4),
        long_balls: c.int(5),
        xa: c.float(6),
    })
}

/// name, shots, on target, goals, xG, [xG chain, xG buildup, blocked]
pub fn extract_shooting(document: &Html) -> SideTables<ShootingLine> {
    side_tables(document, &["shooting"], 4, |c| ShootingLine {
        shots: c.int(0),
        shots_on_target: c.int(1),
        goals: c.int(2),
        xg: c.float(3),
        xg_chain: c.float(4),
        xg_buildup: c.float(5),
        blocked: c.int(6),
    })
}

/// name, tackles, interceptions, blocks, clearances, fouls, [saves]
pub fn extract_defensive(document: &Html) -> SideTables<DefensiveLine> {
    side_tables(document, &["defense", "defensive"], 5, |c| DefensiveLine {
        tackles: c.int(0),
        interceptions: c.int(1),
        blocks: c.int(2),
        clearances: c.int(3),
        fouls: c.int(4),
        saves: c.int(5),
    })
}

/// name, touches, touches in attacking third, carries, progressive carries
pub fn extract_possession_table(document: &Html) -> SideTables<PossessionLine> {
    side_tables(document, &["possession"], 4, |c| PossessionLine {
        touches: c.int(0),
        touches_att_third: c.int(1),
        carries: c.int(2),
        progressive_carries: c.int(3),
    })
}

/// name, saves, saves inside box, penalty saves, punches, catches
pub fn extract_goalkeeping(document: &Html) -> SideTables<KeeperLine> {
    side_tables(document, &["keeper", "goalkeeping"], 5, |c| KeeperLine {
        saves: c.int(0),
        saves_inside_box: c.int(1),
        saves_penalties: c.int(2),
        punches: c.int(3),
        catches: c.int(4),
    })
}

/// name, fouls committed, fouls suffered, yellow, red, crosses
pub fn extract_misc(document: &Html) -> SideTables<MiscLine> {
    side_tables(document, &["misc"], 5, |c| MiscLine {
        fouls_committed: c.int(0),
        fouls_suffered: c.int(1),
        yellow_cards: c.int(2),
        red_cards: c.int(3),
        crosses: c.int(4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLES_HTML: &str = r#"<html><body>
<table><caption>Arsenal Passing Table</caption>
  <thead><tr><th>Player</th><th>Att</th><th>Cmp</th><th>Cmp%</th><th>KP</th></tr></thead>
  <tbody>
    <tr><th>Declan Rice</th><td>71</td><td>65</td><td>91.5%</td><td>2</td></tr>
    <tr><th>Martin Ødegaard</th><td>58</td><td>50</td><td>86,2</td><td>4</td></tr>
    <tr><th></th><td>1</td><td>1</td><td>100</td></tr>
  </tbody>
</table>
<table><caption>Chelsea Passing Table</caption>
  <tbody>
    <tr><td>Enzo Fernández</td><td>80</td><td>72</td><td>90.0</td></tr>
    <tr><td>Short Row</td><td>3</td></tr>
  </tbody>
</table>
<table><caption>Arsenal Shooting</caption>
  <tbody>
    <tr><td>Bukayo Saka</td><td>4</td><td>2</td><td>1</td><td>0.74</td></tr>
  </tbody>
</table>
</body></html>"#;

    #[test]
    fn test_home_and_away_passing() {
        let doc = Html::parse_document(TABLES_HTML);
        let passing = extract_passing(&doc);

        assert_eq!(passing.home.len(), 2);
        let rice = passing.home["Declan Rice"];
        assert_eq!(rice.total_passes, 71);
        assert_eq!(rice.completed_passes, 65);
        assert!((rice.pass_accuracy - 91.5).abs() < 1e-9);
        assert_eq!(rice.key_passes, 2);
        assert_eq!(rice.through_balls, 0);
        assert!((passing.home["Martin Ødegaard"].pass_accuracy - 86.2).abs() < 1e-9);

        assert_eq!(passing.away.len(), 1);
        assert_eq!(passing.away["Enzo Fernández"].total_passes, 80);
        assert_eq!(passing.sum(Side::Home, |l| l.total_passes), 129);
    }

    #[test]
    fn test_single_table_is_home_only() {
        let doc = Html::parse_document(TABLES_HTML);
        let shooting = extract_shooting(&doc);

        assert_eq!(shooting.home["Bukayo Saka"].goals, 1);
        assert!((shooting.home["Bukayo Saka"].xg - 0.74).abs() < 1e-9);
        assert!(shooting.away.is_empty());
    }

    #[test]
    fn test_footer_totals_are_not_players() {
        let doc = Html::parse_document(
            r#"<table><caption>Arsenal Passing Table</caption>
              <tbody>
                <tr><th>Ben White</th><td>60</td><td>52</td><td>86.7</td></tr>
                <tr><th>Declan Rice</th><td>40</td><td>37</td><td>92.5</td></tr>
              </tbody>
              <tfoot><tr><th>2 Players</th><td>100</td><td>89</td><td>89.0</td></tr></tfoot>
            </table>"#,
        );
        let passing = extract_passing(&doc);

        assert_eq!(
            passing.home.keys().collect::<Vec<_>>(),
            vec!["Ben White", "Declan Rice"]
        );
        assert_eq!(passing.sum(Side::Home, |l| l.total_passes), 100);
        assert_eq!(passing.sum(Side::Home, |l| l.completed_passes), 89);
    }

    #[test]
    fn test_missing_tables_are_empty() {
        let doc = Html::parse_document(TABLES_HTML);
        assert!(extract_defensive(&doc).is_empty());
        assert!(extract_goalkeeping(&doc).is_empty());
        assert!(extract_misc(&doc).is_empty());
    }
}
