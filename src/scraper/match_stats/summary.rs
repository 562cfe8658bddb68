//! Team-level home/away splits (possession, fouls, corners, ...).
//!
//! Three markup shapes are recognised, tried in order:
//! 1. a label element whose parent holds two `span.stat-value` values,
//! 2. the `#team_stats_extra` grid, where the label sits between the home
//!    and away value,
//! 3. the `#team_stats` table, where a `th` label row is followed by a row
//!    of two value cells (used for possession only).

use scraper::{ElementRef, Html, Selector};

use crate::scraper::numeric::{parse_safe_float, parse_safe_int};
use crate::scraper::table::cell_text;

use super::events::Side;

/// A home/away pair. Missing markup yields the zero split.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Split<T> {
    pub home: T,
    pub away: T,
}

impl<T: Copy> Split<T> {
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub fn get(&self, side: Side) -> T {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }
}

/// Team summary splits for one match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamSummary {
    pub possession: Split<f64>,
    pub fouls: Split<i64>,
    pub corners: Split<i64>,
    pub saves: Split<i64>,
    pub offsides: Split<i64>,
    pub shots: Split<i64>,
    pub crosses: Split<i64>,
}

pub fn extract_team_summary(document: &Html) -> TeamSummary {
    TeamSummary {
        possession: extract_possession(document),
        fouls: int_split(document, "Fouls"),
        corners: int_split(document, "Corners"),
        saves: int_split(document, "Saves"),
        offsides: int_split(document, "Offsides"),
        shots: int_split(document, "Shots"),
        crosses: int_split(document, "Crosses"),
    }
}

/// Possession percentages; `{0, 0}` when not found.
pub fn extract_possession(document: &Html) -> Split<f64> {
    raw_split(document, "Possession")
        .or_else(|| team_stats_table_split(document, "Possession"))
        .map(|(home, away)| Split::new(parse_safe_float(&home), parse_safe_float(&away)))
        .unwrap_or_default()
}

fn int_split(document: &Html, label: &str) -> Split<i64> {
    raw_split(document, label)
        .map(|(home, away)| Split::new(parse_safe_int(&home), parse_safe_int(&away)))
        .unwrap_or_default()
}

/// Raw home/away texts for `label`.
pub fn raw_split(document: &Html, label: &str) -> Option<(String, String)> {
    let labels = label_elements(document, label);
    labels
        .iter()
        .find_map(stat_value_pair)
        .or_else(|| labels.iter().find_map(sibling_pair))
}

/// Text directly owned by the element, excluding descendants.
fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Label candidates: exact (case-insensitive) matches first, then substring matches.
fn label_elements<'a>(document: &'a Html, label: &str) -> Vec<ElementRef<'a>> {
    let selector = Selector::parse("div, span, th, td").unwrap();
    let wanted = label.to_lowercase();

    let mut exact = Vec::new();
    let mut partial = Vec::new();
    for element in document.select(&selector) {
        let text = own_text(&element).to_lowercase();
        if text == wanted {
            exact.push(element);
        } else if text.contains(&wanted) {
            partial.push(element);
        }
    }
    exact.extend(partial);
    exact
}

fn stat_value_pair(label: &ElementRef) -> Option<(String, String)> {
    let selector = Selector::parse("span.stat-value").unwrap();
    let parent = label.parent().and_then(ElementRef::wrap)?;
    let mut values = parent.select(&selector);
    let home = values.next()?;
    let away = values.next()?;
    Some((cell_text(&home), cell_text(&away)))
}

fn sibling_pair(label: &ElementRef) -> Option<(String, String)> {
    let home = label.prev_siblings().find_map(ElementRef::wrap)?;
    let away = label.next_siblings().find_map(ElementRef::wrap)?;
    let (home, away) = (cell_text(&home), cell_text(&away));
    let numeric = |s: &str| s.chars().any(|c| c.is_ascii_digit());
    if numeric(&home) && numeric(&away) {
        Some((home, away))
    } else {
        None
    }
}

fn team_stats_table_split(document: &Html, label: &str) -> Option<(String, String)> {
    let th_selector = Selector::parse("#team_stats th").unwrap();
    let td_selector = Selector::parse("td").unwrap();

    let header = document
        .select(&th_selector)
        .find(|th| cell_text(th).eq_ignore_ascii_case(label))?;
    let row = header.parent().and_then(ElementRef::wrap)?;
    let values = row.next_siblings().find_map(ElementRef::wrap)?;
    let mut cells = values.select(&td_selector);
    let home = cells.next()?;
    let away = cells.next()?;
    Some((cell_text(&home), cell_text(&away)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_VALUE_HTML: &str = r#"<html><body>
<div class="stats">
  <div class="row"><div>Possession</div><span class="stat-value">58%</span><span class="stat-value">42%</span></div>
  <div class="row"><div>Fouls</div><span class="stat-value">11</span><span class="stat-value">14</span></div>
  <div class="row"><div>Shots on Target</div><span class="stat-value">5</span><span class="stat-value">2</span></div>
  <div class="row"><div>Shots</div><span class="stat-value">17</span><span class="stat-value">8</span></div>
</div>
</body></html>"#;

    #[test]
    fn test_stat_value_markup() {
        let doc = Html::parse_document(STAT_VALUE_HTML);
        let summary = extract_team_summary(&doc);

        assert_eq!(summary.possession, Split::new(58.0, 42.0));
        assert_eq!(summary.fouls, Split::new(11, 14));
        assert_eq!(summary.shots, Split::new(17, 8));
        assert_eq!(summary.corners, Split::default());
    }

    #[test]
    fn test_team_stats_extra_grid() {
        let doc = Html::parse_document(
            r#"<div id="team_stats_extra">
                <div><div class="th">Arsenal</div><div class="th"></div><div class="th">Chelsea</div>
                <div>12</div><div>Fouls</div><div>9</div>
                <div>7</div><div>Corners</div><div>3</div>
                <div>1</div><div>Offsides</div><div>4</div></div>
            </div>"#,
        );
        let summary = extract_team_summary(&doc);

        assert_eq!(summary.fouls, Split::new(12, 9));
        assert_eq!(summary.corners, Split::new(7, 3));
        assert_eq!(summary.offsides, Split::new(1, 4));
    }

    #[test]
    fn test_possession_from_team_stats_table() {
        let doc = Html::parse_document(
            r#"<div id="team_stats"><table>
                <tr><th colspan="2">Possession</th></tr>
                <tr><td><div><strong>61%</strong></div></td><td><div><strong>39%</strong></div></td></tr>
            </table></div>"#,
        );
        assert_eq!(extract_possession(&doc), Split::new(61.0, 39.0));
    }

    #[test]
    fn test_missing_possession_is_zero() {
        let doc = Html::parse_document("<html><body><p>No stats</p></body></html>");
        assert_eq!(extract_possession(&doc), Split::new(0.0, 0.0));
    }
}
