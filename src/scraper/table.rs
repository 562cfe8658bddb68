//! Table location and row helpers shared by the entity extractors.
//!
//! fbref renames table ids between competitions and seasons, so each
//! extractor carries an ordered [`LocatorChain`]: the first strategy that
//! finds a table wins.

use std::collections::HashMap;
use std::fmt;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One strategy for finding a table in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLocator {
    /// `table#id`
    Id(String),
    /// `table.class`
    Class(String),
    /// Arbitrary CSS selector, e.g. `table[id^='stats_standard']`
    Css(String),
    /// The first `table` in the document
    First,
}

impl TableLocator {
    fn selector(&self) -> Option<Selector> {
        let css = match self {
            TableLocator::Id(id) => format!("table[id='{}']", id),
            TableLocator::Class(class) => format!("table.{}", class),
            TableLocator::Css(css) => css.clone(),
            TableLocator::First => "table".to_string(),
        };
        Selector::parse(&css).ok()
    }

    /// Find the first table in `root` matching this strategy.
    pub fn find<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let selector = self.selector()?;
        root.select(&selector).next()
    }
}

impl fmt::Display for TableLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableLocator::Id(id) => write!(f, "#{}", id),
            TableLocator::Class(class) => write!(f, ".{}", class),
            TableLocator::Css(css) => write!(f, "{}", css),
            TableLocator::First => write!(f, "first table"),
        }
    }
}

/// Ordered list of locator strategies. First match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorChain(Vec<TableLocator>);

impl LocatorChain {
    pub fn new(locators: Vec<TableLocator>) -> Self {
        Self(locators)
    }

    /// Known id, then the generic fbref `stats_table` class, then any table.
    pub fn standard(primary: TableLocator) -> Self {
        Self::new(vec![
            primary,
            TableLocator::Class("stats_table".to_string()),
            TableLocator::First,
        ])
    }

    /// Locate a table, returning the strategy that matched.
    pub fn locate<'a>(&self, document: &'a Html) -> Option<(ElementRef<'a>, &TableLocator)> {
        let root = document.root_element();
        for locator in &self.0 {
            if let Some(table) = locator.find(root) {
                debug!("Located table via {}", locator);
                return Some((table, locator));
            }
        }
        None
    }
}

/// Name and absolute URL taken from a row's canonical link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub url: String,
}

/// Collapse whitespace in an element's text.
pub fn cell_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve an href against the site base URL.
pub fn absolute_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base_url)
            .ok()?
            .join(href)
            .ok()
            .map(|u| u.to_string()),
    }
}

/// First `a[href]` in the element, as a [`Link`].
pub fn first_link(element: &ElementRef, base_url: &str) -> Option<Link> {
    let a_selector = Selector::parse("a[href]").unwrap();
    let anchor = element.select(&a_selector).next()?;
    let name = cell_text(&anchor);
    let url = absolute_url(base_url, anchor.value().attr("href")?)?;
    if name.is_empty() {
        return None;
    }
    Some(Link { name, url })
}

/// True for header, footer, spacer and partial-table rows.
pub fn is_header_row(row: &ElementRef) -> bool {
    const SKIP_CLASSES: [&str; 4] = ["thead", "over_header", "spacer", "partial_table"];

    if row
        .value()
        .classes()
        .any(|c| SKIP_CLASSES.contains(&c))
    {
        return true;
    }

    if row
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "thead" | "tfoot"))
    {
        return true;
    }

    // Linked th-only rows still carry an entity
    let td_selector = Selector::parse("td").unwrap();
    let a_selector = Selector::parse("a[href]").unwrap();
    row.select(&td_selector).next().is_none() && row.select(&a_selector).next().is_none()
}

/// Data rows of a table, skipping header and separator rows.
pub fn data_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let tr_selector = Selector::parse("tr").unwrap();
    table
        .select(&tr_selector)
        .filter(|row| !is_header_row(row))
        .collect()
}

/// Cells of a row (`th` and `td`) in document order.
pub fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let cell_selector = Selector::parse("th, td").unwrap();
    row.select(&cell_selector).collect()
}

/// Only the `td` cells of a row.
pub fn row_tds<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let td_selector = Selector::parse("td").unwrap();
    row.select(&td_selector).collect()
}

/// Map of `data-stat` attribute → trimmed cell text for one row.
pub fn data_stats(row: &ElementRef) -> HashMap<String, String> {
    row_cells(row)
        .iter()
        .filter_map(|cell| {
            let key = cell.value().attr("data-stat")?;
            Some((key.to_string(), cell_text(cell)))
        })
        .collect()
}
