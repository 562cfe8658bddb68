//! Goal events and goal-by-time analysis.

use scraper::{ElementRef, Html, Selector};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::scraper::numeric::parse_minute;
use crate::scraper::table::cell_text;
use crate::storage::GoalHistogram;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// One goal from the match timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalEvent {
    pub minute: u32,
    pub side: Option<Side>,
    pub scorer: Option<String>,
}

/// Goal events in document order.
///
/// An event is a `div.event` whose text mentions "goal"; its minute is read
/// from `span.minute`. Events without a positive minute are dropped.
pub fn extract_goal_events(document: &Html) -> Vec<GoalEvent> {
    let event_selector = Selector::parse("div.event").unwrap();
    let minute_selector = Selector::parse("span.minute").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    document
        .select(&event_selector)
        .filter(|event| cell_text(event).to_lowercase().contains("goal"))
        .filter_map(|event| {
            let minute_span = event.select(&minute_selector).next()?;
            let minute = parse_minute(&cell_text(&minute_span));
            if minute == 0 {
                return None;
            }
            let scorer = event
                .select(&link_selector)
                .next()
                .map(|a| cell_text(&a))
                .filter(|name| !name.is_empty());
            Some(GoalEvent {
                minute,
                side: event_side(&event),
                scorer,
            })
        })
        .collect()
}

/// Side from the event or its nearest marked ancestor:
/// id/class `a` or class `home` is home, id/class `b` or class `away` is away.
fn event_side(event: &ElementRef) -> Option<Side> {
    std::iter::once(*event)
        .chain(event.ancestors().filter_map(ElementRef::wrap))
        .find_map(|element| {
            let value = element.value();
            let marked =
                |name: &str| value.id() == Some(name) || value.classes().any(|c| c == name);
            if marked("a") || value.classes().any(|c| c == "home") {
                Some(Side::Home)
            } else if marked("b") || value.classes().any(|c| c == "away") {
                Some(Side::Away)
            } else {
                None
            }
        })
}

/// Fifteen-minute windows plus stoppage time beyond 90.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    From0To15,
    From16To30,
    From31To45,
    From46To60,
    From61To75,
    From76To90,
    Extra,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 7] = [
        TimeBucket::From0To15,
        TimeBucket::From16To30,
        TimeBucket::From31To45,
        TimeBucket::From46To60,
        TimeBucket::From61To75,
        TimeBucket::From76To90,
        TimeBucket::Extra,
    ];

    pub fn from_minute(minute: u32) -> Self {
        match minute {
            0..=15 => TimeBucket::From0To15,
            16..=30 => TimeBucket::From16To30,
            31..=45 => TimeBucket::From31To45,
            46..=60 => TimeBucket::From46To60,
            61..=75 => TimeBucket::From61To75,
            76..=90 => TimeBucket::From76To90,
            _ => TimeBucket::Extra,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeBucket::From0To15 => "0-15",
            TimeBucket::From16To30 => "16-30",
            TimeBucket::From31To45 => "31-45",
            TimeBucket::From46To60 => "46-60",
            TimeBucket::From61To75 => "61-75",
            TimeBucket::From76To90 => "76-90",
            TimeBucket::Extra => "extra",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Goal counts over all seven buckets. Sums to the number of minutes given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalDistribution {
    counts: [u32; 7],
}

/// Serialized as a `label → count` map in bucket order.
impl Serialize for GoalDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries())
    }
}

impl GoalDistribution {
    pub fn from_minutes(minutes: &[u32]) -> Self {
        let mut counts = [0u32; 7];
        for &minute in minutes {
            counts[TimeBucket::from_minute(minute).index()] += 1;
        }
        Self { counts }
    }

    pub fn count(&self, bucket: TimeBucket) -> u32 {
        self.counts[bucket.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// `(label, count)` pairs in bucket order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        TimeBucket::ALL
            .into_iter()
            .map(move |b| (b.label(), self.count(b)))
    }

    /// Regulation-time histogram (the extra bucket is dropped).
    pub fn histogram(&self) -> GoalHistogram {
        let mut six = [0u32; 6];
        six.copy_from_slice(&self.counts[..6]);
        GoalHistogram::from_array(six)
    }
}

/// Summary of a goal timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoalAnalysis {
    pub total_goals: u32,
    pub distribution: GoalDistribution,
    pub first_half: u32,
    pub second_half: u32,
}

pub fn goal_analysis(minutes: &[u32]) -> GoalAnalysis {
    let distribution = GoalDistribution::from_minutes(minutes);
    let total_goals = distribution.total();
    let first_half = minutes.iter().filter(|&&m| m <= 45).count() as u32;
    GoalAnalysis {
        total_goals,
        distribution,
        first_half,
        second_half: total_goals - first_half,
    }
}

/// Regulation-time histogram of at most `cap` goals, earliest first.
pub fn capped_histogram(minutes: &[u32], cap: u32) -> GoalHistogram {
    let mut sorted: Vec<u32> = minutes.to_vec();
    sorted.sort_unstable();
    let kept: Vec<u32> = sorted.into_iter().take(cap as usize).collect();
    GoalDistribution::from_minutes(&kept).histogram()
}
