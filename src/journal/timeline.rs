use chrono::{DateTime, Duration, Utc};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::entry::Entry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimelineFilter {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimelineFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Today => "TODAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Today,
            Self::Today => Self::Week,
            Self::Week => Self::Month,
            Self::Month => Self::All,
        }
    }

    fn accepts(self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Today => timestamp.date_naive() == now.date_naive(),
            Self::Week => timestamp >= now - Duration::days(7),
            Self::Month => timestamp >= now - Duration::days(30),
        }
    }
}

#[derive(Debug)]
pub struct TimelineSection<'a> {
    pub title: String,
    pub entries: Vec<&'a Entry>,
}

fn matches_query(matcher: &SkimMatcherV2, text: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    text.to_lowercase().contains(&query.to_lowercase())
        || matcher.fuzzy_match(text, query).is_some()
}

/// Filters, sorts newest first and groups entries by calendar day.
pub fn timeline_sections<'a>(
    entries: &'a [Entry],
    query: &str,
    filter: TimelineFilter,
    now: DateTime<Utc>,
) -> Vec<TimelineSection<'a>> {
    let matcher = SkimMatcherV2::default();
    let query = query.trim();

    let mut matching = entries
        .iter()
        .filter(|entry| matches_query(&matcher, &entry.text, query))
        .filter(|entry| filter.accepts(entry.timestamp, now))
        .collect::<Vec<_>>();
    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut sections: Vec<TimelineSection<'a>> = Vec::new();
    for entry in matching {
        let title = entry.timestamp.format("%B %-d, %Y").to_string();
        match sections.last_mut() {
            Some(section) if section.title == title => section.entries.push(entry),
            _ => sections.push(TimelineSection {
                title,
                entries: vec![entry],
            }),
        }
    }
    sections
}
