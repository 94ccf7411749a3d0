use crate::domain::card::Card;
use crate::error::BoardError;
use chrono::{DateTime, Duration, Utc};
use std::{fmt, str::FromStr};

/// Number of days ahead that counts as "due soon" unless configured otherwise
pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

/// Due-date bucket a card must fall into to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    Overdue,
    DueSoon,
}

impl FromStr for DateFilter {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DateFilter::All),
            "overdue" => Ok(DateFilter::Overdue),
            "due-soon" => Ok(DateFilter::DueSoon),
            _ => Err(BoardError::InvalidDateFilter(s.to_string())),
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Overdue => write!(f, "overdue"),
            Self::DueSoon => write!(f, "due-soon"),
        }
    }
}

/// Search term plus date bucket applied to a list's cards.
///
/// Filtering never reorders: the output is always a subsequence of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct CardFilter {
    search: String,
    date: DateFilter,
    due_soon_window: Duration,
}

impl Default for CardFilter {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_DUE_SOON_DAYS))
    }
}

impl CardFilter {
    /// Creates a pass-everything filter with the given "due soon" horizon
    pub fn new(due_soon_window: Duration) -> Self {
        Self {
            search: String::new(),
            date: DateFilter::All,
            due_soon_window,
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.set_search(term);
        self
    }

    pub fn with_date(mut self, date: DateFilter) -> Self {
        self.date = date;
        self
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn set_date(&mut self, date: DateFilter) {
        self.date = date;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn date(&self) -> DateFilter {
        self.date
    }

    /// True when the filter lets every card through
    pub fn is_pass_through(&self) -> bool {
        self.search.is_empty() && self.date == DateFilter::All
    }

    /// Search AND date-bucket predicate, evaluated against `now`
    pub fn matches(&self, card: &Card, now: DateTime<Utc>) -> bool {
        self.matches_search(card, &self.search.to_lowercase()) && self.matches_date(card, now)
    }

    /// Returns the matching cards in their original order
    pub fn apply<'a>(&self, cards: &'a [Card], now: DateTime<Utc>) -> Vec<&'a Card> {
        let needle = self.search.to_lowercase();
        cards
            .iter()
            .filter(|card| self.matches_search(card, &needle) && self.matches_date(card, now))
            .collect()
    }

    fn matches_search(&self, card: &Card, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        card.title.to_lowercase().contains(needle)
            || card
                .description
                .as_ref()
                .map(|d| d.to_lowercase().contains(needle))
                .unwrap_or(false)
    }

    fn matches_date(&self, card: &Card, now: DateTime<Utc>) -> bool {
        match self.date {
            DateFilter::All => true,
            DateFilter::Overdue => card.due_date.map(|due| due < now).unwrap_or(false),
            DateFilter::DueSoon => card
                .due_date
                .map(|due| {
                    // past the end of representable time everything ahead is "soon"
                    due >= now
                        && now
                            .checked_add_signed(self.due_soon_window)
                            .map_or(true, |horizon| due <= horizon)
                })
                .unwrap_or(false),
        }
    }
}
