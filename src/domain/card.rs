use crate::domain::ids::{CardId, ListId};
use crate::error::{BoardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task unit belonging to one list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Position among the sibling cards of `list_id`, ascending
    pub order: f64,
}

impl Card {
    /// Creates a card with no description or due date
    pub fn new(id: CardId, list_id: ListId, title: String, order: f64) -> Self {
        Self {
            id,
            list_id,
            title,
            description: None,
            due_date: None,
            order,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Applies the fields present in `patch`
    pub fn apply_patch(&mut self, patch: &CardPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            self.title = normalize_title(title)?;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        Ok(())
    }
}

/// Partial update of a card's editable details.
///
/// The outer `Option` says whether a field is touched; for `description` and
/// `due_date` an inner `None` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl CardPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.due_date.is_none()
    }
}

/// Trims a user supplied title, rejecting blank ones
pub fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(BoardError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
