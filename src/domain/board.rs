use crate::domain::ids::BoardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A board owned by a user. Lists reference it through `board_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Board {
    pub fn new(id: BoardId, title: String, owner_id: String) -> Self {
        Self {
            id,
            title,
            owner_id,
            created_at: Utc::now(),
        }
    }
}
