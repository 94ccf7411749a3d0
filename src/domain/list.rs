use crate::domain::ids::{BoardId, ListId};
use serde::{Deserialize, Serialize};

/// A named, ordered column of cards on a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub title: String,
    /// Position among the sibling lists of `board_id`, ascending
    pub order: f64,
}

impl List {
    pub fn new(id: ListId, board_id: BoardId, title: String, order: f64) -> Self {
        Self {
            id,
            board_id,
            title,
            order,
        }
    }
}
