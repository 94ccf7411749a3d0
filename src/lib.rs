//! # Taskboard Core
//!
//! Ordered list/card synchronization core for kanban task boards.
//!
//! The crate keeps a rendering-ready local view of one board, applies
//! drag/drop moves to it optimistically, filters it by search term and due
//! date, and reconciles it with an authoritative store that may reject a
//! move. Transport to the store is abstracted behind [`SyncClient`].

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod notice;
pub mod sync;

// Re-export commonly used types
pub use config::SyncConfig;
pub use coordinator::MoveCoordinator;
pub use domain::{
    Board, BoardId, Card, CardFilter, CardId, CardPatch, DateFilter, List, ListCards, ListId,
    LocalView,
};
pub use error::{BoardError, Result};
pub use notice::{Notice, NoticeKind};
pub use sync::{load_board, SyncClient};

#[cfg(feature = "file-store")]
pub use sync::file_store::FileStore;
