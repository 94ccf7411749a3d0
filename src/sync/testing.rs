//! Failure-injecting client used by the unit tests.

use crate::{
    domain::{Board, BoardId, Card, CardId, CardPatch, List, ListId},
    error::{BoardError, Result},
    sync::{file_store::FileStore, SyncClient},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::Notify;

/// A parked call: `reached` fires once the call is parked, `release` lets it go
#[derive(Default)]
pub(crate) struct Hold {
    pub reached: Notify,
    pub release: Notify,
}

/// Wraps a [`FileStore`] and fails or holds selected calls
pub(crate) struct FlakyClient {
    pub inner: FileStore,
    failing_moves: Mutex<HashSet<CardId>>,
    failing_card_fetches: Mutex<HashSet<ListId>>,
    fail_list_fetch: AtomicBool,
    fail_writes: AtomicBool,
    held_move: Mutex<Option<(CardId, Arc<Notify>)>>,
    held_create: Mutex<Option<(ListId, Arc<Hold>)>>,
    pub move_calls: AtomicUsize,
    pub list_fetches: AtomicUsize,
}

impl FlakyClient {
    pub fn new(inner: FileStore) -> Self {
        Self {
            inner,
            failing_moves: Mutex::new(HashSet::new()),
            failing_card_fetches: Mutex::new(HashSet::new()),
            fail_list_fetch: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            held_move: Mutex::new(None),
            held_create: Mutex::new(None),
            move_calls: AtomicUsize::new(0),
            list_fetches: AtomicUsize::new(0),
        }
    }

    /// Makes `update_card_position` reject this card
    pub fn fail_move_of(&self, card_id: &CardId) {
        self.failing_moves.lock().insert(card_id.clone());
    }

    pub fn fail_card_fetch_for(&self, list_id: &ListId) {
        self.failing_card_fetches.lock().insert(list_id.clone());
    }

    pub fn set_fail_list_fetch(&self, fail: bool) {
        self.fail_list_fetch.store(fail, Ordering::SeqCst);
    }

    /// Fails create, delete and detail updates
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Parks the next position update of `card_id` until the returned handle
    /// is notified
    pub fn hold_move_of(&self, card_id: &CardId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.held_move.lock() = Some((card_id.clone(), gate.clone()));
        gate
    }

    /// Parks the next card creation in `list_id` after the store has written it
    pub fn hold_create_in(&self, list_id: &ListId) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        *self.held_create.lock() = Some((list_id.clone(), hold.clone()));
        hold
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BoardError::transport(anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl SyncClient for FlakyClient {
    async fn fetch_board(&self, board_id: &BoardId) -> Result<Board> {
        self.inner.fetch_board(board_id).await
    }

    async fn fetch_lists_for_board(&self, board_id: &BoardId) -> Result<Vec<List>> {
        self.list_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_fetch.load(Ordering::SeqCst) {
            return Err(BoardError::transport(anyhow::anyhow!("gateway timeout")));
        }
        self.inner.fetch_lists_for_board(board_id).await
    }

    async fn fetch_cards_for_list(&self, list_id: &ListId) -> Result<Vec<Card>> {
        if self.failing_card_fetches.lock().contains(list_id) {
            return Err(BoardError::transport(anyhow::anyhow!("gateway timeout")));
        }
        self.inner.fetch_cards_for_list(list_id).await
    }

    async fn create_card(&self, list_id: &ListId, title: &str) -> Result<Card> {
        self.check_writes()?;
        let card = self.inner.create_card(list_id, title).await?;

        let hold = {
            let mut held = self.held_create.lock();
            let is_held = held.as_ref().map_or(false, |(id, _)| id == list_id);
            if is_held {
                held.take().map(|(_, hold)| hold)
            } else {
                None
            }
        };
        if let Some(hold) = hold {
            hold.reached.notify_one();
            hold.release.notified().await;
        }
        Ok(card)
    }

    async fn update_card_position(&self, card_id: &CardId, list_id: &ListId) -> Result<Card> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);

        let gate = {
            let mut held = self.held_move.lock();
            let is_held = held.as_ref().map_or(false, |(id, _)| id == card_id);
            if is_held {
                held.take().map(|(_, gate)| gate)
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing_moves.lock().contains(card_id) {
            return Err(BoardError::Conflict(format!("card {} was modified", card_id)));
        }
        self.inner.update_card_position(card_id, list_id).await
    }

    async fn update_card_details(&self, card_id: &CardId, patch: &CardPatch) -> Result<Card> {
        self.check_writes()?;
        self.inner.update_card_details(card_id, patch).await
    }

    async fn create_list(&self, board_id: &BoardId, title: &str) -> Result<List> {
        self.check_writes()?;
        self.inner.create_list(board_id, title).await
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<()> {
        self.check_writes()?;
        self.inner.delete_card(card_id).await
    }

    async fn delete_list(&self, list_id: &ListId) -> Result<()> {
        self.check_writes()?;
        self.inner.delete_list(list_id).await
    }
}
