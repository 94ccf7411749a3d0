//! Optimistic board session.
//!
//! [`MoveCoordinator`] owns the local view of one board and is the only
//! thing that mutates it. Moves are applied to the view immediately and then
//! persisted; when persistence fails the view is thrown away and reloaded
//! from the store rather than patched back, since the store's ordering may
//! have changed for reasons unrelated to the failed move.
//!
//! All methods take `&self`. The view sits behind a lock that is never held
//! across an `.await`, so several operations can be in flight at once while
//! their local mutations still apply one at a time in issue order.

use crate::{
    config::SyncConfig,
    domain::{
        Board, BoardId, Card, CardFilter, CardId, CardPatch, DateFilter, List, ListCards, ListId,
        LocalView,
    },
    error::{BoardError, Result},
    notice::{Notice, NoticeKind, Notifier},
    sync::{load_board, SyncClient},
};
use chrono::{DateTime, Utc};
use futures::future::try_join;
use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

struct ViewState {
    view: LocalView,
    /// Ticket of the snapshot the view was last replaced with
    applied_ticket: u64,
}

pub struct MoveCoordinator<C: ?Sized> {
    client: Arc<C>,
    board_id: BoardId,
    board: RwLock<Option<Board>>,
    state: RwLock<ViewState>,
    filter: RwLock<CardFilter>,
    notifier: Notifier,
    reload_ticket: AtomicU64,
}

impl<C: SyncClient + ?Sized> MoveCoordinator<C> {
    /// Creates a coordinator with an empty view; call [`load`](Self::load) next
    pub fn new(client: Arc<C>, board_id: BoardId, config: &SyncConfig) -> Self {
        Self {
            client,
            board_id,
            board: RwLock::new(None),
            state: RwLock::new(ViewState {
                view: LocalView::new(),
                applied_ticket: 0,
            }),
            filter: RwLock::new(CardFilter::new(config.due_soon_window())),
            notifier: Notifier::new(config.notice_capacity),
            reload_ticket: AtomicU64::new(0),
        }
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    /// Board metadata from the last successful load
    pub fn board(&self) -> Option<Board> {
        self.board.read().clone()
    }

    /// Subscribes to failure notices
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    /// Fetches the board and replaces the local view with it.
    ///
    /// Lists whose cards fail to load are shown empty. If the board or its
    /// lists cannot be fetched the view is left as it was and a notice is sent.
    pub async fn load(&self) -> Result<()> {
        let ticket = self.reload_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = try_join(
            self.client.fetch_board(&self.board_id),
            load_board(self.client.as_ref(), &self.board_id),
        )
        .await;

        match fetched {
            Ok((board, snapshot)) => {
                if self.apply_snapshot(ticket, snapshot) {
                    *self.board.write() = Some(board);
                }
                Ok(())
            }
            Err(e) => {
                warn!(board_id = %self.board_id, error = %e, "board load failed");
                self.notifier.notify(NoticeKind::Load, "Failed to fetch board data");
                Err(e)
            }
        }
    }

    /// Moves a card so it sits immediately before `before` in `target`, or at
    /// the end of `target` when `before` is `None` or not found there.
    ///
    /// The local view changes before the store is contacted. On a store
    /// failure the board is reloaded and the store's error is returned.
    ///
    /// # Errors
    /// - `CardNotInList` / `ListNotFound` when the view does not hold the card
    ///   in `source` or does not hold `target`; nothing is changed and the
    ///   store is not called.
    /// - Whatever the store returned if persisting the move failed.
    pub async fn move_card(
        &self,
        card_id: &CardId,
        source: &ListId,
        target: &ListId,
        before: Option<&CardId>,
    ) -> Result<()> {
        self.apply_optimistic_move(card_id, source, target, before)
            .map_err(|e| self.reject(e))?;

        match self.client.update_card_position(card_id, target).await {
            Ok(_) => {
                info!(card_id = %card_id, list_id = %target, "card move persisted");
                Ok(())
            }
            Err(e) => {
                warn!(card_id = %card_id, error = %e, "card move rejected, reloading board");
                self.notifier.notify(NoticeKind::Persistence, "Failed to move card");
                self.reconcile().await;
                Err(e)
            }
        }
    }

    /// Creates a card at the end of a list
    pub async fn create_card(&self, list_id: &ListId, title: &str) -> Result<Card> {
        self.require_list(list_id)?;

        let card = self
            .persist(self.client.create_card(list_id, title), "Failed to create card")
            .await?;

        let mut state = self.state.write();
        let card_id = card.id.clone();
        state.view.insert_card(list_id, card.clone(), None);
        debug!(card_id = %card_id, list_id = %list_id, "card appended");
        Ok(state.view.card(&card_id).cloned().unwrap_or(card))
    }

    /// Creates a list at the end of the board
    pub async fn create_list(&self, title: &str) -> Result<List> {
        let list = self
            .persist(
                self.client.create_list(&self.board_id, title),
                "Failed to create list",
            )
            .await?;

        self.state.write().view.add_list(list.clone());
        Ok(list)
    }

    /// Edits a card's title, description or due date
    pub async fn update_card(&self, card_id: &CardId, patch: &CardPatch) -> Result<Card> {
        self.require_card(card_id)?;

        let updated = self
            .persist(
                self.client.update_card_details(card_id, patch),
                "Failed to update card",
            )
            .await?;

        self.state.write().view.update_card_details(&updated);
        Ok(updated)
    }

    pub async fn delete_card(&self, card_id: &CardId) -> Result<()> {
        self.require_card(card_id)?;

        self.persist(self.client.delete_card(card_id), "Failed to delete card")
            .await?;

        self.state.write().view.remove_card(card_id);
        Ok(())
    }

    /// Deletes a list and, with it, its cards
    pub async fn delete_list(&self, list_id: &ListId) -> Result<()> {
        self.require_list(list_id)?;

        self.persist(self.client.delete_list(list_id), "Failed to delete list")
            .await?;

        self.state.write().view.remove_list(list_id);
        Ok(())
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.filter.write().set_search(term);
    }

    pub fn set_date_filter(&self, date: DateFilter) {
        self.filter.write().set_date(date);
    }

    pub fn search_term(&self) -> String {
        self.filter.read().search().to_string()
    }

    pub fn date_filter(&self) -> DateFilter {
        self.filter.read().date()
    }

    /// Lists in render order
    pub fn lists(&self) -> Vec<List> {
        self.state.read().view.lists().cloned().collect()
    }

    /// All cards of a list in render order, ignoring the active filter
    pub fn cards(&self, list_id: &ListId) -> Option<Vec<Card>> {
        self.state.read().view.cards(list_id).map(<[Card]>::to_vec)
    }

    /// Cards of a list that pass the active filter, in render order
    pub fn visible_cards(&self, list_id: &ListId) -> Vec<Card> {
        self.visible_cards_at(list_id, Utc::now())
    }

    /// Like [`visible_cards`](Self::visible_cards) with an explicit "now"
    pub fn visible_cards_at(&self, list_id: &ListId, now: DateTime<Utc>) -> Vec<Card> {
        let filter = self.filter.read().clone();
        let state = self.state.read();
        let Some(cards) = state.view.cards(list_id) else {
            return Vec::new();
        };
        if filter.is_pass_through() {
            return cards.to_vec();
        }
        let visible: Vec<Card> = filter.apply(cards, now).into_iter().cloned().collect();
        visible
    }

    /// A copy of the whole local view
    pub fn snapshot(&self) -> LocalView {
        self.state.read().view.clone()
    }

    fn apply_optimistic_move(
        &self,
        card_id: &CardId,
        source: &ListId,
        target: &ListId,
        before: Option<&CardId>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let view = &mut state.view;

        let Some(position) = view.position_of(source, card_id) else {
            return Err(BoardError::CardNotInList {
                card_id: card_id.to_string(),
                list_id: source.to_string(),
            });
        };
        if !view.contains_list(target) {
            return Err(BoardError::ListNotFound(target.to_string()));
        }

        // Anchoring on the moved card itself means "stay where you are"
        let anchor = match before {
            Some(b) if b == card_id && source == target => view
                .cards(source)
                .and_then(|cards| cards.get(position + 1))
                .map(|c| c.id.clone()),
            Some(b) if b == card_id => None,
            other => other.cloned(),
        };

        let Some((mut card, _)) = view.remove_card(card_id) else {
            return Err(BoardError::CardNotFound(card_id.to_string()));
        };
        card.list_id = target.clone();
        view.insert_card(target, card, anchor.as_ref());

        debug!(card_id = %card_id, from = %source, to = %target, "card moved locally");
        Ok(())
    }

    /// Awaits a store call, sending `failure` as a notice if it fails
    async fn persist<T>(
        &self,
        call: impl std::future::Future<Output = Result<T>>,
        failure: &str,
    ) -> Result<T> {
        call.await.map_err(|e| {
            warn!(board_id = %self.board_id, error = %e, "{}", failure);
            self.notifier.notify(NoticeKind::Persistence, failure);
            e
        })
    }

    /// Replaces the view with the store's state; failures are only reported
    async fn reconcile(&self) {
        if self.load().await.is_ok() {
            info!(board_id = %self.board_id, "board reconciled with store");
        }
    }

    fn require_card(&self, card_id: &CardId) -> Result<()> {
        if self.state.read().view.card(card_id).is_none() {
            return Err(self.reject(BoardError::CardNotFound(card_id.to_string())));
        }
        Ok(())
    }

    fn require_list(&self, list_id: &ListId) -> Result<()> {
        if !self.state.read().view.contains_list(list_id) {
            return Err(self.reject(BoardError::ListNotFound(list_id.to_string())));
        }
        Ok(())
    }

    /// Reports an operation that named something the view does not hold
    fn reject(&self, err: BoardError) -> BoardError {
        debug!(board_id = %self.board_id, error = %err, "operation rejected by local state");
        self.notifier
            .notify(NoticeKind::Consistency, "Board is out of date, refresh to continue");
        err
    }

    /// Installs a fetched snapshot unless a later one has already landed
    fn apply_snapshot(&self, ticket: u64, snapshot: Vec<ListCards>) -> bool {
        let mut state = self.state.write();
        if ticket < state.applied_ticket {
            debug!(ticket, applied = state.applied_ticket, "stale snapshot discarded");
            return false;
        }

        state.applied_ticket = ticket;
        state.view.replace_all(snapshot);
        true
    }
}
