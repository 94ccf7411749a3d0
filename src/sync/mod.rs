use crate::{
    domain::{Board, BoardId, Card, CardId, CardPatch, List, ListCards, ListId},
    error::Result,
};
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

#[cfg(feature = "file-store")]
pub mod file_store;

#[cfg(all(test, feature = "file-store"))]
pub(crate) mod testing;

/// The authoritative store holding boards, lists and cards.
///
/// Implementations own id and order assignment. Any error they return is
/// treated by callers as a persistence failure.
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Fetches a board's metadata
    async fn fetch_board(&self, board_id: &BoardId) -> Result<Board>;

    /// Fetches a board's lists, ascending by order
    async fn fetch_lists_for_board(&self, board_id: &BoardId) -> Result<Vec<List>>;

    /// Fetches a list's cards, ascending by order
    async fn fetch_cards_for_list(&self, list_id: &ListId) -> Result<Vec<Card>>;

    /// Creates a card at the end of a list; the store assigns id and order
    async fn create_card(&self, list_id: &ListId, title: &str) -> Result<Card>;

    /// Moves a card to `list_id`; the store recomputes its order
    async fn update_card_position(&self, card_id: &CardId, list_id: &ListId) -> Result<Card>;

    /// Edits a card's title, description or due date
    async fn update_card_details(&self, card_id: &CardId, patch: &CardPatch) -> Result<Card>;

    /// Creates a list at the end of a board; the store assigns id and order
    async fn create_list(&self, board_id: &BoardId, title: &str) -> Result<List>;

    async fn delete_card(&self, card_id: &CardId) -> Result<()>;

    /// Deletes a list together with its cards
    async fn delete_list(&self, list_id: &ListId) -> Result<()>;
}

/// Fetches a board's lists and the cards of every list.
///
/// Card fetches run concurrently and are independent: a list whose cards
/// cannot be fetched is returned with no cards rather than failing the load.
/// Only a failure to fetch the lists themselves is an error.
pub async fn load_board<C>(client: &C, board_id: &BoardId) -> Result<Vec<ListCards>>
where
    C: SyncClient + ?Sized,
{
    let lists = client.fetch_lists_for_board(board_id).await?;

    let fetches = lists.iter().map(|list| client.fetch_cards_for_list(&list.id));
    let results = join_all(fetches).await;

    let snapshot: Vec<ListCards> = lists
        .into_iter()
        .zip(results)
        .map(|(list, cards)| match cards {
            Ok(cards) => ListCards::new(list, cards),
            Err(e) => {
                warn!(list_id = %list.id, error = %e, "failed to fetch cards, showing list empty");
                ListCards::empty(list)
            }
        })
        .collect();

    debug!(board_id = %board_id, lists = snapshot.len(), "board snapshot loaded");
    Ok(snapshot)
}
