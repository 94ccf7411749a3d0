use crate::{
    domain::{
        card::normalize_title, Board, BoardId, Card, CardId, CardPatch, List, ListId,
    },
    error::{BoardError, Result},
    sync::SyncClient,
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

/// File-based authoritative store.
///
/// Each entity is one JSON file under `.taskboard/{boards,lists,cards}/`.
/// Mutations are serialized so order assignment (`max + 1`) cannot race.
pub struct FileStore {
    root_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    const STORE_DIR: &'static str = ".taskboard";
    const BOARDS_DIR: &'static str = "boards";
    const LISTS_DIR: &'static str = "lists";
    const CARDS_DIR: &'static str = "cards";

    /// Creates a new FileStore for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::STORE_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn boards_dir(&self) -> PathBuf {
        self.root_path.join(Self::BOARDS_DIR)
    }

    fn lists_dir(&self) -> PathBuf {
        self.root_path.join(Self::LISTS_DIR)
    }

    fn cards_dir(&self) -> PathBuf {
        self.root_path.join(Self::CARDS_DIR)
    }

    // Ids that could not have been issued by this store name nothing in it
    fn board_file(&self, id: &BoardId) -> Result<PathBuf> {
        entity_file(self.boards_dir(), id.as_str())
            .ok_or_else(|| BoardError::BoardNotFound(id.to_string()))
    }

    fn list_file(&self, id: &ListId) -> Result<PathBuf> {
        entity_file(self.lists_dir(), id.as_str())
            .ok_or_else(|| BoardError::ListNotFound(id.to_string()))
    }

    fn card_file(&self, id: &CardId) -> Result<PathBuf> {
        entity_file(self.cards_dir(), id.as_str())
            .ok_or_else(|| BoardError::CardNotFound(id.to_string()))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    /// Creates the store directory layout
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.boards_dir()).await?;
        self.ensure_directory_exists(&self.lists_dir()).await?;
        self.ensure_directory_exists(&self.cards_dir()).await?;
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.boards_dir().exists() && self.lists_dir().exists() && self.cards_dir().exists()
    }

    pub async fn create_board(&self, title: &str, owner_id: &str) -> Result<Board> {
        let _guard = self.write_lock.lock().await;
        if !self.is_initialized().await {
            return Err(BoardError::StorageError(format!(
                "store at {} is not initialized",
                self.root_path.display()
            )));
        }

        let board = Board::new(BoardId::generate(), normalize_title(title)?, owner_id.to_string());
        write_json(&self.board_file(&board.id)?, &board).await?;
        info!(board_id = %board.id, "board created");
        Ok(board)
    }

    /// Boards owned by `owner_id`, oldest first
    pub async fn boards_for_owner(&self, owner_id: &str) -> Result<Vec<Board>> {
        let mut boards: Vec<Board> = read_all(&self.boards_dir()).await?;
        boards.retain(|b| b.owner_id == owner_id);
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(boards)
    }

    /// Deletes a board and every list and card on it
    pub async fn delete_board(&self, board_id: &BoardId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let board_file = self.board_file(board_id)?;
        if !board_file.exists() {
            return Err(BoardError::BoardNotFound(board_id.to_string()));
        }

        let lists: Vec<List> = read_all(&self.lists_dir()).await?;
        for list in lists.iter().filter(|l| &l.board_id == board_id) {
            self.remove_list_cascade(&list.id).await?;
        }
        fs::remove_file(board_file).await?;
        info!(board_id = %board_id, "board deleted");
        Ok(())
    }

    async fn load_list(&self, id: &ListId) -> Result<List> {
        read_json(&self.list_file(id)?)
            .await?
            .ok_or_else(|| BoardError::ListNotFound(id.to_string()))
    }

    async fn load_card(&self, id: &CardId) -> Result<Card> {
        read_json(&self.card_file(id)?)
            .await?
            .ok_or_else(|| BoardError::CardNotFound(id.to_string()))
    }

    async fn cards_in(&self, list_id: &ListId) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = read_all(&self.cards_dir()).await?;
        cards.retain(|c| &c.list_id == list_id);
        cards.sort_by(|a, b| a.order.total_cmp(&b.order));
        Ok(cards)
    }

    async fn remove_list_cascade(&self, list_id: &ListId) -> Result<()> {
        for card in self.cards_in(list_id).await? {
            fs::remove_file(self.card_file(&card.id)?).await?;
        }
        fs::remove_file(self.list_file(list_id)?).await?;
        Ok(())
    }
}

#[async_trait]
impl SyncClient for FileStore {
    async fn fetch_board(&self, board_id: &BoardId) -> Result<Board> {
        read_json(&self.board_file(board_id)?)
            .await?
            .ok_or_else(|| BoardError::BoardNotFound(board_id.to_string()))
    }

    async fn fetch_lists_for_board(&self, board_id: &BoardId) -> Result<Vec<List>> {
        if !self.board_file(board_id)?.exists() {
            return Err(BoardError::BoardNotFound(board_id.to_string()));
        }

        let mut lists: Vec<List> = read_all(&self.lists_dir()).await?;
        lists.retain(|l| &l.board_id == board_id);
        lists.sort_by(|a, b| a.order.total_cmp(&b.order));
        Ok(lists)
    }

    async fn fetch_cards_for_list(&self, list_id: &ListId) -> Result<Vec<Card>> {
        if !self.list_file(list_id)?.exists() {
            return Err(BoardError::ListNotFound(list_id.to_string()));
        }
        self.cards_in(list_id).await
    }

    async fn create_card(&self, list_id: &ListId, title: &str) -> Result<Card> {
        let _guard = self.write_lock.lock().await;
        let title = normalize_title(title)?;
        self.load_list(list_id).await?;

        let order = next_order(self.cards_in(list_id).await?.iter().map(|c| c.order));
        let card = Card::new(CardId::generate(), list_id.clone(), title, order);
        write_json(&self.card_file(&card.id)?, &card).await?;

        info!(card_id = %card.id, list_id = %list_id, "card created");
        Ok(card)
    }

    async fn update_card_position(&self, card_id: &CardId, list_id: &ListId) -> Result<Card> {
        let _guard = self.write_lock.lock().await;
        let mut card = self.load_card(card_id).await?;
        if &card.list_id == list_id {
            debug!(card_id = %card_id, "card already in target list, order kept");
            return Ok(card);
        }

        let source = self.load_list(&card.list_id).await?;
        let target = self.load_list(list_id).await?;
        if source.board_id != target.board_id {
            return Err(BoardError::Conflict(format!(
                "list {} is not on board {}",
                list_id, source.board_id
            )));
        }

        card.order = next_order(self.cards_in(list_id).await?.iter().map(|c| c.order));
        card.list_id = list_id.clone();
        write_json(&self.card_file(card_id)?, &card).await?;

        info!(card_id = %card_id, list_id = %list_id, "card moved");
        Ok(card)
    }

    async fn update_card_details(&self, card_id: &CardId, patch: &CardPatch) -> Result<Card> {
        let _guard = self.write_lock.lock().await;
        let mut card = self.load_card(card_id).await?;
        card.apply_patch(patch)?;
        write_json(&self.card_file(card_id)?, &card).await?;
        Ok(card)
    }

    async fn create_list(&self, board_id: &BoardId, title: &str) -> Result<List> {
        let _guard = self.write_lock.lock().await;
        let title = normalize_title(title)?;
        if !self.board_file(board_id)?.exists() {
            return Err(BoardError::BoardNotFound(board_id.to_string()));
        }

        let mut siblings: Vec<List> = read_all(&self.lists_dir()).await?;
        siblings.retain(|l| &l.board_id == board_id);
        let order = next_order(siblings.iter().map(|l| l.order));

        let list = List::new(ListId::generate(), board_id.clone(), title, order);
        write_json(&self.list_file(&list.id)?, &list).await?;

        info!(list_id = %list.id, board_id = %board_id, "list created");
        Ok(list)
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let file_path = self.card_file(card_id)?;
        if !file_path.exists() {
            return Err(BoardError::CardNotFound(card_id.to_string()));
        }

        fs::remove_file(file_path).await?;
        info!(card_id = %card_id, "card deleted");
        Ok(())
    }

    async fn delete_list(&self, list_id: &ListId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.list_file(list_id)?.exists() {
            return Err(BoardError::ListNotFound(list_id.to_string()));
        }

        self.remove_list_cascade(list_id).await?;
        info!(list_id = %list_id, "list deleted");
        Ok(())
    }
}

/// `max + 1` over sibling orders, or 0 when there are none
fn next_order(orders: impl Iterator<Item = f64>) -> f64 {
    orders.fold(None, |max: Option<f64>, o| Some(max.map_or(o, |m| m.max(o))))
        .map_or(0.0, |max| max.floor() + 1.0)
}

/// `<dir>/<id>.json`, or `None` when `id` is not a plain file stem
fn entity_file(dir: PathBuf, id: &str) -> Option<PathBuf> {
    let plain = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    plain.then(|| dir.join(format!("{}.json", id)))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).await?;
    Ok(Some(serde_json::from_str(&contents)?))
}

async fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = fs::read_dir(dir).await?;
    let mut items = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            let contents = fs::read_to_string(&path).await?;
            items.push(serde_json::from_str(&contents)?);
        }
    }

    Ok(items)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    Ok(())
}
