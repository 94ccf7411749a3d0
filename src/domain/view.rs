//! The locally held, rendering-ready board state.
//!
//! `LocalView` is a cache of the authoritative store: it is filled by
//! [`LocalView::replace_all`], mutated optimistically through
//! [`LocalView::remove_card`] and [`LocalView::insert_card`], and replaced
//! wholesale whenever it can no longer be trusted. It performs no I/O.
//!
//! # Invariants
//! - Lists are kept ascending by `List::order`.
//! - Within a list no two cards share an order key and cards ascend by key.
//! - Every card's `list_id` names the list that holds it.

use crate::domain::{
    card::Card,
    ids::{CardId, ListId},
    list::List,
    ordering::{fits_between, is_strictly_ascending, order_between, renumber},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A list together with its ordered cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCards {
    pub list: List,
    pub cards: Vec<Card>,
}

impl ListCards {
    pub fn new(list: List, cards: Vec<Card>) -> Self {
        Self { list, cards }
    }

    /// A list with no cards
    pub fn empty(list: List) -> Self {
        Self::new(list, Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalView {
    lists: Vec<ListCards>,
}

impl LocalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a view from a fetched snapshot
    pub fn from_snapshot(lists: Vec<ListCards>) -> Self {
        let mut view = Self::new();
        view.replace_all(lists);
        view
    }

    /// Inserts `card` into `list_id` immediately before `before`, or at the end
    /// when `before` is `None` or not in that list.
    ///
    /// A copy of the card already held anywhere in the view is replaced. The
    /// card's `list_id` is set to `list_id` and its order key is kept if it
    /// already sorts between the new neighbours, otherwise a fitting key is
    /// assigned. Returns `false` without touching anything if the list is
    /// unknown.
    pub fn insert_card(&mut self, list_id: &ListId, mut card: Card, before: Option<&CardId>) -> bool {
        if !self.contains_list(list_id) {
            debug!(list_id = %list_id, card_id = %card.id, "insert into unknown list ignored");
            return false;
        }
        if self.remove_card(&card.id).is_some() {
            debug!(card_id = %card.id, "replacing held copy of card");
        }
        let Some(entry) = self.entry_mut(list_id) else {
            return false;
        };

        let index = before
            .and_then(|anchor| entry.cards.iter().position(|c| &c.id == anchor))
            .unwrap_or(entry.cards.len());

        card.list_id = list_id.clone();
        card.order = key_for_slot(&mut entry.cards, index, card.order);
        entry.cards.insert(index, card);
        true
    }

    /// Removes a card from whichever list holds it, returning the card and the
    /// id of the list it came from.
    pub fn remove_card(&mut self, card_id: &CardId) -> Option<(Card, ListId)> {
        self.lists.iter_mut().find_map(|entry| {
            let index = entry.cards.iter().position(|c| &c.id == card_id)?;
            let card = entry.cards.remove(index);
            Some((card, entry.list.id.clone()))
        })
    }

    /// Replaces the whole view with `lists`, normalizing sort order
    pub fn replace_all(&mut self, mut lists: Vec<ListCards>) {
        lists.sort_by(|a, b| a.list.order.total_cmp(&b.list.order));

        for entry in &mut lists {
            entry.cards.sort_by(|a, b| a.order.total_cmp(&b.order));
            if !is_strictly_ascending(&entry.cards) {
                debug!(list_id = %entry.list.id, "snapshot has colliding card orders, renumbering");
                renumber(&mut entry.cards);
            }
        }

        self.lists = lists;
    }

    /// Adds a list in order-key position, replacing any list with the same id
    pub fn add_list(&mut self, list: List) {
        let cards = self
            .remove_list(&list.id)
            .map(|entry| entry.cards)
            .unwrap_or_default();
        let index = self
            .lists
            .iter()
            .position(|entry| entry.list.order > list.order)
            .unwrap_or(self.lists.len());
        self.lists.insert(index, ListCards::new(list, cards));
    }

    /// Removes a list and the cards it holds
    pub fn remove_list(&mut self, list_id: &ListId) -> Option<ListCards> {
        let index = self.lists.iter().position(|entry| &entry.list.id == list_id)?;
        Some(self.lists.remove(index))
    }

    /// Overwrites the editable details of a held card, leaving its list and
    /// order untouched. Returns `false` if the card is not held.
    pub fn update_card_details(&mut self, updated: &Card) -> bool {
        let Some(card) = self
            .lists
            .iter_mut()
            .flat_map(|entry| entry.cards.iter_mut())
            .find(|c| c.id == updated.id)
        else {
            return false;
        };

        card.title = updated.title.clone();
        card.description = updated.description.clone();
        card.due_date = updated.due_date;
        true
    }

    pub fn lists(&self) -> impl Iterator<Item = &List> {
        self.lists.iter().map(|entry| &entry.list)
    }

    pub fn entries(&self) -> &[ListCards] {
        &self.lists
    }

    pub fn list(&self, list_id: &ListId) -> Option<&List> {
        self.entry(list_id).map(|entry| &entry.list)
    }

    pub fn contains_list(&self, list_id: &ListId) -> bool {
        self.entry(list_id).is_some()
    }

    /// Cards of a list in render order
    pub fn cards(&self, list_id: &ListId) -> Option<&[Card]> {
        self.entry(list_id).map(|entry| entry.cards.as_slice())
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.lists
            .iter()
            .flat_map(|entry| entry.cards.iter())
            .find(|c| &c.id == card_id)
    }

    /// Index of a card within the given list
    pub fn position_of(&self, list_id: &ListId, card_id: &CardId) -> Option<usize> {
        self.cards(list_id)?.iter().position(|c| &c.id == card_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    fn entry(&self, list_id: &ListId) -> Option<&ListCards> {
        self.lists.iter().find(|entry| &entry.list.id == list_id)
    }

    fn entry_mut(&mut self, list_id: &ListId) -> Option<&mut ListCards> {
        self.lists.iter_mut().find(|entry| &entry.list.id == list_id)
    }
}

/// Chooses the order key for a card about to be inserted at `index`
fn key_for_slot(cards: &mut [Card], index: usize, current: f64) -> f64 {
    let neighbours = |cards: &[Card]| {
        let prev = index.checked_sub(1).map(|i| cards[i].order);
        let next = cards.get(index).map(|c| c.order);
        (prev, next)
    };

    let (prev, next) = neighbours(&*cards);
    if current.is_finite() && fits_between(current, prev, next) {
        return current;
    }
    if let Some(key) = order_between(prev, next) {
        return key;
    }

    debug!(len = cards.len(), "order keys exhausted, renumbering list");
    renumber(cards);
    let (prev, next) = neighbours(&*cards);
    order_between(prev, next).unwrap_or(index as f64 - 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::BoardId;

    fn list(id: &str, order: f64) -> List {
        List::new(ListId::from(id), BoardId::from("b1"), id.to_string(), order)
    }

    fn card(id: &str, list_id: &str, order: f64) -> Card {
        Card::new(CardId::from(id), ListId::from(list_id), id.to_string(), order)
    }

    fn ids(view: &LocalView, list_id: &str) -> Vec<String> {
        view.cards(&ListId::from(list_id))
            .unwrap()
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    }

    fn todo_view() -> LocalView {
        LocalView::from_snapshot(vec![
            ListCards::new(
                list("todo", 0.0),
                vec![card("A", "todo", 0.0), card("B", "todo", 1.0), card("C", "todo", 2.0)],
            ),
            ListCards::empty(list("done", 1.0)),
        ])
    }

    fn assert_order_invariant(view: &LocalView) {
        for entry in view.entries() {
            assert!(is_strictly_ascending(&entry.cards), "list {} out of order", entry.list.id);
            assert!(entry.cards.iter().all(|c| c.list_id == entry.list.id));
        }
    }

    #[test]
    fn test_insert_at_end_when_no_anchor() {
        let mut view = todo_view();
        assert!(view.insert_card(&ListId::from("todo"), card("D", "todo", 0.0), None));

        assert_eq!(ids(&view, "todo"), vec!["A", "B", "C", "D"]);
        assert_order_invariant(&view);
    }

    #[test]
    fn test_insert_of_held_card_replaces_it() {
        let mut view = todo_view();

        assert!(view.insert_card(&ListId::from("todo"), card("B", "todo", 1.0), None));
        assert_eq!(ids(&view, "todo"), vec!["A", "C", "B"]);

        assert!(view.insert_card(&ListId::from("done"), card("A", "todo", 0.0), None));
        assert_eq!(ids(&view, "todo"), vec!["C", "B"]);
        assert_eq!(ids(&view, "done"), vec!["A"]);
        assert_order_invariant(&view);
    }

    #[test]
    fn test_insert_before_anchor() {
        let mut view = todo_view();
        let anchor = CardId::from("B");
        view.insert_card(&ListId::from("todo"), card("D", "todo", 9.0), Some(&anchor));

        assert_eq!(ids(&view, "todo"), vec!["A", "D", "B", "C"]);
        let d = view.card(&CardId::from("D")).unwrap();
        assert_eq!(d.order, 0.5);
        assert_order_invariant(&view);
    }

    #[test]
    fn test_insert_with_missing_anchor_appends() {
        let mut view = todo_view();
        let gone = CardId::from("ghost");
        view.insert_card(&ListId::from("todo"), card("D", "todo", 0.0), Some(&gone));

        assert_eq!(ids(&view, "todo"), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_insert_into_unknown_list_is_noop() {
        let mut view = todo_view();
        let before = view.clone();

        assert!(!view.insert_card(&ListId::from("nope"), card("D", "nope", 0.0), None));
        assert_eq!(view, before);
    }

    #[test]
    fn test_insert_sets_list_id() {
        let mut view = todo_view();
        view.insert_card(&ListId::from("done"), card("D", "todo", 0.0), None);
        assert_eq!(view.card(&CardId::from("D")).unwrap().list_id.as_str(), "done");
    }

    #[test]
    fn test_remove_card_reports_origin() {
        let mut view = todo_view();
        let (removed, origin) = view.remove_card(&CardId::from("B")).unwrap();

        assert_eq!(removed.id.as_str(), "B");
        assert_eq!(origin.as_str(), "todo");
        assert_eq!(ids(&view, "todo"), vec!["A", "C"]);
        assert!(view.remove_card(&CardId::from("B")).is_none());
    }

    #[test]
    fn test_remove_then_insert_before_head() {
        let mut view = todo_view();
        let (c, _) = view.remove_card(&CardId::from("C")).unwrap();
        view.insert_card(&ListId::from("todo"), c, Some(&CardId::from("A")));

        assert_eq!(ids(&view, "todo"), vec!["C", "A", "B"]);
        assert_order_invariant(&view);
    }

    #[test]
    fn test_reinsert_before_next_neighbour_is_idempotent() {
        let mut view = todo_view();
        let before = view.clone();

        let (a, _) = view.remove_card(&CardId::from("A")).unwrap();
        view.insert_card(&ListId::from("todo"), a, Some(&CardId::from("B")));

        assert_eq!(view, before);
    }

    #[test]
    fn test_replace_all_sorts_and_repairs() {
        let mut view = LocalView::new();
        view.replace_all(vec![
            ListCards::empty(list("done", 5.0)),
            ListCards::new(
                list("todo", 1.0),
                vec![card("B", "todo", 3.0), card("A", "todo", 3.0), card("C", "todo", 1.0)],
            ),
        ]);

        let titles: Vec<_> = view.lists().map(|l| l.id.to_string()).collect();
        assert_eq!(titles, vec!["todo", "done"]);
        // stable sort keeps B before A on the tie, then renumbering splits them
        assert_eq!(ids(&view, "todo"), vec!["C", "B", "A"]);
        assert_order_invariant(&view);
    }

    #[test]
    fn test_replace_all_discards_previous_state() {
        let mut view = todo_view();
        view.replace_all(vec![ListCards::empty(list("only", 0.0))]);

        assert!(!view.contains_list(&ListId::from("todo")));
        assert!(view.cards(&ListId::from("only")).unwrap().is_empty());
    }

    #[test]
    fn test_add_and_remove_list() {
        let mut view = todo_view();
        view.add_list(list("doing", 0.5));

        let order: Vec<_> = view.lists().map(|l| l.id.to_string()).collect();
        assert_eq!(order, vec!["todo", "doing", "done"]);

        let removed = view.remove_list(&ListId::from("todo")).unwrap();
        assert_eq!(removed.cards.len(), 3);
        assert!(view.card(&CardId::from("A")).is_none());
    }

    #[test]
    fn test_update_card_details_keeps_position() {
        let mut view = todo_view();
        let mut edited = card("B", "done", 42.0);
        edited.title = "Renamed".to_string();

        assert!(view.update_card_details(&edited));
        let b = view.card(&CardId::from("B")).unwrap();
        assert_eq!(b.title, "Renamed");
        assert_eq!(b.list_id.as_str(), "todo");
        assert_eq!(b.order, 1.0);
    }

    #[test]
    fn test_order_invariant_under_many_moves() {
        let mut view = todo_view();
        let names = ["A", "B", "C"];
        let lists = ["todo", "done"];

        // deterministic walk that repeatedly inserts at the head of a list
        for step in 0..300usize {
            let id = CardId::from(names[step % 3]);
            let target = ListId::from(lists[(step / 3) % 2]);
            let anchor = view
                .cards(&target)
                .and_then(|cards| cards.first())
                .map(|c| c.id.clone());

            let (moved, _) = view.remove_card(&id).unwrap();
            view.insert_card(&target, moved, anchor.as_ref());
            assert_order_invariant(&view);
        }

        let total: usize = view.entries().iter().map(|e| e.cards.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_exhausted_keys_trigger_renumber() {
        let p = 1.0_f64;
        let n = f64::from_bits(p.to_bits() + 1);
        let mut view = LocalView::from_snapshot(vec![ListCards::new(
            list("todo", 0.0),
            vec![card("A", "todo", p), card("B", "todo", n)],
        )]);

        view.insert_card(&ListId::from("todo"), card("D", "todo", 0.0), Some(&CardId::from("B")));

        assert_eq!(ids(&view, "todo"), vec!["A", "D", "B"]);
        assert_order_invariant(&view);
    }
}
