//! Order-key arithmetic for sibling sequences.
//!
//! Keys are `f64` values that sort ascending. A new key is placed strictly
//! between its neighbours so inserting a card only touches that card; when
//! floating-point precision runs out the sequence is renumbered.

use crate::domain::card::Card;

/// Distance between keys appended at the ends and produced by renumbering
pub const ORDER_STEP: f64 = 1.0;

/// Returns a key strictly between `prev` and `next`, or `None` if there is no
/// representable key left between them.
///
/// A missing neighbour means the key goes at that end of the sequence.
///
/// # Examples
/// ```
/// use taskboard_core::domain::ordering::order_between;
///
/// assert_eq!(order_between(None, None), Some(0.0));
/// assert_eq!(order_between(Some(2.0), None), Some(3.0));
/// assert_eq!(order_between(None, Some(0.0)), Some(-1.0));
/// assert_eq!(order_between(Some(1.0), Some(2.0)), Some(1.5));
/// ```
pub fn order_between(prev: Option<f64>, next: Option<f64>) -> Option<f64> {
    let candidate = match (prev, next) {
        (None, None) => 0.0,
        (Some(p), None) => p + ORDER_STEP,
        (None, Some(n)) => n - ORDER_STEP,
        (Some(p), Some(n)) => p + (n - p) / 2.0,
    };

    if candidate.is_finite() && fits_between(candidate, prev, next) {
        Some(candidate)
    } else {
        None
    }
}

/// Checks whether `key` sorts strictly after `prev` and strictly before `next`
pub fn fits_between(key: f64, prev: Option<f64>, next: Option<f64>) -> bool {
    prev.map_or(true, |p| key > p) && next.map_or(true, |n| key < n)
}

/// Rewrites keys as `0, 1, 2, ...` keeping the current sequence order
pub fn renumber(cards: &mut [Card]) {
    for (index, card) in cards.iter_mut().enumerate() {
        card.order = index as f64 * ORDER_STEP;
    }
}

/// True when no two cards share a key and keys ascend along the sequence
pub fn is_strictly_ascending(cards: &[Card]) -> bool {
    cards.windows(2).all(|pair| pair[0].order < pair[1].order)
}
