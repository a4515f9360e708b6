//! The toppling rule shared by every realization of the automaton.
//!
//! A cell whose value is at least `2 * dimension + 1` in magnitude splits
//! its value into that many equal shares: one for itself and one for each of
//! its axis neighbours. A neighbour holding the same value as the cell
//! declines its share, which stays with the cell. The rule only looks at a
//! cell's value and the multiset of its neighbours' values, so it commutes
//! with axis permutations and sign flips.

use crate::{coords::Coordinates, Value};

/// The amount of parts a toppling cell in `dimension` dimensions splits its
/// value into.
pub fn share_count(dimension: usize) -> Value {
    2 * dimension as Value + 1
}

/// Where a part of a cell's value goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Center,
    /// The neighbour at index `i` of the neighbour list, as produced by
    /// [`neighbor_position`].
    Neighbor(usize),
}

/// The position of the `i`th neighbour of `center`: `2 * axis` is one step
/// up along `axis` and `2 * axis + 1` is one step down.
pub fn neighbor_position(center: &Coordinates, i: usize) -> Coordinates {
    let delta = if i % 2 == 0 { 1 } else { -1 };
    center.offset(i / 2, delta)
}

/// Apply the rule to a cell holding `value` whose neighbours hold
/// `neighbors`, ordered as in [`neighbor_position`].
///
/// `give` is called with every amount the cell contributes to the next
/// state. The amounts always add up to `value`. Returns `true` if the cell
/// gave a share to any neighbour.
pub fn topple<F>(value: Value, neighbors: &[Value], mut give: F) -> bool
where
    F: FnMut(Target, Value),
{
    let share_count = neighbors.len() as Value + 1;

    // Giving and receiving the same amount from every neighbour is a no-op
    if value.unsigned_abs() < share_count as u64 || neighbors.iter().all(|n| *n == value) {
        give(Target::Center, value);
        return false;
    }

    let share = value / share_count;
    let remainder = value % share_count;

    let mut kept = remainder + share;
    for (i, neighbor) in neighbors.iter().enumerate() {
        if *neighbor == value {
            kept += share;
        } else {
            give(Target::Neighbor(i), share);
        }
    }
    give(Target::Center, kept);

    true
}
