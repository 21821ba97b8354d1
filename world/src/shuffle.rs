//! Deadlock resolution: random permutation plus bounded forced swaps.
//!
//! A deadlocked board has only singleton groups. Resolution first permutes
//! the occupied cells uniformly; random permutation alone cannot guarantee a
//! match (a checkerboard of alternating colors stays matchless), so a second
//! phase manufactures one: swap some distant cell sharing a target's color
//! into one of the target's neighbor slots. Both phases are bounded, and an
//! exhausted budget surfaces [`Event::BoardUnsolvable`] instead of looping.

use collapse_core::Event;
use rand::{seq::SliceRandom, Rng};

use crate::{groups, Board};

/// Attempts per round at picking a target/neighbor pair for a forced swap.
const FORCED_SWAP_ATTEMPTS: u32 = 50;

/// Shuffle rounds before the resolver gives up entirely.
///
/// Alternating between the shuffle and forced-swap phases has no natural
/// bound on its own; this cap is the anti-livelock backstop.
const MAX_SHUFFLE_ROUNDS: u32 = 32;

/// Restores a legal move on a deadlocked board, or reports failure.
///
/// Whenever at least one color occurs twice anywhere on the board, the
/// forced-swap phase is guaranteed to find a repair, so the bounded rounds
/// terminate with a match. A board of pairwise-distinct colors admits no
/// repair at all; that is detected up front and surfaced as a terminal
/// [`Event::BoardUnsolvable`].
pub(crate) fn resolve(board: &mut Board, rng: &mut impl Rng, out_events: &mut Vec<Event>) {
    if !has_duplicate_color(board) {
        out_events.push(Event::BoardUnsolvable);
        return;
    }

    for round in 0..MAX_SHUFFLE_ROUNDS {
        out_events.push(Event::BoardShuffled { round });
        shuffle_occupied(board, rng, out_events);

        let width = board.width();
        if groups::has_any_match(&mut board.scratch, &board.slots, width) {
            return;
        }
        if board.config.width() >= 3
            && board.config.height() >= 3
            && forced_swap(board, rng, out_events)
        {
            return;
        }
    }

    out_events.push(Event::BoardUnsolvable);
}

/// Uniformly permutes the occupied cells across the occupied slots.
///
/// Cells are collected in scan order, Fisher-Yates shuffled, and written back
/// into the same slots in the same scan order. Positions change; the color
/// multiset does not.
fn shuffle_occupied(board: &mut Board, rng: &mut impl Rng, out_events: &mut Vec<Event>) {
    let mut entries = Vec::with_capacity(board.slots.len());
    let mut open_slots = Vec::with_capacity(board.slots.len());
    for index in 0..board.slots.len() {
        if let Some(cell) = board.slots[index].take() {
            entries.push((cell, board.coord_of(index)));
            open_slots.push(index);
        }
    }

    entries.shuffle(rng);

    for (&slot_index, (cell, from)) in open_slots.iter().zip(entries) {
        board.slots[slot_index] = Some(cell);
        let to = board.coord_of(slot_index);
        if from != to {
            out_events.push(Event::CellMoved {
                id: cell.id,
                from,
                to,
            });
        }
    }
}

/// Swaps a distant same-colored cell next to a random interior target.
///
/// Picks a random interior cell `T` and one of its four neighbors `N`, then
/// scans for the first cell `D` (distinct from both) sharing `T`'s color and
/// swaps `D` with `N`, leaving a same-color pair at `T`/`N`. Retries with
/// fresh random picks when a slot is empty or no donor exists; returns false
/// once the attempt budget runs out.
fn forced_swap(board: &mut Board, rng: &mut impl Rng, out_events: &mut Vec<Event>) -> bool {
    let width = board.config.width();
    let height = board.config.height();

    for _ in 0..FORCED_SWAP_ATTEMPTS {
        let target_x = rng.gen_range(1..width - 1);
        let target_y = rng.gen_range(1..height - 1);
        let (neighbor_x, neighbor_y) = match rng.gen_range(0..4_u8) {
            0 => (target_x, target_y + 1),
            1 => (target_x + 1, target_y),
            2 => (target_x, target_y - 1),
            _ => (target_x - 1, target_y),
        };

        let target_index = target_y as usize * board.width() + target_x as usize;
        let neighbor_index = neighbor_y as usize * board.width() + neighbor_x as usize;

        let (Some(target), Some(neighbor)) =
            (board.slots[target_index], board.slots[neighbor_index])
        else {
            continue;
        };

        let donor_index = board.slots.iter().position(|slot| {
            matches!(
                slot,
                Some(cell) if cell.color == target.color
                    && cell.id != target.id
                    && cell.id != neighbor.id
            )
        });
        let Some(donor_index) = donor_index else {
            continue;
        };
        let Some(donor) = board.slots[donor_index] else {
            continue;
        };

        board.slots.swap(neighbor_index, donor_index);
        out_events.push(Event::CellMoved {
            id: donor.id,
            from: board.coord_of(donor_index),
            to: board.coord_of(neighbor_index),
        });
        out_events.push(Event::CellMoved {
            id: neighbor.id,
            from: board.coord_of(neighbor_index),
            to: board.coord_of(donor_index),
        });
        return true;
    }

    false
}

/// True when any palette color occupies at least two slots.
fn has_duplicate_color(board: &Board) -> bool {
    let mut counts = vec![0_u32; board.config.color_count() as usize];
    for slot in &board.slots {
        if let Some(cell) = slot {
            let seen = &mut counts[cell.color.get() as usize];
            *seen += 1;
            if *seen >= 2 {
                return true;
            }
        }
    }
    false
}
