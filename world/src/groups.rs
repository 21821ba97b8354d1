//! Connected-group discovery over the board grid.
//!
//! Groups are maximal sets of 4-adjacent, same-colored, occupied slots. The
//! search is an iterative flood fill driven by an explicit frontier stack so
//! call depth never scales with board area. The visited bitmap and frontier
//! are owned by a reusable scratch buffer sized to the board and cleared at
//! the start of each pass.

use crate::Cell;

/// Reusable flood-fill working memory owned by the board.
#[derive(Clone, Debug, Default)]
pub(crate) struct GroupScratch {
    visited: Vec<bool>,
    frontier: Vec<usize>,
    members: Vec<usize>,
}

impl GroupScratch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resizes the scratch for a board with the given slot count.
    pub(crate) fn reset(&mut self, cell_count: usize) {
        if self.visited.len() != cell_count {
            self.visited = vec![false; cell_count];
        } else {
            self.visited.fill(false);
        }
        self.frontier.clear();
        self.members.clear();
    }

    /// Forgets all visit markers ahead of a fresh partition pass.
    pub(crate) fn clear_visited(&mut self) {
        self.visited.fill(false);
    }

    pub(crate) fn visited(&self, index: usize) -> bool {
        self.visited[index]
    }

    /// Member slot index recorded by the most recent flood.
    pub(crate) fn member(&self, position: usize) -> usize {
        self.members[position]
    }
}

/// Discovers the group containing `start` in isolation.
///
/// Clears the visit markers first, so the result is exactly the connected
/// same-color component seeded at `start`. Returns the group size; member
/// slot indices are available through [`GroupScratch::member`]. An empty
/// start slot yields zero.
pub(crate) fn find_group(
    scratch: &mut GroupScratch,
    slots: &[Option<Cell>],
    width: usize,
    start: usize,
) -> usize {
    scratch.clear_visited();
    flood_from(scratch, slots, width, start)
}

/// Floods one group seeded at `start` without clearing visit markers.
///
/// Partition mode: invoked over every unvisited slot in turn, it assigns each
/// occupied cell to exactly one group. Traversal order within a group is an
/// implementation detail callers must not rely on.
pub(crate) fn flood_from(
    scratch: &mut GroupScratch,
    slots: &[Option<Cell>],
    width: usize,
    start: usize,
) -> usize {
    scratch.members.clear();
    scratch.frontier.clear();

    let Some(color) = slots[start].map(|cell| cell.color) else {
        return 0;
    };
    let height = slots.len() / width;

    scratch.visited[start] = true;
    scratch.frontier.push(start);

    while let Some(index) = scratch.frontier.pop() {
        scratch.members.push(index);

        let x = index % width;
        let y = index / width;
        if x + 1 < width {
            try_push(scratch, slots, color, index + 1);
        }
        if x > 0 {
            try_push(scratch, slots, color, index - 1);
        }
        if y + 1 < height {
            try_push(scratch, slots, color, index + width);
        }
        if y > 0 {
            try_push(scratch, slots, color, index - width);
        }
    }

    scratch.members.len()
}

fn try_push(
    scratch: &mut GroupScratch,
    slots: &[Option<Cell>],
    color: collapse_core::ColorId,
    index: usize,
) {
    if scratch.visited[index] {
        return;
    }
    match slots[index] {
        Some(cell) if cell.color == color => {
            scratch.visited[index] = true;
            scratch.frontier.push(index);
        }
        _ => {}
    }
}

/// Reports whether any group of size two or more exists on the board.
///
/// Full-board partition that short-circuits on the first qualifying group;
/// scan order affects performance only, never the answer.
pub(crate) fn has_any_match(
    scratch: &mut GroupScratch,
    slots: &[Option<Cell>],
    width: usize,
) -> bool {
    scratch.clear_visited();
    for start in 0..slots.len() {
        if slots[start].is_none() || scratch.visited(start) {
            continue;
        }
        if flood_from(scratch, slots, width, start) >= 2 {
            return true;
        }
    }
    false
}
