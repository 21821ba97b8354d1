#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for the Collapse engine.
//!
//! The board executes [`Command`] values through [`apply`], mutating its grid
//! and broadcasting [`Event`] values that describe every per-cell change.
//! All pipelines run synchronously to completion; the host must serialize
//! calls into [`apply`], and the only randomness the engine consumes is the
//! [`Rng`] source injected alongside each command.

mod groups;
mod shuffle;

use collapse_core::{
    BoardConfig, CellCoord, CellId, ColorId, Command, Event, SelectError, Tier,
};
use rand::Rng;

use crate::groups::GroupScratch;

/// A single colored tile occupying one board slot.
///
/// Color is fixed at creation; only tier and position change afterwards. The
/// cell's coordinates are derived from the slot it occupies, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) id: CellId,
    pub(crate) color: ColorId,
    pub(crate) tier: Tier,
}

/// Authoritative Collapse board state.
///
/// Slots are stored row-major as `Option<Cell>`; a slot is empty or holds
/// exactly one cell. A freshly constructed board is empty until the host
/// submits [`Command::ConfigureBoard`].
#[derive(Clone, Debug)]
pub struct Board {
    config: BoardConfig,
    slots: Vec<Option<Cell>>,
    scratch: GroupScratch,
    next_cell_id: u64,
}

impl Board {
    /// Creates an empty board sized for the default configuration.
    #[must_use]
    pub fn new() -> Self {
        let config = BoardConfig::default();
        let mut scratch = GroupScratch::new();
        scratch.reset(config.cell_count());
        Self {
            config,
            slots: vec![None; config.cell_count()],
            scratch,
            next_cell_id: 0,
        }
    }

    fn width(&self) -> usize {
        self.config.width() as usize
    }

    fn height(&self) -> usize {
        self.config.height() as usize
    }

    fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if self.config.contains(cell) {
            Some(cell.y() as usize * self.width() + cell.x() as usize)
        } else {
            None
        }
    }

    fn coord_of(&self, index: usize) -> CellCoord {
        let width = self.width();
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    fn allocate_id(&mut self) -> CellId {
        let id = CellId::new(self.next_cell_id);
        self.next_cell_id = self.next_cell_id.saturating_add(1);
        id
    }

    fn configure(
        &mut self,
        config: BoardConfig,
        rng: &mut impl Rng,
        out_events: &mut Vec<Event>,
    ) {
        self.config = config;
        self.slots = vec![None; config.cell_count()];
        self.scratch.reset(config.cell_count());
        self.next_cell_id = 0;
        out_events.push(Event::BoardConfigured {
            width: config.width(),
            height: config.height(),
        });
        self.refill(rng, out_events);
        self.classify_tiers(out_events);
        self.resolve_deadlock(rng, out_events);
    }

    fn select(&mut self, cell: CellCoord, rng: &mut impl Rng, out_events: &mut Vec<Event>) {
        let Some(start) = self.index_of(cell) else {
            out_events.push(Event::SelectRejected {
                cell,
                reason: SelectError::OutOfBounds,
            });
            return;
        };

        if self.slots[start].is_none() {
            // Clicking an empty slot is a valid, silent no-op.
            return;
        }

        let width = self.width();
        let size = groups::find_group(&mut self.scratch, &self.slots, width, start);
        if size < 2 {
            // Singleton groups are not matches.
            return;
        }

        for position in 0..size {
            let member = self.scratch.member(position);
            if let Some(removed) = self.slots[member].take() {
                out_events.push(Event::CellRemoved {
                    id: removed.id,
                    cell: self.coord_of(member),
                });
            }
        }

        self.apply_gravity(out_events);
        self.refill(rng, out_events);
        self.classify_tiers(out_events);
        self.resolve_deadlock(rng, out_events);
    }

    /// Compacts every column toward row zero, preserving relative order.
    ///
    /// No cells are created or destroyed here; survivors shift down to fill
    /// the gaps left by a removed group.
    fn apply_gravity(&mut self, out_events: &mut Vec<Event>) {
        let width = self.width();
        let height = self.height();
        for x in 0..width {
            let mut write_y = 0;
            for y in 0..height {
                let read_index = y * width + x;
                if self.slots[read_index].is_none() {
                    continue;
                }
                if y != write_y {
                    let write_index = write_y * width + x;
                    let moved = self.slots[read_index].take();
                    self.slots[write_index] = moved;
                    if let Some(cell) = self.slots[write_index] {
                        out_events.push(Event::CellMoved {
                            id: cell.id,
                            from: self.coord_of(read_index),
                            to: self.coord_of(write_index),
                        });
                    }
                }
                write_y += 1;
            }
        }
    }

    /// Fills every empty slot with a freshly created cell.
    ///
    /// The only creation point for cells: uniform-random palette color,
    /// starting tier [`Tier::Normal`]. Each slot's fill is independent of
    /// iteration order.
    fn refill(&mut self, rng: &mut impl Rng, out_events: &mut Vec<Event>) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_some() {
                continue;
            }
            let color = ColorId::new(rng.gen_range(0..self.config.color_count()));
            let cell = Cell {
                id: self.allocate_id(),
                color,
                tier: Tier::Normal,
            };
            self.slots[index] = Some(cell);
            out_events.push(Event::CellSpawned {
                id: cell.id,
                color,
                tier: Tier::Normal,
                cell: self.coord_of(index),
            });
        }
    }

    /// Partitions the board into color-connected groups and retags tiers.
    ///
    /// Every cell in one group receives the same tier; an event is emitted
    /// only when a cell's tier actually changed.
    fn classify_tiers(&mut self, out_events: &mut Vec<Event>) {
        self.scratch.clear_visited();
        let width = self.width();
        for start in 0..self.slots.len() {
            if self.slots[start].is_none() || self.scratch.visited(start) {
                continue;
            }
            let size = groups::flood_from(&mut self.scratch, &self.slots, width, start);
            let group_size = u32::try_from(size).unwrap_or(u32::MAX);
            let tier = self.config.thresholds().tier_for(group_size);
            for position in 0..size {
                let member = self.scratch.member(position);
                if let Some(occupant) = self.slots[member].as_mut() {
                    if occupant.tier != tier {
                        occupant.tier = tier;
                        out_events.push(Event::TierChanged {
                            id: occupant.id,
                            tier,
                        });
                    }
                }
            }
        }
    }

    fn resolve_deadlock(&mut self, rng: &mut impl Rng, out_events: &mut Vec<Event>) {
        let width = self.width();
        if groups::has_any_match(&mut self.scratch, &self.slots, width) {
            return;
        }
        shuffle::resolve(self, rng, out_events);
        self.classify_tiers(out_events);
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the board, mutating state deterministically
/// with respect to the injected randomness source.
pub fn apply<R: Rng>(
    board: &mut Board,
    rng: &mut R,
    command: Command,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::ConfigureBoard { config } => board.configure(config, rng, out_events),
        Command::SelectCell { cell } => board.select(cell, rng, out_events),
    }
}

/// Query functions that provide read-only access to the board state.
pub mod query {
    use collapse_core::{BoardConfig, BoardView, CellCoord, CellSnapshot};

    use super::Board;

    /// Captures a read-only view of every cell currently on the board.
    #[must_use]
    pub fn board_view(board: &Board) -> BoardView {
        let snapshots = board
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.map(|cell| CellSnapshot {
                    id: cell.id,
                    color: cell.color,
                    tier: cell.tier,
                    cell: board.coord_of(index),
                })
            })
            .collect();
        BoardView::from_snapshots(snapshots)
    }

    /// Retrieves the cell occupying the provided slot, if any.
    #[must_use]
    pub fn cell_at(board: &Board, cell: CellCoord) -> Option<CellSnapshot> {
        let index = board.index_of(cell)?;
        board.slots[index].map(|occupant| CellSnapshot {
            id: occupant.id,
            color: occupant.color,
            tier: occupant.tier,
            cell,
        })
    }

    /// Configuration the board currently runs with.
    #[must_use]
    pub fn config(board: &Board) -> BoardConfig {
        board.config
    }

    /// Width and height of the board measured in slots.
    #[must_use]
    pub fn dimensions(board: &Board) -> (u32, u32) {
        (board.config.width(), board.config.height())
    }
}


#[cfg(test)]
mod tests {
    use collapse_core::{CellCoord, CellId, Event, SelectError, Tier, TierThresholds};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::test_support::{board_from_colors, config};
    use crate::{groups, query};

    #[test]
    fn gravity_is_stable_and_leaves_no_holes_below_cells() {
        let mut board = board_from_colors(config(1, 5, 6), &[0, 1, 2, 3, 4]);
        board.slots[1] = None;
        board.slots[3] = None;

        let mut events = Vec::new();
        board.apply_gravity(&mut events);

        let surviving: Vec<CellId> = board
            .slots
            .iter()
            .filter_map(|slot| slot.map(|cell| cell.id))
            .collect();
        assert_eq!(
            surviving,
            vec![CellId::new(0), CellId::new(2), CellId::new(4)],
            "relative order must be preserved"
        );
        assert!(board.slots[3].is_none());
        assert!(board.slots[4].is_none());
        assert_eq!(
            events,
            vec![
                Event::CellMoved {
                    id: CellId::new(2),
                    from: CellCoord::new(0, 2),
                    to: CellCoord::new(0, 1),
                },
                Event::CellMoved {
                    id: CellId::new(4),
                    from: CellCoord::new(0, 4),
                    to: CellCoord::new(0, 2),
                },
            ]
        );
    }

    #[test]
    fn select_removes_exactly_the_connected_component() {
        // Row-major 3x3 layout; the color-0 component spans (0,0), (1,0), (1,1).
        let mut board = board_from_colors(config(3, 3, 3), &[0, 0, 1, 1, 0, 1, 2, 2, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut events = Vec::new();

        board.select(CellCoord::new(1, 1), &mut rng, &mut events);

        let removed: Vec<CellId> = events
            .iter()
            .filter_map(|event| match event {
                Event::CellRemoved { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(removed.len(), 3);
        assert!(removed.contains(&CellId::new(0)));
        assert!(removed.contains(&CellId::new(1)));
        assert!(removed.contains(&CellId::new(4)));

        let spawned = events
            .iter()
            .filter(|event| matches!(event, Event::CellSpawned { .. }))
            .count();
        assert_eq!(spawned, 3, "every removed slot must be refilled");

        let view = query::board_view(&board);
        assert_eq!(view.len(), 9, "board must end the pipeline full");
        let mut ids: Vec<CellId> = view.iter().map(|snapshot| snapshot.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 9, "cell identities must stay unique");
    }

    #[test]
    fn selecting_a_singleton_group_is_a_silent_no_op() {
        let mut board = board_from_colors(config(3, 3, 9), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut events = Vec::new();

        board.select(CellCoord::new(1, 1), &mut rng, &mut events);

        assert!(events.is_empty(), "singleton selects must emit nothing");
    }

    #[test]
    fn selecting_out_of_bounds_is_rejected() {
        let mut board = board_from_colors(config(3, 3, 3), &[0, 0, 1, 1, 0, 1, 2, 2, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut events = Vec::new();

        board.select(CellCoord::new(3, 0), &mut rng, &mut events);

        assert_eq!(
            events,
            vec![Event::SelectRejected {
                cell: CellCoord::new(3, 0),
                reason: SelectError::OutOfBounds,
            }]
        );
    }

    #[test]
    fn selecting_an_empty_slot_is_a_silent_no_op() {
        let mut board = board_from_colors(config(2, 2, 4), &[0, 1, 2, 3]);
        board.slots[0] = None;
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut events = Vec::new();

        board.select(CellCoord::new(0, 0), &mut rng, &mut events);

        assert!(events.is_empty());
    }

    #[test]
    fn classification_emits_events_only_for_changed_tiers() {
        let thresholds = TierThresholds::new(4, 6, 8);
        let config = collapse_core::BoardConfig::new(3, 3, 1, thresholds).expect("valid config");
        let mut board = board_from_colors(config, &[0; 9]);

        let mut events = Vec::new();
        board.classify_tiers(&mut events);
        assert_eq!(events.len(), 9, "all nine cells form one TierC group");
        assert!(events
            .iter()
            .all(|event| matches!(event, Event::TierChanged { tier: Tier::TierC, .. })));

        events.clear();
        board.classify_tiers(&mut events);
        assert!(events.is_empty(), "unchanged tiers must not re-announce");
    }

    #[test]
    fn tiers_are_uniform_within_each_group() {
        // A color-0 quad, an L-shaped color-1 quad, and a color-2 singleton.
        let mut board = board_from_colors(
            config(3, 3, 3),
            &[0, 0, 1, 0, 0, 1, 2, 1, 1],
        );
        let mut events = Vec::new();
        board.classify_tiers(&mut events);

        let quad_tier = query::cell_at(&board, CellCoord::new(0, 0))
            .expect("occupied")
            .tier;
        assert_eq!(quad_tier, Tier::TierA, "four connected cells reach TierA");
        let singleton_tier = query::cell_at(&board, CellCoord::new(0, 2))
            .expect("occupied")
            .tier;
        assert_eq!(singleton_tier, Tier::Normal);
        let filler_tier = query::cell_at(&board, CellCoord::new(2, 0))
            .expect("occupied")
            .tier;
        assert_eq!(filler_tier, Tier::TierA, "the color-1 group also counts four");
    }

    #[test]
    fn deadlocked_board_is_repaired_during_select_pipeline() {
        // Removing the color-0 pair leaves plenty of duplicate colors, so the
        // engine must always end the pipeline with a legal move available.
        let mut board = board_from_colors(config(3, 3, 2), &[0, 0, 1, 1, 0, 1, 0, 1, 0]);
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let mut events = Vec::new();

        board.select(CellCoord::new(0, 0), &mut rng, &mut events);

        let width = board.width();
        assert!(
            groups::has_any_match(&mut board.scratch, &board.slots, width),
            "pipeline must leave the board solvable"
        );
        assert!(
            !events.contains(&Event::BoardUnsolvable),
            "duplicate colors always admit a repair"
        );
    }
}
