#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Collapse board engine.
//!
//! This crate defines the message surface that connects the host (rendering
//! and input) to the authoritative board. Hosts submit [`Command`] values
//! describing desired mutations, the board executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing every
//! per-cell change so the host can update visuals without the engine knowing
//! anything about rendering.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default board width matching the reference settings.
pub const DEFAULT_WIDTH: u32 = 10;
/// Default board height matching the reference settings.
pub const DEFAULT_HEIGHT: u32 = 10;
/// Default palette size matching the reference settings.
pub const DEFAULT_COLOR_COUNT: u8 = 6;
/// Default tier thresholds matching the reference settings.
pub const DEFAULT_THRESHOLDS: TierThresholds = TierThresholds::new(4, 6, 8);

/// Commands that express all permissible board mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the current session with a freshly populated board.
    ConfigureBoard {
        /// Validated parameters describing the new board.
        config: BoardConfig,
    },
    /// Requests the post-click pipeline for the provided cell coordinate.
    SelectCell {
        /// Coordinate translated from a pointer or selection event.
        cell: CellCoord,
    },
}

/// Events broadcast by the board after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new board session started with the given dimensions.
    BoardConfigured {
        /// Number of columns on the new board.
        width: u32,
        /// Number of rows on the new board.
        height: u32,
    },
    /// Confirms that a freshly created cell was placed into an empty slot.
    CellSpawned {
        /// Identifier assigned to the new cell.
        id: CellId,
        /// Palette color drawn for the cell.
        color: ColorId,
        /// Visual tier the cell starts with.
        tier: Tier,
        /// Slot the cell occupies after spawning.
        cell: CellCoord,
    },
    /// Confirms that a matched cell was removed from the board.
    CellRemoved {
        /// Identifier of the removed cell.
        id: CellId,
        /// Slot the cell occupied before removal.
        cell: CellCoord,
    },
    /// Confirms that a surviving cell relocated to a different slot.
    CellMoved {
        /// Identifier of the cell that moved.
        id: CellId,
        /// Slot the cell occupied before moving.
        from: CellCoord,
        /// Slot the cell occupies after moving.
        to: CellCoord,
    },
    /// Reports that a cell's visual tier changed during reclassification.
    TierChanged {
        /// Identifier of the reclassified cell.
        id: CellId,
        /// Tier the cell carries after reclassification.
        tier: Tier,
    },
    /// Announces that a deadlocked board was permuted to restore a move.
    BoardShuffled {
        /// Zero-based shuffle round within the current resolution attempt.
        round: u32,
    },
    /// Reports that a select request was rejected by the board.
    SelectRejected {
        /// Coordinate provided in the select request.
        cell: CellCoord,
        /// Specific reason the request failed.
        reason: SelectError,
    },
    /// Terminal state: no repair can produce a legal move on this board.
    ///
    /// Only reachable when every cell carries a distinct color, which requires
    /// a palette at least as large as the board. The host decides policy,
    /// typically regenerating with a different configuration.
    BoardUnsolvable,
}

/// Unique identifier assigned to a cell for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(u64);

impl CellId {
    /// Creates a new cell identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Palette index identifying a cell's color.
///
/// Colors are assigned once at creation and never mutate afterwards; only a
/// cell's tier and position change during a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColorId(u8);

impl ColorId {
    /// Creates a new palette index wrapper.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the underlying palette index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Discrete visual classification derived from a connected group's size.
///
/// Every cell in one connected group shares one tier. The ordering of the
/// variants matches the ordering of the thresholds that produce them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Group size below the first threshold.
    Normal,
    /// Group size at or above the first threshold.
    TierA,
    /// Group size at or above the second threshold.
    TierB,
    /// Group size at or above the third threshold.
    TierC,
}

/// Location of a single board slot expressed as zero-based coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new board coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the slot.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the slot.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Ascending group-size thresholds that map group cardinality to a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierThresholds {
    a: u32,
    b: u32,
    c: u32,
}

impl TierThresholds {
    /// Creates a new threshold triple without validating it.
    ///
    /// Validation happens in [`BoardConfig::new`], which rejects triples that
    /// are not strictly ascending.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    /// First threshold: smallest group size classified as [`Tier::TierA`].
    #[must_use]
    pub const fn a(&self) -> u32 {
        self.a
    }

    /// Second threshold: smallest group size classified as [`Tier::TierB`].
    #[must_use]
    pub const fn b(&self) -> u32 {
        self.b
    }

    /// Third threshold: smallest group size classified as [`Tier::TierC`].
    #[must_use]
    pub const fn c(&self) -> u32 {
        self.c
    }

    /// Classifies a connected group's cardinality into a tier.
    #[must_use]
    pub const fn tier_for(&self, group_size: u32) -> Tier {
        if group_size < self.a {
            Tier::Normal
        } else if group_size < self.b {
            Tier::TierA
        } else if group_size < self.c {
            Tier::TierB
        } else {
            Tier::TierC
        }
    }
}

/// Immutable per-board parameters validated at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardConfig {
    width: u32,
    height: u32,
    color_count: u8,
    thresholds: TierThresholds,
}

impl BoardConfig {
    /// Creates a validated board configuration.
    ///
    /// Fails fast when no board could be built from the parameters: zero
    /// dimensions, an empty palette, or thresholds that are not strictly
    /// ascending.
    pub fn new(
        width: u32,
        height: u32,
        color_count: u8,
        thresholds: TierThresholds,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if color_count == 0 {
            return Err(ConfigError::NoColors);
        }
        if thresholds.a() >= thresholds.b() || thresholds.b() >= thresholds.c() {
            return Err(ConfigError::ThresholdsNotAscending {
                a: thresholds.a(),
                b: thresholds.b(),
                c: thresholds.c(),
            });
        }
        Ok(Self {
            width,
            height,
            color_count,
            thresholds,
        })
    }

    /// Number of columns on the board.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows on the board.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of distinct palette colors cells may be created with.
    #[must_use]
    pub const fn color_count(&self) -> u8 {
        self.color_count
    }

    /// Group-size thresholds used for tier classification.
    #[must_use]
    pub const fn thresholds(&self) -> TierThresholds {
        self.thresholds
    }

    /// Total number of slots on the board.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reports whether the provided coordinate lies within the board.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            color_count: DEFAULT_COLOR_COUNT,
            thresholds: DEFAULT_THRESHOLDS,
        }
    }
}

/// Reasons a board configuration is rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// One or both board dimensions are zero.
    #[error("board dimensions must be at least 1x1, got {width}x{height}")]
    InvalidDimensions {
        /// Width provided in the rejected configuration.
        width: u32,
        /// Height provided in the rejected configuration.
        height: u32,
    },
    /// The palette contains no colors to draw from.
    #[error("palette must contain at least one color")]
    NoColors,
    /// The tier thresholds are not strictly ascending.
    #[error("tier thresholds must be strictly ascending, got ({a}, {b}, {c})")]
    ThresholdsNotAscending {
        /// First threshold provided in the rejected configuration.
        a: u32,
        /// Second threshold provided in the rejected configuration.
        b: u32,
        /// Third threshold provided in the rejected configuration.
        c: u32,
    },
}

/// Reasons a select request may be rejected by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SelectError {
    /// The requested coordinate lies outside the board bounds.
    #[error("selected cell lies outside the board")]
    OutOfBounds,
}

/// Immutable representation of a single cell's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Unique identifier assigned to the cell.
    pub id: CellId,
    /// Palette color the cell was created with.
    pub color: ColorId,
    /// Visual tier the cell currently carries.
    pub tier: Tier,
    /// Slot the cell currently occupies.
    pub cell: CellCoord,
}

/// Read-only snapshot describing all cells on the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardView {
    snapshots: Vec<CellSnapshot>,
}

impl BoardView {
    /// Creates a new board view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CellSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured cell snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CellSnapshot> {
        self.snapshots.iter()
    }

    /// Number of cells captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellSnapshot> {
        self.snapshots
    }
}
