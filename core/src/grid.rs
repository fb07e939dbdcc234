//! Fixed placement grid topology and per-stage tile masking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of tile columns laid out on the placement grid.
pub const GRID_COLUMNS: usize = 5;
/// Number of tile rows laid out on the placement grid.
pub const GRID_ROWS: usize = 3;
/// Total number of tiles on the placement grid.
pub const TILE_COUNT: usize = GRID_COLUMNS * GRID_ROWS;

/// Row-major index of a single grid tile, always within `0..TILE_COUNT`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct TileIndex(u8);

impl TileIndex {
    /// Creates a tile index.
    ///
    /// # Panics
    ///
    /// Panics when `value` does not address a tile on the grid. Out of range
    /// indices are programming errors; use [`TileIndex::try_new`] for
    /// untrusted input.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        assert!((value as usize) < TILE_COUNT, "tile index out of bounds");
        Self(value)
    }

    /// Creates a tile index when `value` lies on the grid.
    #[must_use]
    pub const fn try_new(value: u8) -> Option<Self> {
        if (value as usize) < TILE_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Index usable for slicing per-tile buffers.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Zero-based row containing the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        (self.0 as usize / GRID_COLUMNS) as i32
    }

    /// Zero-based column containing the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        (self.0 as usize % GRID_COLUMNS) as i32
    }

    /// Iterates every tile of the grid in index order.
    pub fn all() -> impl Iterator<Item = TileIndex> {
        (0..TILE_COUNT as u8).map(TileIndex)
    }
}

impl TryFrom<u8> for TileIndex {
    type Error = TileIndexOutOfBounds;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_new(value).ok_or(TileIndexOutOfBounds(value))
    }
}

impl From<TileIndex> for u8 {
    fn from(index: TileIndex) -> Self {
        index.0
    }
}

/// Error produced when converting a raw value that does not address a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("tile index {0} lies outside the 15-tile grid")]
pub struct TileIndexOutOfBounds(
    /// Raw value that failed conversion.
    pub u8,
);

/// Reports whether the signed coordinate lies on the grid.
#[must_use]
pub const fn is_in_bounds(row: i32, column: i32) -> bool {
    row >= 0 && (row as usize) < GRID_ROWS && column >= 0 && (column as usize) < GRID_COLUMNS
}

/// Converts an in-bounds coordinate into its row-major tile index.
///
/// Never clamps or wraps. Callers check [`is_in_bounds`] first.
///
/// # Panics
///
/// Panics when the coordinate lies outside the grid.
#[must_use]
pub const fn to_index(row: i32, column: i32) -> TileIndex {
    assert!(is_in_bounds(row, column), "coordinate outside the grid");
    TileIndex::new((row as usize * GRID_COLUMNS + column as usize) as u8)
}

/// Relative `(row, column)` displacement from an anchor tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileOffset {
    row: i32,
    column: i32,
}

impl TileOffset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Row displacement.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Column displacement.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Applies the offset to `anchor`, yielding the tile it lands on if any.
    #[must_use]
    pub const fn apply(&self, anchor: TileIndex) -> Option<TileIndex> {
        let row = anchor.row() + self.row;
        let column = anchor.column() + self.column;
        if is_in_bounds(row, column) {
            Some(to_index(row, column))
        } else {
            None
        }
    }
}

/// Identifier of a stage layout category.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StageType(u32);

impl StageType {
    /// Creates a new stage type identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the stage type.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Tiles usable during a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageLayoutMask {
    enabled: [bool; TILE_COUNT],
}

impl StageLayoutMask {
    /// Mask enabling every tile.
    pub const FULL: Self = Self {
        enabled: [true; TILE_COUNT],
    };

    /// Creates a mask from explicit per-tile flags.
    #[must_use]
    pub const fn from_flags(enabled: [bool; TILE_COUNT]) -> Self {
        Self { enabled }
    }

    /// Creates a mask that enables exactly the listed tiles.
    #[must_use]
    pub fn from_tiles(tiles: impl IntoIterator<Item = TileIndex>) -> Self {
        let mut enabled = [false; TILE_COUNT];
        for tile in tiles {
            enabled[tile.as_usize()] = true;
        }
        Self { enabled }
    }

    /// Reports whether units may be placed on the tile.
    #[must_use]
    pub const fn is_enabled(&self, tile: TileIndex) -> bool {
        self.enabled[tile.as_usize()]
    }

    /// Iterates the enabled tiles in index order.
    pub fn enabled_tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        TileIndex::all().filter(|tile| self.is_enabled(*tile))
    }

    /// Number of enabled tiles.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.enabled.iter().filter(|flag| **flag).count()
    }
}

impl Default for StageLayoutMask {
    fn default() -> Self {
        Self::FULL
    }
}

/// Registry of per-stage-type tile masks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageLayouts {
    masks: BTreeMap<StageType, StageLayoutMask>,
}

impl StageLayouts {
    /// Creates an empty registry; every stage type resolves to the full mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mask for a stage type, returning any replaced mask.
    pub fn insert(
        &mut self,
        stage_type: StageType,
        mask: StageLayoutMask,
    ) -> Option<StageLayoutMask> {
        self.masks.insert(stage_type, mask)
    }

    /// Number of registered stage types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Reports whether no stage type carries a mask.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Resolves the mask for `stage_type`.
    ///
    /// Unmapped stage types enable every tile.
    #[must_use]
    pub fn build_mask(&self, stage_type: StageType) -> StageLayoutMask {
        match self.masks.get(&stage_type) {
            Some(mask) => *mask,
            None => {
                tracing::debug!(
                    stage_type = stage_type.get(),
                    "stage_layout.fallback=full"
                );
                StageLayoutMask::FULL
            }
        }
    }
}
