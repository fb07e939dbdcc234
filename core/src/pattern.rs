//! Influence patterns that map a placed unit onto the tiles it affects.

use serde::{Deserialize, Serialize};

use crate::grid::{StageLayoutMask, TileIndex, TileOffset};

/// Shape of the tile influence projected by a placed unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternCategory {
    /// The unit influences no tiles.
    None,
    /// Anchor and the tile below it.
    Type1,
    /// Anchor and the tile to its right.
    Type2,
    /// Vertical line through the anchor.
    Type3,
    /// Horizontal line through the anchor.
    Type4,
    /// Plus shape centred on the anchor.
    Type5,
    /// Anchor and its four diagonal neighbours.
    Type6,
    /// The two tiles to the right of the anchor, excluding the anchor itself.
    Type7,
    /// Full three by three block centred on the anchor.
    Type8,
}

impl PatternCategory {
    /// Every category that projects influence, in declaration order.
    pub const INFLUENCING: [PatternCategory; 8] = [
        Self::Type1,
        Self::Type2,
        Self::Type3,
        Self::Type4,
        Self::Type5,
        Self::Type6,
        Self::Type7,
        Self::Type8,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::None => 0,
            Self::Type1 => 1,
            Self::Type2 => 2,
            Self::Type3 => 3,
            Self::Type4 => 4,
            Self::Type5 => 5,
            Self::Type6 => 6,
            Self::Type7 => 7,
            Self::Type8 => 8,
        }
    }
}

const fn offset(row: i32, column: i32) -> TileOffset {
    TileOffset::new(row, column)
}

const VERTICAL_PAIR: &[TileOffset] = &[offset(0, 0), offset(1, 0)];
const HORIZONTAL_PAIR: &[TileOffset] = &[offset(0, 0), offset(0, 1)];
const VERTICAL_LINE: &[TileOffset] = &[offset(0, 0), offset(-1, 0), offset(1, 0)];
const HORIZONTAL_LINE: &[TileOffset] = &[offset(0, 0), offset(0, -1), offset(0, 1)];
const PLUS: &[TileOffset] = &[
    offset(0, 0),
    offset(-1, 0),
    offset(1, 0),
    offset(0, -1),
    offset(0, 1),
];
const DIAGONALS: &[TileOffset] = &[
    offset(0, 0),
    offset(-1, -1),
    offset(-1, 1),
    offset(1, -1),
    offset(1, 1),
];
const FORWARD_REACH: &[TileOffset] = &[offset(0, 1), offset(0, 2)];
const BLOCK: &[TileOffset] = &[
    offset(0, 0),
    offset(-1, -1),
    offset(-1, 0),
    offset(-1, 1),
    offset(0, -1),
    offset(0, 1),
    offset(1, -1),
    offset(1, 0),
    offset(1, 1),
];

/// Read-only lookup from pattern category to anchor-relative offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternTable {
    entries: [&'static [TileOffset]; 9],
}

impl PatternTable {
    /// The fixed table of the eight influence shapes.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            entries: [
                &[],
                VERTICAL_PAIR,
                HORIZONTAL_PAIR,
                VERTICAL_LINE,
                HORIZONTAL_LINE,
                PLUS,
                DIAGONALS,
                FORWARD_REACH,
                BLOCK,
            ],
        }
    }

    /// Offsets declared for the category, in declaration order.
    #[must_use]
    pub const fn offsets(&self, category: PatternCategory) -> &'static [TileOffset] {
        self.entries[category.slot()]
    }

    /// Resolves the enabled, in-bounds tiles influenced by a unit at `anchor`.
    ///
    /// Offsets that leave the grid are dropped rather than wrapped onto a
    /// neighbouring row, and tiles disabled by `mask` are skipped. The
    /// sequence follows the category's declared offset order.
    pub fn resolve_tiles<'a>(
        &self,
        anchor: TileIndex,
        category: PatternCategory,
        mask: &'a StageLayoutMask,
    ) -> impl Iterator<Item = TileIndex> + 'a {
        self.offsets(category)
            .iter()
            .filter_map(move |offset| offset.apply(anchor))
            .filter(move |tile| mask.is_enabled(*tile))
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::standard()
    }
}
