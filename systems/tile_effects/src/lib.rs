#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that accumulates overlapping influence patterns into per-tile effects.

use std::sync::Arc;

use formation_core::{
    EffectSlot, Event, PatternCategory, PatternTable, PlacementState, StageLayoutMask, TileIndex,
    TILE_COUNT,
};

/// Stacking state of a single tile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileAccumulation {
    /// Number of pattern instances covering the tile.
    pub stack_count: u32,
    /// Effects landing on the tile, in placement order.
    pub effects: Vec<EffectSlot>,
}

/// Per-tile accumulation for the whole grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileAccumulations {
    tiles: [TileAccumulation; TILE_COUNT],
}

impl TileAccumulations {
    /// Accumulation for a single tile.
    #[must_use]
    pub fn tile(&self, tile: TileIndex) -> &TileAccumulation {
        &self.tiles[tile.as_usize()]
    }

    /// Stack count of a single tile.
    #[must_use]
    pub fn stack_count(&self, tile: TileIndex) -> u32 {
        self.tile(tile).stack_count
    }

    /// Iterates every tile with its accumulation in index order.
    pub fn iter(&self) -> impl Iterator<Item = (TileIndex, &TileAccumulation)> + '_ {
        TileIndex::all().map(move |tile| (tile, self.tile(tile)))
    }

    fn tile_mut(&mut self, tile: TileIndex) -> &mut TileAccumulation {
        &mut self.tiles[tile.as_usize()]
    }
}

/// Recomputes the accumulation for the current placements from scratch.
///
/// Units are visited in tile order. Units with no pattern, and units standing
/// on tiles `mask` disables, contribute nothing.
#[must_use]
pub fn rebuild(
    placements: &PlacementState,
    mask: &StageLayoutMask,
    patterns: &PatternTable,
) -> TileAccumulations {
    let mut accumulations = TileAccumulations::default();

    for (anchor, placed) in placements.iter_enabled(mask) {
        if placed.pattern == PatternCategory::None {
            continue;
        }
        for tile in patterns.resolve_tiles(anchor, placed.pattern, mask) {
            let accumulation = accumulations.tile_mut(tile);
            accumulation.stack_count += 1;
            accumulation.effects.extend(placed.effects.active());
        }
    }

    accumulations
}

/// Tile effect system that rebuilds whenever the placements change.
#[derive(Debug)]
pub struct TileEffects {
    patterns: Arc<PatternTable>,
    current: TileAccumulations,
}

impl TileEffects {
    /// Creates a new tile effect system with an empty accumulation.
    #[must_use]
    pub fn new(patterns: Arc<PatternTable>) -> Self {
        Self {
            patterns,
            current: TileAccumulations::default(),
        }
    }

    /// Consumes world events, rebuilding when any of them changed the placements.
    ///
    /// Returns whether a rebuild happened.
    pub fn handle(
        &mut self,
        events: &[Event],
        placements: &PlacementState,
        mask: &StageLayoutMask,
    ) -> bool {
        if !events.iter().any(Event::changes_placement) {
            return false;
        }
        self.refresh(placements, mask);
        true
    }

    /// Unconditionally rebuilds the accumulation.
    pub fn refresh(&mut self, placements: &PlacementState, mask: &StageLayoutMask) {
        self.current = rebuild(placements, mask, &self.patterns);
        tracing::debug!(
            covered_tiles = self
                .current
                .iter()
                .filter(|(_, tile)| tile.stack_count > 0)
                .count(),
            "tile_effects.rebuilt"
        );
    }

    /// Most recent accumulation.
    #[must_use]
    pub fn current(&self) -> &TileAccumulations {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formation_core::{to_index, EffectId, EffectSlots, PlacedUnit, UnitId};

    #[test]
    fn units_without_pattern_do_not_stack() {
        let mut placements = PlacementState::new();
        let _ = placements.insert(to_index(1, 2), PlacedUnit::inert(UnitId::new(1)));

        let accumulations = rebuild(
            &placements,
            &StageLayoutMask::FULL,
            &PatternTable::standard(),
        );

        assert!(accumulations.iter().all(|(_, tile)| tile.stack_count == 0));
    }

    #[test]
    fn unit_without_effects_still_stacks() {
        let mut placements = PlacementState::new();
        let _ = placements.insert(
            to_index(1, 2),
            PlacedUnit {
                pattern: PatternCategory::Type1,
                ..PlacedUnit::inert(UnitId::new(1))
            },
        );

        let accumulations = rebuild(
            &placements,
            &StageLayoutMask::FULL,
            &PatternTable::standard(),
        );

        assert_eq!(accumulations.stack_count(to_index(1, 2)), 1);
        assert!(accumulations.tile(to_index(1, 2)).effects.is_empty());
    }

    #[test]
    fn handle_ignores_events_that_keep_placements() {
        let mut system = TileEffects::new(Arc::new(PatternTable::standard()));
        let placements = PlacementState::new();

        let rebuilt = system.handle(
            &[Event::DeploymentCommitted { placed: 0 }],
            &placements,
            &StageLayoutMask::FULL,
        );

        assert!(!rebuilt);
    }

    #[test]
    fn effects_concatenate_without_deduplication() {
        let slots = EffectSlots::new([
            EffectSlot::new(EffectId::new(5), 10),
            EffectSlot::UNUSED,
            EffectSlot::UNUSED,
        ]);
        let mut placements = PlacementState::new();
        for (tile, id) in [(to_index(0, 0), 1), (to_index(0, 1), 2)] {
            let _ = placements.insert(
                tile,
                PlacedUnit {
                    pattern: PatternCategory::Type4,
                    effects: slots,
                    ..PlacedUnit::inert(UnitId::new(id))
                },
            );
        }

        let accumulations = rebuild(
            &placements,
            &StageLayoutMask::FULL,
            &PatternTable::standard(),
        );

        let shared = accumulations.tile(to_index(0, 1));
        assert_eq!(shared.stack_count, 2);
        assert_eq!(
            shared.effects,
            vec![
                EffectSlot::new(EffectId::new(5), 10),
                EffectSlot::new(EffectId::new(5), 10),
            ]
        );
    }
}
