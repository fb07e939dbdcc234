#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative placement state for a formation session.

mod placement;

use std::sync::Arc;

use formation_core::{
    Command, Event, PlacementError, PlacementState, SessionPhase, StageConfig, StageLayoutMask,
    StageLayouts, UnitCatalog,
};

/// Represents the authoritative placement-editing state.
#[derive(Debug)]
pub struct World {
    catalog: Arc<UnitCatalog>,
    layouts: Arc<StageLayouts>,
    stage: Option<StageConfig>,
    mask: StageLayoutMask,
    placements: PlacementState,
    phase: SessionPhase,
}

impl World {
    /// Creates an editing session backed by shared static definitions.
    ///
    /// Until a stage is loaded every tile is enabled.
    #[must_use]
    pub fn new(catalog: Arc<UnitCatalog>, layouts: Arc<StageLayouts>) -> Self {
        Self {
            catalog,
            layouts,
            stage: None,
            mask: StageLayoutMask::FULL,
            placements: PlacementState::new(),
            phase: SessionPhase::Editing,
        }
    }

    fn reject(command: Command, reason: PlacementError, out_events: &mut Vec<Event>) {
        tracing::debug!(?command, %reason, "placement.rejected");
        out_events.push(Event::PlacementRejected { command, reason });
    }

    /// Installs a stage and reopens the session for editing.
    ///
    /// Reloading after a commit starts a fresh session: the committed roster
    /// is cleared so it cannot be deployed twice.
    fn load_stage(&mut self, stage: StageConfig, out_events: &mut Vec<Event>) {
        let reopened = self.phase == SessionPhase::Committed;
        self.mask = self.layouts.build_mask(stage.stage_type);
        self.stage = Some(stage);
        self.phase = SessionPhase::Editing;
        tracing::info!(
            stage_type = stage.stage_type.get(),
            enabled_tiles = self.mask.enabled_count(),
            max_deploy = stage.max_deploy(),
            "stage.loaded"
        );
        out_events.push(Event::StageLoaded { stage });

        if reopened && !self.placements.is_empty() {
            self.placements.clear();
            out_events.push(Event::PlacementsCleared);
            return;
        }

        for (tile, placed) in self.placements.retain_enabled(&self.mask) {
            out_events.push(Event::UnitEvicted {
                unit: placed.unit,
                tile,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadStage { stage } => world.load_stage(stage, out_events),
        Command::PlaceUnit { unit, tile } => {
            if let Err(reason) =
                placement::check_place(world.phase, &world.mask, &world.placements, unit, tile)
            {
                World::reject(command, reason, out_events);
                return;
            }
            let placed = world.catalog.resolve(unit);
            let _ = world.placements.insert(tile, placed);
            out_events.push(Event::UnitPlaced { unit, tile });
        }
        Command::MoveUnit { from, to } => {
            if let Err(reason) =
                placement::check_move(world.phase, &world.mask, &world.placements, from, to)
            {
                World::reject(command, reason, out_events);
                return;
            }
            if world.placements.unit_at(to).is_some() {
                world.placements.swap(from, to);
                out_events.push(Event::UnitsSwapped {
                    first: from,
                    second: to,
                });
            } else if let Some(placed) = world.placements.remove(from) {
                let _ = world.placements.insert(to, placed);
                out_events.push(Event::UnitMoved {
                    unit: placed.unit,
                    from,
                    to,
                });
            }
        }
        Command::RemoveUnit { tile } => {
            if let Err(reason) = placement::check_remove(world.phase, &world.placements, tile) {
                World::reject(command, reason, out_events);
                return;
            }
            if let Some(placed) = world.placements.remove(tile) {
                out_events.push(Event::UnitRemoved {
                    unit: placed.unit,
                    tile,
                });
            }
        }
        Command::ClearPlacements => {
            if let Err(reason) = placement::check_editing(world.phase) {
                World::reject(command, reason, out_events);
                return;
            }
            world.placements.clear();
            out_events.push(Event::PlacementsCleared);
        }
        Command::CommitDeployment => {
            if let Err(reason) =
                placement::check_commit(world.phase, world.stage, &world.placements)
            {
                tracing::debug!(%reason, "deployment.commit_rejected");
                out_events.push(Event::DeploymentRejected { reason });
                return;
            }
            world.phase = SessionPhase::Committed;
            let placed = u32::try_from(world.placements.len()).unwrap_or(u32::MAX);
            tracing::info!(placed, "deployment.committed");
            out_events.push(Event::DeploymentCommitted { placed });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use formation_core::{PlacementState, SessionPhase, StageConfig, StageLayoutMask};

    use super::World;

    /// Stage currently installed, if any.
    #[must_use]
    pub fn stage(world: &World) -> Option<StageConfig> {
        world.stage
    }

    /// Tiles usable for the current stage.
    #[must_use]
    pub fn mask(world: &World) -> &StageLayoutMask {
        &world.mask
    }

    /// Provides read-only access to the placement state.
    #[must_use]
    pub fn placements(world: &World) -> &PlacementState {
        &world.placements
    }

    /// Current lifecycle phase of the session.
    #[must_use]
    pub fn phase(world: &World) -> SessionPhase {
        world.phase
    }

    /// Number of units currently placed.
    #[must_use]
    pub fn placed_count(world: &World) -> u32 {
        u32::try_from(world.placements.len()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formation_core::{
        to_index, CategoryType, DeployError, PatternCategory, StageType, TileIndex, UnitId,
        UnitProfile,
    };

    fn world() -> World {
        let mut catalog = UnitCatalog::new();
        for id in 1..=3 {
            let _ = catalog.insert_unit(UnitProfile {
                unit: UnitId::new(id),
                category: CategoryType::Dance,
                pattern: PatternCategory::Type1,
                skill: None,
            });
        }
        let mut layouts = StageLayouts::new();
        let _ = layouts.insert(
            StageType::new(7),
            StageLayoutMask::from_tiles(TileIndex::all().filter(|tile| tile.row() == 1)),
        );
        World::new(Arc::new(catalog), Arc::new(layouts))
    }

    fn place(world: &mut World, unit: u32, tile: TileIndex) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceUnit {
                unit: UnitId::new(unit),
                tile,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn placing_resolves_catalog_profile() {
        let mut world = world();
        let events = place(&mut world, 1, to_index(0, 0));

        assert_eq!(
            events,
            vec![Event::UnitPlaced {
                unit: UnitId::new(1),
                tile: to_index(0, 0),
            }]
        );
        let placed = query::placements(&world)
            .unit_at(to_index(0, 0))
            .copied()
            .expect("unit placed");
        assert_eq!(placed.category, CategoryType::Dance);
        assert_eq!(placed.pattern, PatternCategory::Type1);
    }

    #[test]
    fn loading_stage_evicts_units_on_disabled_tiles() {
        let mut world = world();
        let _ = place(&mut world, 1, to_index(0, 0));
        let _ = place(&mut world, 2, to_index(1, 3));
        let mut events = Vec::new();
        let stage = StageConfig::new(StageType::new(7), 4);

        apply(&mut world, Command::LoadStage { stage }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::StageLoaded { stage },
                Event::UnitEvicted {
                    unit: UnitId::new(1),
                    tile: to_index(0, 0),
                },
            ]
        );
        assert_eq!(query::placed_count(&world), 1);
        assert!(!query::mask(&world).is_enabled(to_index(0, 0)));
    }

    #[test]
    fn dragging_onto_occupied_tile_swaps_units() {
        let mut world = world();
        let _ = place(&mut world, 1, to_index(0, 0));
        let _ = place(&mut world, 2, to_index(0, 1));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                from: to_index(0, 0),
                to: to_index(0, 1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitsSwapped {
                first: to_index(0, 0),
                second: to_index(0, 1),
            }]
        );
        let placements = query::placements(&world);
        assert_eq!(placements.tile_of(UnitId::new(1)), Some(to_index(0, 1)));
        assert_eq!(placements.tile_of(UnitId::new(2)), Some(to_index(0, 0)));
    }

    #[test]
    fn dragging_onto_empty_tile_moves_unit() {
        let mut world = world();
        let _ = place(&mut world, 3, to_index(2, 2));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                from: to_index(2, 2),
                to: to_index(2, 4),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitMoved {
                unit: UnitId::new(3),
                from: to_index(2, 2),
                to: to_index(2, 4),
            }]
        );
    }

    fn load(world: &mut World, stage: StageConfig) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::LoadStage { stage }, &mut events);
        events
    }

    fn commit(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::CommitDeployment, &mut events);
        events
    }

    #[test]
    fn commit_locks_placements() {
        let mut world = world();
        let _ = load(&mut world, StageConfig::new(StageType::new(1), 4));
        let _ = place(&mut world, 1, to_index(0, 0));
        assert_eq!(
            commit(&mut world),
            vec![Event::DeploymentCommitted { placed: 1 }]
        );
        assert_eq!(query::phase(&world), SessionPhase::Committed);

        let events = place(&mut world, 2, to_index(0, 1));
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                command: Command::PlaceUnit {
                    unit: UnitId::new(2),
                    tile: to_index(0, 1),
                },
                reason: PlacementError::SessionCommitted,
            }]
        );
        assert_eq!(query::placed_count(&world), 1);
    }

    #[test]
    fn commit_without_units_is_rejected() {
        let mut world = world();
        let _ = load(&mut world, StageConfig::new(StageType::new(1), 4));

        assert_eq!(
            commit(&mut world),
            vec![Event::DeploymentRejected {
                reason: DeployError::NoUnits,
            }]
        );
        assert_eq!(query::phase(&world), SessionPhase::Editing);
    }

    #[test]
    fn commit_over_the_cap_is_rejected() {
        let mut world = world();
        let _ = load(
            &mut world,
            StageConfig::new(StageType::new(1), 4).with_max_deploy(1),
        );
        for (unit, column) in [(1, 0), (2, 1), (3, 2)] {
            let _ = place(&mut world, unit, to_index(0, column));
        }

        assert_eq!(
            commit(&mut world),
            vec![Event::DeploymentRejected {
                reason: DeployError::OverCapacity { placed: 3, max: 1 },
            }]
        );
        assert_eq!(query::phase(&world), SessionPhase::Editing);
        assert_eq!(query::placed_count(&world), 3);
    }

    #[test]
    fn commit_without_stage_is_rejected() {
        let mut world = world();
        let _ = place(&mut world, 1, to_index(0, 0));

        assert_eq!(
            commit(&mut world),
            vec![Event::DeploymentRejected {
                reason: DeployError::NoStage,
            }]
        );
        assert_eq!(query::phase(&world), SessionPhase::Editing);
    }

    #[test]
    fn reloading_after_commit_starts_an_empty_session() {
        let mut world = world();
        let stage = StageConfig::new(StageType::new(1), 4);
        let _ = load(&mut world, stage);
        let _ = place(&mut world, 1, to_index(1, 0));
        let _ = place(&mut world, 2, to_index(1, 1));
        let _ = commit(&mut world);

        assert_eq!(
            load(&mut world, stage),
            vec![Event::StageLoaded { stage }, Event::PlacementsCleared]
        );
        assert_eq!(query::phase(&world), SessionPhase::Editing);
        assert_eq!(query::placed_count(&world), 0);
        assert_eq!(
            commit(&mut world),
            vec![Event::DeploymentRejected {
                reason: DeployError::NoUnits,
            }]
        );
    }

    #[test]
    fn removing_from_empty_tile_is_rejected() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RemoveUnit {
                tile: to_index(1, 1),
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::EmptyTile,
                ..
            }]
        ));
    }
}
