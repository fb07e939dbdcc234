//! Owns the world and systems and routes commands through them.

use std::sync::Arc;

use formation_catalog::Catalog;
use formation_core::{
    Command, DeployError, EffectSink, Event, Instantiator, PatternTable, PlacementState,
    StageConfig, StageLayoutMask,
};
use formation_system_deployment::{DeploySnapshot, Deployment, DeploymentReport};
use formation_system_synergy::{ActiveSynergySet, Synergies};
use formation_system_tile_effects::{TileAccumulations, TileEffects};
use formation_world::{self as world, query, World};

/// Placement session wired to the catalog's static tables.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    tile_effects: TileEffects,
    synergies: Synergies,
    deployment: Deployment,
}

impl Session {
    pub(crate) fn new(catalog: &Catalog) -> Self {
        let patterns = Arc::new(PatternTable::standard());
        let synergies = Arc::new(catalog.synergies().clone());
        Self {
            world: World::new(
                Arc::new(catalog.units().clone()),
                Arc::new(catalog.layouts().clone()),
            ),
            tile_effects: TileEffects::new(Arc::clone(&patterns)),
            synergies: Synergies::new(Arc::clone(&synergies)),
            deployment: Deployment::new(patterns, synergies),
        }
    }

    /// Applies a command and lets the systems observe the resulting events.
    pub(crate) fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        let placements = query::placements(&self.world);
        let mask = query::mask(&self.world);
        let _ = self.tile_effects.handle(&events, placements, mask);
        let _ = self.synergies.handle(&events, placements, mask);
        events
    }

    /// Runs the deployment coordinator and feeds its commands back to the world.
    pub(crate) fn deploy(
        &mut self,
        instantiator: &mut impl Instantiator,
        sink: &mut impl EffectSink,
    ) -> Result<DeploymentReport, DeployError> {
        let mut commands = Vec::new();
        let snapshot = DeploySnapshot {
            stage: query::stage(&self.world),
            phase: query::phase(&self.world),
            placements: query::placements(&self.world),
            mask: query::mask(&self.world),
        };
        let report = self
            .deployment
            .handle(snapshot, instantiator, sink, &mut commands)?;

        for command in commands {
            let _ = self.submit(command);
        }
        Ok(report)
    }

    pub(crate) fn stage(&self) -> Option<StageConfig> {
        query::stage(&self.world)
    }

    pub(crate) fn placements(&self) -> &PlacementState {
        query::placements(&self.world)
    }

    pub(crate) fn mask(&self) -> &StageLayoutMask {
        query::mask(&self.world)
    }

    pub(crate) fn accumulations(&self) -> &TileAccumulations {
        self.tile_effects.current()
    }

    pub(crate) fn active_synergies(&self) -> &ActiveSynergySet {
        self.synergies.active()
    }
}
