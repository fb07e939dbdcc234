#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deployment coordinator that locks in placements and hands them to the battle layer.

use std::sync::Arc;

use formation_core::{
    AllyId, Command, DeployError, EffectSink, InstantiationRequest, Instantiator, PatternTable,
    PlacementState, SessionPhase, StageConfig, StageLayoutMask, SynergyId, SynergyTable,
};
use formation_system_synergy::ApplyReport;

/// Immutable view of the placement session consumed by a deploy action.
#[derive(Clone, Copy, Debug)]
pub struct DeploySnapshot<'a> {
    /// Stage currently installed, if any.
    pub stage: Option<StageConfig>,
    /// Current session phase.
    pub phase: SessionPhase,
    /// Units currently placed.
    pub placements: &'a PlacementState,
    /// Tiles usable for the stage.
    pub mask: &'a StageLayoutMask,
}

/// Summary of a successful deployment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentReport {
    /// Instantiation requests emitted.
    pub requests: u32,
    /// Ally instances created, in tile order.
    pub allies: Vec<AllyId>,
    /// Requests the instantiator refused.
    pub instantiation_failures: u32,
    /// Synergies active at deployment, in table order.
    pub synergies: Vec<SynergyId>,
    /// Outcome of the synergy payload dispatch.
    pub synergy_effects: ApplyReport,
}

/// Validates the deploy cap and dispatches the locked-in formation.
#[derive(Debug)]
pub struct Deployment {
    patterns: Arc<PatternTable>,
    synergies: Arc<SynergyTable>,
}

impl Deployment {
    /// Creates a coordinator over the shared static tables.
    #[must_use]
    pub fn new(patterns: Arc<PatternTable>, synergies: Arc<SynergyTable>) -> Self {
        Self {
            patterns,
            synergies,
        }
    }

    /// Checks whether the session may transition to the committed phase.
    pub fn validate(snapshot: &DeploySnapshot<'_>) -> Result<(), DeployError> {
        let Some(stage) = snapshot.stage else {
            return Err(DeployError::NoStage);
        };
        if snapshot.phase == SessionPhase::Committed {
            return Err(DeployError::AlreadyCommitted);
        }

        let placed = u32::try_from(snapshot.placements.len()).unwrap_or(u32::MAX);
        let max = stage.max_deploy();
        if placed == 0 {
            return Err(DeployError::NoUnits);
        }
        if placed > max {
            return Err(DeployError::OverCapacity { placed, max });
        }
        Ok(())
    }

    /// Handles an explicit deploy action.
    ///
    /// On success a [`Command::CommitDeployment`] is queued for the world, one
    /// instantiation request is issued per unit on an enabled tile, and the
    /// active synergies are applied to the created allies. A rejected action
    /// emits nothing and touches no collaborator.
    pub fn handle(
        &self,
        snapshot: DeploySnapshot<'_>,
        instantiator: &mut impl Instantiator,
        sink: &mut impl EffectSink,
        out: &mut Vec<Command>,
    ) -> Result<DeploymentReport, DeployError> {
        if let Err(error) = Self::validate(&snapshot) {
            tracing::warn!(%error, "deployment.rejected");
            return Err(error);
        }

        out.push(Command::CommitDeployment);

        let accumulations = formation_system_tile_effects::rebuild(
            snapshot.placements,
            snapshot.mask,
            &self.patterns,
        );
        let active = formation_system_synergy::evaluate(
            &self.synergies,
            snapshot.placements,
            snapshot.mask,
        );

        let mut report = DeploymentReport {
            synergies: active.ids(),
            ..DeploymentReport::default()
        };

        for (tile, placed) in snapshot.placements.iter_enabled(snapshot.mask) {
            let request = InstantiationRequest {
                unit: placed.unit,
                tile,
                effects: accumulations.tile(tile).effects.clone(),
            };
            report.requests += 1;
            match instantiator.instantiate(&request) {
                Ok(ally) => report.allies.push(ally),
                Err(error) => {
                    report.instantiation_failures += 1;
                    tracing::warn!(
                        unit = placed.unit.get(),
                        tile = tile.get(),
                        %error,
                        "deployment.instantiate_failed"
                    );
                }
            }
        }

        report.synergy_effects = formation_system_synergy::apply(&active, &report.allies, sink);

        tracing::info!(
            requests = report.requests,
            allies = report.allies.len(),
            synergies = report.synergies.len(),
            "deployment.dispatched"
        );
        Ok(report)
    }
}
