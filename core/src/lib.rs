#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the formation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative placement world, and pure systems. Adapters submit
//! [`Command`] values describing desired placement mutations, the world
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values so systems can recompute tile effects and synergies
//! deterministically. Deployment hands resolved data to the battle layer
//! through the [`Instantiator`] and [`EffectSink`] collaborator traits.

pub mod grid;
pub mod pattern;
pub mod synergy;
pub mod unit;

use serde::{Deserialize, Serialize};

pub use grid::{
    is_in_bounds, to_index, StageLayoutMask, StageLayouts, StageType, TileIndex,
    TileIndexOutOfBounds, TileOffset, GRID_COLUMNS, GRID_ROWS, TILE_COUNT,
};
pub use pattern::{PatternCategory, PatternTable};
pub use synergy::{SynergyDefinition, SynergyId, SynergyTable, TargetScope, REQUIREMENT_SLOTS};
pub use unit::{
    CategoryType, EffectId, EffectSlot, EffectSlots, PlacedUnit, PlacementState, SkillId,
    SkillProfile, UnitCatalog, UnitId, UnitProfile, EFFECT_SLOTS,
};

/// Lifecycle of a placement session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Placements are mutable and recomputed on every change.
    Editing,
    /// Placements are locked in and control has passed to the battle layer.
    Committed,
}

/// Stage parameters consumed when a stage is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageConfig {
    /// Layout category selecting the usable tiles.
    pub stage_type: StageType,
    /// Squad size dispatched for the stage.
    pub member_count: u32,
    /// Explicit cap on deployed units, overriding `member_count` when set.
    pub max_deploy_count: Option<u32>,
}

impl StageConfig {
    /// Creates a stage configuration whose deploy cap equals the member count.
    #[must_use]
    pub const fn new(stage_type: StageType, member_count: u32) -> Self {
        Self {
            stage_type,
            member_count,
            max_deploy_count: None,
        }
    }

    /// Overrides the deploy cap.
    #[must_use]
    pub const fn with_max_deploy(mut self, max_deploy_count: u32) -> Self {
        self.max_deploy_count = Some(max_deploy_count);
        self
    }

    /// Maximum number of units that may be deployed.
    #[must_use]
    pub const fn max_deploy(&self) -> u32 {
        match self.max_deploy_count {
            Some(count) => count,
            None => self.member_count,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Installs a stage, deriving its tile mask and deploy cap.
    LoadStage {
        /// Stage parameters to install.
        stage: StageConfig,
    },
    /// Requests placement of a unit on an empty tile.
    PlaceUnit {
        /// Unit to place.
        unit: UnitId,
        /// Destination tile.
        tile: TileIndex,
    },
    /// Requests that a unit be dragged between tiles, swapping with any occupant.
    MoveUnit {
        /// Tile currently holding the unit.
        from: TileIndex,
        /// Destination tile.
        to: TileIndex,
    },
    /// Requests removal of the unit on a tile.
    RemoveUnit {
        /// Tile whose unit should be removed.
        tile: TileIndex,
    },
    /// Requests removal of every placed unit.
    ClearPlacements,
    /// Locks in the current placements and ends the editing session.
    CommitDeployment,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a stage was installed.
    StageLoaded {
        /// Stage parameters now in effect.
        stage: StageConfig,
    },
    /// Confirms that a unit was placed.
    UnitPlaced {
        /// Unit that was placed.
        unit: UnitId,
        /// Tile now holding the unit.
        tile: TileIndex,
    },
    /// Confirms that a unit moved onto an empty tile.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Tile the unit left.
        from: TileIndex,
        /// Tile the unit occupies.
        to: TileIndex,
    },
    /// Confirms that two units exchanged tiles.
    UnitsSwapped {
        /// Tile the drag started from.
        first: TileIndex,
        /// Tile the drag ended on.
        second: TileIndex,
    },
    /// Confirms that a unit was removed.
    UnitRemoved {
        /// Unit that was removed.
        unit: UnitId,
        /// Tile the unit occupied.
        tile: TileIndex,
    },
    /// Reports that a unit was cleared because its tile became disabled.
    UnitEvicted {
        /// Unit that was cleared.
        unit: UnitId,
        /// Disabled tile the unit occupied.
        tile: TileIndex,
    },
    /// Confirms that every placement was removed.
    PlacementsCleared,
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Command that was rejected.
        command: Command,
        /// Specific reason the request failed.
        reason: PlacementError,
    },
    /// Reports that a commit request was refused; nothing changed.
    DeploymentRejected {
        /// Specific reason the commit failed.
        reason: DeployError,
    },
    /// Announces that the session entered the committed phase.
    DeploymentCommitted {
        /// Number of units locked in.
        placed: u32,
    },
}

impl Event {
    /// Reports whether the event alters the placement state or tile mask.
    #[must_use]
    pub const fn changes_placement(&self) -> bool {
        matches!(
            self,
            Self::StageLoaded { .. }
                | Self::UnitPlaced { .. }
                | Self::UnitMoved { .. }
                | Self::UnitsSwapped { .. }
                | Self::UnitRemoved { .. }
                | Self::UnitEvicted { .. }
                | Self::PlacementsCleared
        )
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The session was committed, so placements are locked.
    #[error("placements are locked after deployment")]
    SessionCommitted,
    /// The tile is disabled for the current stage.
    #[error("tile is disabled for this stage")]
    TileDisabled,
    /// The destination tile already holds a unit.
    #[error("tile already holds a unit")]
    Occupied,
    /// The source tile holds no unit.
    #[error("tile holds no unit")]
    EmptyTile,
    /// The unit already occupies another tile.
    #[error("unit is already placed")]
    UnitAlreadyPlaced,
    /// Source and destination tiles are identical.
    #[error("source and destination tiles are identical")]
    SameTile,
}

/// Reasons a deploy action may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum DeployError {
    /// No stage has been loaded.
    #[error("no stage is loaded")]
    NoStage,
    /// The session was already committed.
    #[error("deployment was already committed")]
    AlreadyCommitted,
    /// No unit is placed.
    #[error("no units are placed")]
    NoUnits,
    /// More units are placed than the stage allows.
    #[error("{placed} units placed but the stage allows {max}")]
    OverCapacity {
        /// Units currently placed.
        placed: u32,
        /// Stage deploy cap.
        max: u32,
    },
}

/// Handle to a battle unit created from a deployment request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllyId(u32);

impl AllyId {
    /// Creates a new ally identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Request to create a battle unit for a deployed placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstantiationRequest {
    /// Unit to instantiate.
    pub unit: UnitId,
    /// Tile the unit was deployed on.
    pub tile: TileIndex,
    /// Tile effects accumulated on the unit's tile, in accumulation order.
    pub effects: Vec<EffectSlot>,
}

/// Lifetime of an effect applied to an ally instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectDuration {
    /// The effect lasts for the whole battle.
    Battle,
}

/// Failure reported by a battle-layer collaborator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The targeted ally instance does not exist.
    #[error("ally {0:?} does not exist")]
    UnknownAlly(AllyId),
    /// The collaborator refused the request.
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
}

/// Battle-layer collaborator that creates ally instances.
pub trait Instantiator {
    /// Creates the battle unit described by `request`.
    fn instantiate(&mut self, request: &InstantiationRequest) -> Result<AllyId, DispatchError>;
}

/// Battle-layer collaborator that applies effects.
pub trait EffectSink {
    /// Applies a timed effect to a single ally instance.
    fn apply_timed(
        &mut self,
        ally: AllyId,
        effect: EffectSlot,
        duration: EffectDuration,
    ) -> Result<(), DispatchError>;

    /// Hands a synergy payload to systems outside the ally roster.
    fn dispatch_global(
        &mut self,
        synergy: SynergyId,
        effect: EffectSlot,
    ) -> Result<(), DispatchError>;
}
