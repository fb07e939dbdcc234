//! Validation rules for placement-editing commands.

use formation_core::{
    DeployError, PlacementError, PlacementState, SessionPhase, StageConfig, StageLayoutMask,
    TileIndex, UnitId,
};

/// Checks that placing `unit` on `tile` is permitted.
pub(crate) fn check_place(
    phase: SessionPhase,
    mask: &StageLayoutMask,
    placements: &PlacementState,
    unit: UnitId,
    tile: TileIndex,
) -> Result<(), PlacementError> {
    check_editing(phase)?;
    check_enabled(mask, tile)?;
    if placements.unit_at(tile).is_some() {
        return Err(PlacementError::Occupied);
    }
    if placements.tile_of(unit).is_some() {
        return Err(PlacementError::UnitAlreadyPlaced);
    }
    Ok(())
}

/// Checks that dragging the unit on `from` onto `to` is permitted.
pub(crate) fn check_move(
    phase: SessionPhase,
    mask: &StageLayoutMask,
    placements: &PlacementState,
    from: TileIndex,
    to: TileIndex,
) -> Result<(), PlacementError> {
    check_editing(phase)?;
    if from == to {
        return Err(PlacementError::SameTile);
    }
    check_enabled(mask, to)?;
    if placements.unit_at(from).is_none() {
        return Err(PlacementError::EmptyTile);
    }
    Ok(())
}

/// Checks that the unit on `tile` may be removed.
pub(crate) fn check_remove(
    phase: SessionPhase,
    placements: &PlacementState,
    tile: TileIndex,
) -> Result<(), PlacementError> {
    check_editing(phase)?;
    if placements.unit_at(tile).is_none() {
        return Err(PlacementError::EmptyTile);
    }
    Ok(())
}

/// Checks that the session may move from editing to committed.
///
/// The placed count must satisfy `0 < placed <= stage.max_deploy()`.
pub(crate) fn check_commit(
    phase: SessionPhase,
    stage: Option<StageConfig>,
    placements: &PlacementState,
) -> Result<(), DeployError> {
    let Some(stage) = stage else {
        return Err(DeployError::NoStage);
    };
    if phase == SessionPhase::Committed {
        return Err(DeployError::AlreadyCommitted);
    }

    let placed = u32::try_from(placements.len()).unwrap_or(u32::MAX);
    let max = stage.max_deploy();
    if placed == 0 {
        return Err(DeployError::NoUnits);
    }
    if placed > max {
        return Err(DeployError::OverCapacity { placed, max });
    }
    Ok(())
}

pub(crate) fn check_editing(phase: SessionPhase) -> Result<(), PlacementError> {
    match phase {
        SessionPhase::Editing => Ok(()),
        SessionPhase::Committed => Err(PlacementError::SessionCommitted),
    }
}

fn check_enabled(mask: &StageLayoutMask, tile: TileIndex) -> Result<(), PlacementError> {
    if mask.is_enabled(tile) {
        Ok(())
    } else {
        Err(PlacementError::TileDisabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formation_core::{to_index, PlacedUnit};

    #[test]
    fn placing_twice_is_rejected() {
        let mut placements = PlacementState::new();
        let _ = placements.insert(to_index(0, 0), PlacedUnit::inert(UnitId::new(1)));

        assert_eq!(
            check_place(
                SessionPhase::Editing,
                &StageLayoutMask::FULL,
                &placements,
                UnitId::new(1),
                to_index(0, 1),
            ),
            Err(PlacementError::UnitAlreadyPlaced)
        );
    }

    #[test]
    fn committed_session_rejects_everything() {
        let placements = PlacementState::new();
        assert_eq!(
            check_remove(SessionPhase::Committed, &placements, to_index(0, 0)),
            Err(PlacementError::SessionCommitted)
        );
    }

    #[test]
    fn commit_requires_units_within_the_cap() {
        let stage = StageConfig::new(formation_core::StageType::new(1), 4).with_max_deploy(1);
        let mut placements = PlacementState::new();

        assert_eq!(
            check_commit(SessionPhase::Editing, None, &placements),
            Err(DeployError::NoStage)
        );
        assert_eq!(
            check_commit(SessionPhase::Editing, Some(stage), &placements),
            Err(DeployError::NoUnits)
        );

        let _ = placements.insert(to_index(0, 0), PlacedUnit::inert(UnitId::new(1)));
        assert_eq!(
            check_commit(SessionPhase::Editing, Some(stage), &placements),
            Ok(())
        );
        assert_eq!(
            check_commit(SessionPhase::Committed, Some(stage), &placements),
            Err(DeployError::AlreadyCommitted)
        );

        let _ = placements.insert(to_index(0, 1), PlacedUnit::inert(UnitId::new(2)));
        assert_eq!(
            check_commit(SessionPhase::Editing, Some(stage), &placements),
            Err(DeployError::OverCapacity { placed: 2, max: 1 })
        );
    }

    #[test]
    fn moving_onto_disabled_tile_is_rejected() {
        let mut placements = PlacementState::new();
        let _ = placements.insert(to_index(0, 0), PlacedUnit::inert(UnitId::new(1)));
        let mask = StageLayoutMask::from_tiles([to_index(0, 0)]);

        assert_eq!(
            check_move(
                SessionPhase::Editing,
                &mask,
                &placements,
                to_index(0, 0),
                to_index(0, 1),
            ),
            Err(PlacementError::TileDisabled)
        );
    }
}
