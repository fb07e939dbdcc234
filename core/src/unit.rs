//! Unit definitions, effect payloads and the placement state they populate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    grid::{StageLayoutMask, TileIndex, TILE_COUNT},
    pattern::PatternCategory,
};

/// Maximum number of effect slots carried by a skill or synergy payload.
pub const EFFECT_SLOTS: usize = 3;

/// Identifier of a unit definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier.
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

/// Identifier of a skill definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(u32);

impl SkillId {
    /// Creates a new skill identifier.
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

/// Identifier of an effect understood by the battle layer. Zero marks an unused slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(u32);

impl EffectId {
    /// Placeholder identifier for an unused slot.
    pub const UNUSED: Self = Self(0);

    /// Creates a new effect identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether the identifier marks an unused slot.
    #[must_use]
    pub const fn is_unused(&self) -> bool {
        self.0 == 0
    }
}

/// A single `(effect, magnitude)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectSlot {
    /// Effect applied by the slot.
    pub effect: EffectId,
    /// Strength of the effect in the effect's native units.
    pub magnitude: i32,
}

impl EffectSlot {
    /// An unused slot.
    pub const UNUSED: Self = Self {
        effect: EffectId::UNUSED,
        magnitude: 0,
    };

    /// Creates a new effect slot.
    #[must_use]
    pub const fn new(effect: EffectId, magnitude: i32) -> Self {
        Self { effect, magnitude }
    }
}

/// Fixed group of up to three effect slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectSlots([EffectSlot; EFFECT_SLOTS]);

impl EffectSlots {
    /// Slots that carry no effects.
    pub const EMPTY: Self = Self([EffectSlot::UNUSED; EFFECT_SLOTS]);

    /// Creates slots from explicit values.
    #[must_use]
    pub const fn new(slots: [EffectSlot; EFFECT_SLOTS]) -> Self {
        Self(slots)
    }

    /// Packs up to three effects into slots, leaving the remainder unused.
    ///
    /// Returns `None` when more than three effects are supplied.
    #[must_use]
    pub fn from_effects(effects: &[EffectSlot]) -> Option<Self> {
        if effects.len() > EFFECT_SLOTS {
            return None;
        }
        let mut slots = [EffectSlot::UNUSED; EFFECT_SLOTS];
        slots[..effects.len()].copy_from_slice(effects);
        Some(Self(slots))
    }

    /// Iterates the slots whose effect identifier is in use, in slot order.
    pub fn active(&self) -> impl Iterator<Item = EffectSlot> + '_ {
        self.0.iter().copied().filter(|slot| !slot.effect.is_unused())
    }
}

/// Team-composition tag used for synergy matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryType {
    /// Neutral tag that never participates in synergy matching.
    None,
    /// Vocal line member.
    Vocal,
    /// Rap line member.
    Rap,
    /// Dance line member.
    Dance,
    /// Visual member.
    Visual,
    /// Group leader.
    Leader,
}

impl CategoryType {
    /// Number of category tags, including the neutral tag.
    pub const COUNT: usize = 6;

    /// Dense index usable for per-category counters.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::None => 0,
            Self::Vocal => 1,
            Self::Rap => 2,
            Self::Dance => 3,
            Self::Visual => 4,
            Self::Leader => 5,
        }
    }

    /// Reports whether the tag takes part in synergy matching.
    #[must_use]
    pub const fn participates(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Static definition describing a unit's composition tag, pattern and skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitProfile {
    /// Unit described by the profile.
    pub unit: UnitId,
    /// Composition tag used for synergy matching.
    pub category: CategoryType,
    /// Influence pattern projected onto the grid.
    pub pattern: PatternCategory,
    /// Skill supplying the unit's tile effects, if any.
    pub skill: Option<SkillId>,
}

/// Static definition of the effects granted by a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillProfile {
    /// Skill described by the profile.
    pub skill: SkillId,
    /// Effects projected onto every influenced tile.
    pub effects: EffectSlots,
}

/// Read-only unit and skill definitions keyed by identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitCatalog {
    units: BTreeMap<UnitId, UnitProfile>,
    skills: BTreeMap<SkillId, SkillProfile>,
}

impl UnitCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit profile, returning any profile it replaced.
    pub fn insert_unit(&mut self, profile: UnitProfile) -> Option<UnitProfile> {
        self.units.insert(profile.unit, profile)
    }

    /// Registers a skill profile, returning any profile it replaced.
    pub fn insert_skill(&mut self, profile: SkillProfile) -> Option<SkillProfile> {
        self.skills.insert(profile.skill, profile)
    }

    /// Looks up a unit profile.
    #[must_use]
    pub fn unit(&self, unit: UnitId) -> Option<&UnitProfile> {
        self.units.get(&unit)
    }

    /// Looks up a skill profile.
    #[must_use]
    pub fn skill(&self, skill: SkillId) -> Option<&SkillProfile> {
        self.skills.get(&skill)
    }

    /// Iterates unit profiles in identifier order.
    pub fn units(&self) -> impl Iterator<Item = &UnitProfile> {
        self.units.values()
    }

    /// Iterates skill profiles in identifier order.
    pub fn skills(&self) -> impl Iterator<Item = &SkillProfile> {
        self.skills.values()
    }

    /// Resolves the placement data for `unit`.
    ///
    /// Unknown units become neutral and influence nothing. Known units whose
    /// skill is unset or missing keep their category and pattern but carry no
    /// effects.
    #[must_use]
    pub fn resolve(&self, unit: UnitId) -> PlacedUnit {
        let Some(profile) = self.unit(unit) else {
            tracing::debug!(unit = unit.get(), "unit_profile.unresolved");
            return PlacedUnit::inert(unit);
        };

        let effects = match profile.skill {
            Some(skill) => match self.skill(skill) {
                Some(skill) => skill.effects,
                None => {
                    tracing::debug!(
                        unit = unit.get(),
                        skill = skill.get(),
                        "skill_profile.unresolved"
                    );
                    EffectSlots::EMPTY
                }
            },
            None => EffectSlots::EMPTY,
        };

        PlacedUnit {
            unit,
            category: profile.category,
            pattern: profile.pattern,
            effects,
        }
    }
}

/// Unit occupying a grid tile together with its resolved placement data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedUnit {
    /// Identifier of the placed unit.
    pub unit: UnitId,
    /// Composition tag used for synergy matching.
    pub category: CategoryType,
    /// Influence pattern anchored at the unit's tile.
    pub pattern: PatternCategory,
    /// Effects projected onto every influenced tile.
    pub effects: EffectSlots,
}

impl PlacedUnit {
    /// Placement data for a unit without any resolvable definition.
    #[must_use]
    pub const fn inert(unit: UnitId) -> Self {
        Self {
            unit,
            category: CategoryType::None,
            pattern: PatternCategory::None,
            effects: EffectSlots::EMPTY,
        }
    }
}

/// Partial mapping from tile to the unit placed on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementState {
    tiles: [Option<PlacedUnit>; TILE_COUNT],
}

impl PlacementState {
    /// Creates an empty placement state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit occupying the tile, if any.
    #[must_use]
    pub fn unit_at(&self, tile: TileIndex) -> Option<&PlacedUnit> {
        self.tiles[tile.as_usize()].as_ref()
    }

    /// Tile occupied by `unit`, if placed.
    #[must_use]
    pub fn tile_of(&self, unit: UnitId) -> Option<TileIndex> {
        self.iter()
            .find(|(_, placed)| placed.unit == unit)
            .map(|(tile, _)| tile)
    }

    /// Stores `unit` on the tile, returning the previous occupant.
    pub fn insert(&mut self, tile: TileIndex, unit: PlacedUnit) -> Option<PlacedUnit> {
        self.tiles[tile.as_usize()].replace(unit)
    }

    /// Removes the unit on the tile, returning it.
    pub fn remove(&mut self, tile: TileIndex) -> Option<PlacedUnit> {
        self.tiles[tile.as_usize()].take()
    }

    /// Exchanges the contents of two tiles.
    pub fn swap(&mut self, first: TileIndex, second: TileIndex) {
        self.tiles.swap(first.as_usize(), second.as_usize());
    }

    /// Removes every unit.
    pub fn clear(&mut self) {
        self.tiles = [None; TILE_COUNT];
    }

    /// Removes every unit standing on a tile `mask` disables, in tile order.
    pub fn retain_enabled(&mut self, mask: &StageLayoutMask) -> Vec<(TileIndex, PlacedUnit)> {
        let mut evicted = Vec::new();
        for tile in TileIndex::all() {
            if !mask.is_enabled(tile) {
                if let Some(unit) = self.remove(tile) {
                    evicted.push((tile, unit));
                }
            }
        }
        evicted
    }

    /// Iterates placed units in tile order.
    pub fn iter(&self) -> impl Iterator<Item = (TileIndex, &PlacedUnit)> + '_ {
        TileIndex::all().filter_map(move |tile| self.unit_at(tile).map(|unit| (tile, unit)))
    }

    /// Iterates placed units standing on tiles `mask` enables, in tile order.
    pub fn iter_enabled<'a>(
        &'a self,
        mask: &'a StageLayoutMask,
    ) -> impl Iterator<Item = (TileIndex, &'a PlacedUnit)> + 'a {
        self.iter().filter(move |(tile, _)| mask.is_enabled(*tile))
    }

    /// Number of placed units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.iter().filter(|slot| slot.is_some()).count()
    }

    /// Reports whether no unit is placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::to_index;

    fn catalog() -> UnitCatalog {
        let mut catalog = UnitCatalog::new();
        let _ = catalog.insert_skill(SkillProfile {
            skill: SkillId::new(10),
            effects: EffectSlots::new([
                EffectSlot::new(EffectId::new(3), 15),
                EffectSlot::UNUSED,
                EffectSlot::new(EffectId::new(4), 5),
            ]),
        });
        let _ = catalog.insert_unit(UnitProfile {
            unit: UnitId::new(1),
            category: CategoryType::Vocal,
            pattern: PatternCategory::Type1,
            skill: Some(SkillId::new(10)),
        });
        let _ = catalog.insert_unit(UnitProfile {
            unit: UnitId::new(2),
            category: CategoryType::Rap,
            pattern: PatternCategory::Type5,
            skill: Some(SkillId::new(99)),
        });
        catalog
    }

    #[test]
    fn active_slots_skip_unused_identifiers() {
        let placed = catalog().resolve(UnitId::new(1));
        let active: Vec<EffectSlot> = placed.effects.active().collect();
        assert_eq!(
            active,
            vec![
                EffectSlot::new(EffectId::new(3), 15),
                EffectSlot::new(EffectId::new(4), 5),
            ]
        );
    }

    #[test]
    fn missing_skill_keeps_pattern_but_drops_effects() {
        let placed = catalog().resolve(UnitId::new(2));
        assert_eq!(placed.pattern, PatternCategory::Type5);
        assert_eq!(placed.category, CategoryType::Rap);
        assert_eq!(placed.effects, EffectSlots::EMPTY);
    }

    #[test]
    fn unknown_unit_is_inert() {
        assert_eq!(catalog().resolve(UnitId::new(77)), PlacedUnit::inert(UnitId::new(77)));
    }

    #[test]
    fn from_effects_rejects_more_than_three_slots() {
        let slot = EffectSlot::new(EffectId::new(1), 1);
        assert!(EffectSlots::from_effects(&[slot; 3]).is_some());
        assert!(EffectSlots::from_effects(&[slot; 4]).is_none());
    }

    #[test]
    fn retain_enabled_evicts_units_on_disabled_tiles() {
        let mut state = PlacementState::new();
        let _ = state.insert(to_index(0, 0), PlacedUnit::inert(UnitId::new(1)));
        let _ = state.insert(to_index(1, 1), PlacedUnit::inert(UnitId::new(2)));
        let mask = StageLayoutMask::from_tiles([to_index(1, 1)]);

        let evicted = state.retain_enabled(&mask);

        assert_eq!(evicted, vec![(to_index(0, 0), PlacedUnit::inert(UnitId::new(1)))]);
        assert_eq!(state.len(), 1);
        assert_eq!(state.tile_of(UnitId::new(2)), Some(to_index(1, 1)));
    }
}
