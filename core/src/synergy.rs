//! Static composition-synergy definitions.

use serde::{Deserialize, Serialize};

use crate::unit::{CategoryType, EffectSlots};

/// Maximum number of category tags a synergy may require.
pub const REQUIREMENT_SLOTS: usize = 3;

/// Identifier of a synergy definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SynergyId(u32);

impl SynergyId {
    /// Creates a new synergy identifier.
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

/// Recipients of a synergy's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetScope {
    /// The payload is not dispatched.
    None,
    /// Every deployed ally receives the payload.
    AlliesAll,
    /// The payload is handed to systems outside the ally roster.
    GlobalOrOther,
}

/// Rule that activates when the team contains a required multiset of tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynergyDefinition {
    /// Identifier of the synergy.
    pub id: SynergyId,
    /// Display name surfaced by presentation layers.
    pub name: String,
    /// Required tags; repeated tags raise the required count for that tag.
    pub requirements: Vec<CategoryType>,
    /// Recipients of the payload.
    pub scope: TargetScope,
    /// Effects dispatched while the synergy is active.
    pub payload: EffectSlots,
}

impl SynergyDefinition {
    /// Required unit count per category tag.
    ///
    /// Neutral tags never count toward a requirement.
    #[must_use]
    pub fn required_counts(&self) -> [u32; CategoryType::COUNT] {
        let mut counts = [0; CategoryType::COUNT];
        for category in self
            .requirements
            .iter()
            .take(REQUIREMENT_SLOTS)
            .filter(|category| category.participates())
        {
            counts[category.slot()] += 1;
        }
        counts
    }
}

/// Ordered, read-only list of synergy definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SynergyTable {
    definitions: Vec<SynergyDefinition>,
}

impl SynergyTable {
    /// Creates a table preserving the provided definition order.
    #[must_use]
    pub fn new(definitions: Vec<SynergyDefinition>) -> Self {
        Self { definitions }
    }

    /// Iterates definitions in table order.
    pub fn iter(&self) -> impl Iterator<Item = &SynergyDefinition> {
        self.definitions.iter()
    }

    /// Looks up a definition by identifier.
    #[must_use]
    pub fn get(&self, id: SynergyId) -> Option<&SynergyDefinition> {
        self.definitions.iter().find(|definition| definition.id == id)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Reports whether the table holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
