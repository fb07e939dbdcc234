#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that matches team composition against synergy rules.

use std::sync::Arc;

use formation_core::{
    AllyId, CategoryType, EffectDuration, EffectSink, Event, PlacementState, StageLayoutMask,
    SynergyDefinition, SynergyId, SynergyTable, TargetScope,
};

/// Number of placed units per category tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    counts: [u32; CategoryType::COUNT],
}

impl Composition {
    /// Counts the participating tags of the units standing on enabled tiles.
    #[must_use]
    pub fn from_placements(placements: &PlacementState, mask: &StageLayoutMask) -> Self {
        let mut composition = Self::default();
        for (_, placed) in placements.iter_enabled(mask) {
            composition.add(placed.category);
        }
        composition
    }

    /// Records one unit carrying `category`. Neutral tags are ignored.
    pub fn add(&mut self, category: CategoryType) {
        if category.participates() {
            self.counts[category.slot()] += 1;
        }
    }

    /// Number of units carrying `category`.
    #[must_use]
    pub fn count(&self, category: CategoryType) -> u32 {
        self.counts[category.slot()]
    }

    /// Reports whether the composition satisfies the synergy's requirements.
    ///
    /// A definition without any participating requirement is never satisfied.
    #[must_use]
    pub fn satisfies(&self, definition: &SynergyDefinition) -> bool {
        let required = definition.required_counts();
        if required.iter().all(|count| *count == 0) {
            return false;
        }
        required
            .iter()
            .zip(self.counts.iter())
            .all(|(required, present)| present >= required)
    }
}

impl FromIterator<CategoryType> for Composition {
    fn from_iter<I: IntoIterator<Item = CategoryType>>(iter: I) -> Self {
        let mut composition = Self::default();
        for category in iter {
            composition.add(category);
        }
        composition
    }
}

/// Synergies satisfied by a composition, in table order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveSynergySet {
    entries: Vec<SynergyDefinition>,
}

impl ActiveSynergySet {
    /// Iterates the active definitions in table order.
    pub fn iter(&self) -> impl Iterator<Item = &SynergyDefinition> {
        self.entries.iter()
    }

    /// Identifiers of the active definitions in table order.
    #[must_use]
    pub fn ids(&self) -> Vec<SynergyId> {
        self.entries.iter().map(|definition| definition.id).collect()
    }

    /// Number of active synergies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no synergy is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects every definition the composition satisfies, preserving table order.
#[must_use]
pub fn evaluate_composition(table: &SynergyTable, composition: &Composition) -> ActiveSynergySet {
    ActiveSynergySet {
        entries: table
            .iter()
            .filter(|definition| composition.satisfies(definition))
            .cloned()
            .collect(),
    }
}

/// Evaluates the synergies active for the units standing on enabled tiles.
#[must_use]
pub fn evaluate(
    table: &SynergyTable,
    placements: &PlacementState,
    mask: &StageLayoutMask,
) -> ActiveSynergySet {
    evaluate_composition(table, &Composition::from_placements(placements, mask))
}

/// Outcome of a best-effort synergy application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Timed effects accepted by ally instances.
    pub ally_effects: u32,
    /// Payload slots accepted by global systems.
    pub global_effects: u32,
    /// Dispatches the sink refused.
    pub failures: u32,
}

/// Dispatches the payloads of the active synergies.
///
/// Ally-scoped payloads are applied to every ally for the whole battle,
/// global payloads are handed to the sink once, and unscoped payloads are
/// skipped. Failures are logged and counted; they never stop the remaining
/// dispatches and nothing is rolled back.
pub fn apply(
    active: &ActiveSynergySet,
    allies: &[AllyId],
    sink: &mut impl EffectSink,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for definition in active.iter() {
        for effect in definition.payload.active() {
            match definition.scope {
                TargetScope::AlliesAll => {
                    for ally in allies {
                        match sink.apply_timed(*ally, effect, EffectDuration::Battle) {
                            Ok(()) => report.ally_effects += 1,
                            Err(error) => {
                                report.failures += 1;
                                tracing::warn!(
                                    synergy = definition.id.get(),
                                    ally = ally.get(),
                                    effect = effect.effect.get(),
                                    %error,
                                    "synergy.apply_failed"
                                );
                            }
                        }
                    }
                }
                TargetScope::GlobalOrOther => match sink.dispatch_global(definition.id, effect) {
                    Ok(()) => report.global_effects += 1,
                    Err(error) => {
                        report.failures += 1;
                        tracing::warn!(
                            synergy = definition.id.get(),
                            effect = effect.effect.get(),
                            %error,
                            "synergy.dispatch_failed"
                        );
                    }
                },
                TargetScope::None => {}
            }
        }
    }

    report
}

/// Synergy system that re-evaluates whenever the placements change.
#[derive(Debug)]
pub struct Synergies {
    table: Arc<SynergyTable>,
    active: ActiveSynergySet,
}

impl Synergies {
    /// Creates a new synergy system with no active synergies.
    #[must_use]
    pub fn new(table: Arc<SynergyTable>) -> Self {
        Self {
            table,
            active: ActiveSynergySet::default(),
        }
    }

    /// Consumes world events, re-evaluating when any of them changed the placements.
    ///
    /// Returns whether an evaluation happened.
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

    /// Unconditionally re-evaluates the active set.
    pub fn refresh(&mut self, placements: &PlacementState, mask: &StageLayoutMask) {
        self.active = evaluate(&self.table, placements, mask);
        tracing::debug!(active = self.active.len(), "synergy.evaluated");
    }

    /// Most recently evaluated active set.
    #[must_use]
    pub fn active(&self) -> &ActiveSynergySet {
        &self.active
    }

    /// Definitions the system evaluates against.
    #[must_use]
    pub fn table(&self) -> &SynergyTable {
        &self.table
    }
}
