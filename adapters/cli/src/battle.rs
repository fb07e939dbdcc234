//! Battle-layer stand-ins that log every request they receive.

use formation_core::{
    AllyId, DispatchError, EffectDuration, EffectSink, EffectSlot, InstantiationRequest,
    Instantiator, SynergyId,
};

/// Instantiator handing out sequential ally identifiers.
#[derive(Debug, Default)]
pub(crate) struct LoggingInstantiator {
    next: u32,
}

impl Instantiator for LoggingInstantiator {
    fn instantiate(&mut self, request: &InstantiationRequest) -> Result<AllyId, DispatchError> {
        self.next += 1;
        let ally = AllyId::new(self.next);
        tracing::info!(
            ally = ally.get(),
            unit = request.unit.get(),
            tile = request.tile.get(),
            effects = request.effects.len(),
            "battle.instantiate"
        );
        Ok(ally)
    }
}

/// Effect sink that accepts every dispatch.
#[derive(Debug, Default)]
pub(crate) struct LoggingSink;

impl EffectSink for LoggingSink {
    fn apply_timed(
        &mut self,
        ally: AllyId,
        effect: EffectSlot,
        duration: EffectDuration,
    ) -> Result<(), DispatchError> {
        tracing::info!(
            ally = ally.get(),
            effect = effect.effect.get(),
            magnitude = effect.magnitude,
            ?duration,
            "battle.apply_timed"
        );
        Ok(())
    }

    fn dispatch_global(
        &mut self,
        synergy: SynergyId,
        effect: EffectSlot,
    ) -> Result<(), DispatchError> {
        tracing::info!(
            synergy = synergy.get(),
            effect = effect.effect.get(),
            magnitude = effect.magnitude,
            "battle.dispatch_global"
        );
        Ok(())
    }
}
