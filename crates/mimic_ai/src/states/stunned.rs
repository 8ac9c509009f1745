//! Disabled until the external stun wears off

use crate::config::StunnedConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};

/// Holds the agent still with mimicry dropped
pub struct StunnedState {
    config: StunnedConfig,
}

impl StunnedState {
    pub fn new(config: StunnedConfig) -> Self {
        Self { config }
    }
}

impl Behavior for StunnedState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Stunned
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        ctx.movement.set_is_stopped(true);
        ctx.world.set_mimicry_strength(self.config.stunned_strength);
    }

    // Duration is owned by the stun source
    fn tick(&mut self, _ctx: &mut BehaviorContext<'_>) {}

    fn exit(&mut self, ctx: &mut BehaviorContext<'_>) {
        ctx.movement.set_is_stopped(false);
        ctx.world.set_mimicry_strength(self.config.recovered_strength);
    }
}
