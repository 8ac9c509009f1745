//! Short wind-up between spotting the target and chasing it

use crate::config::PreparingToChaseConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};

pub struct PreparingToChaseState {
    config: PreparingToChaseConfig,
    elapsed: f32,
}

impl PreparingToChaseState {
    pub fn new(config: PreparingToChaseConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
        }
    }

    /// Delay has elapsed
    pub fn can_start_chase(&self) -> bool {
        self.elapsed >= self.config.delay
    }
}

impl Behavior for PreparingToChaseState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::PreparingToChase
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.elapsed = 0.0;
        ctx.movement.set_is_stopped(true);
        ctx.world.set_mimicry_strength(self.config.mimicry_strength);
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.elapsed += ctx.dt;

        let result = *ctx.perception.result();
        if result.has_target {
            let direction = result.target_position - ctx.movement.position();
            ctx.movement
                .rotate_to_direction(direction, self.config.turn_speed, ctx.dt);
        }
    }

    fn exit(&mut self, ctx: &mut BehaviorContext<'_>) {
        ctx.movement.set_is_stopped(false);
    }
}
