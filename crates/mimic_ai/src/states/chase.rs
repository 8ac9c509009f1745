//! Run the target down

use crate::config::ChaseConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};

pub struct ChaseState {
    config: ChaseConfig,
    caught: bool,
    attack_elapsed: Option<f32>,
}

impl ChaseState {
    /// Create a new chase behavior
    pub fn new(config: ChaseConfig) -> Self {
        Self {
            config,
            caught: false,
            attack_elapsed: None,
        }
    }

    /// Target came within the catch radius during this chase
    pub fn is_caught(&self) -> bool {
        self.caught
    }

    /// An attack animation is playing; Chase will not exit until it ends
    pub fn is_mid_attack(&self) -> bool {
        self.attack_elapsed.is_some()
    }
}

impl Behavior for ChaseState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Chase
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.caught = false;
        self.attack_elapsed = None;
        ctx.movement.set_speed_override(self.config.speed);
        ctx.movement.set_acceleration_override(self.config.acceleration);
        ctx.movement.set_is_stopped(false);
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        if let Some(elapsed) = self.attack_elapsed.as_mut() {
            *elapsed += ctx.dt;
            if *elapsed < self.config.attack_duration {
                return;
            }
            self.attack_elapsed = None;
            ctx.movement.set_is_stopped(false);
        }

        let result = *ctx.perception.result();
        if !result.has_target {
            return;
        }
        // Direct sight supersedes any remembered sound
        ctx.perception.clear_point_of_interest();
        ctx.movement.set_destination(result.target_position);

        let radius = self.config.catch_radius;
        if ctx.movement.position().distance_squared(result.target_position) <= radius * radius {
            if !self.caught {
                log::info!("Caught target at {:?}", result.target_position);
            }
            self.caught = true;
            self.attack_elapsed = Some(0.0);
            ctx.movement.set_is_stopped(true);
        }
    }

    fn exit(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.attack_elapsed = None;
        ctx.movement.reset_speed_override();
        ctx.movement.reset_acceleration_override();
        ctx.movement.set_is_stopped(false);
        ctx.world.set_mimicry_strength(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::test_support::Fixture;
    use mimic_math::Vec3;

    const ROOM: &[&str] = &[".....", ".....", ".....", ".....", "....."];

    #[test]
    fn test_catch_within_radius_same_tick() {
        let mut fx = Fixture::new(ROOM, Vec3::new(0.5, 0.0, 0.5));
        *fx.player.position.lock() = Vec3::new(0.5, 0.0, 1.0);
        let mut chase = ChaseState::new(ChaseConfig::default().with_catch_radius(0.75));

        chase.enter(&mut fx.ctx(0.0));
        fx.sense_and_move(0.0);
        chase.tick(&mut fx.ctx(0.0));
        assert!(chase.is_caught());
        assert!(chase.is_mid_attack());
    }

    #[test]
    fn test_attack_window_ends() {
        let mut fx = Fixture::new(ROOM, Vec3::new(0.5, 0.0, 0.5));
        *fx.player.position.lock() = Vec3::new(0.5, 0.0, 1.0);
        let mut chase = ChaseState::new(ChaseConfig::default().with_attack_duration(0.5));

        chase.enter(&mut fx.ctx(0.0));
        fx.sense_and_move(0.0);
        chase.tick(&mut fx.ctx(0.0));
        assert!(fx.movement.is_stopped());

        *fx.player.position.lock() = Vec3::new(0.5, 0.0, 4.5);
        fx.sense_and_move(0.0);
        chase.tick(&mut fx.ctx(0.6));
        assert!(!chase.is_mid_attack());
        assert!(!fx.movement.is_stopped());
    }

    #[test]
    fn test_overrides_restored_on_exit() {
        let mut fx = Fixture::new(ROOM, Vec3::new(0.5, 0.0, 0.5));
        let mut chase = ChaseState::new(ChaseConfig::default());
        chase.enter(&mut fx.ctx(0.0));
        assert_eq!(fx.movement.overrides().speed, Some(ChaseConfig::default().speed));

        chase.exit(&mut fx.ctx(0.0));
        assert!(fx.movement.overrides().is_empty());
    }
}
