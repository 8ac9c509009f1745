//! Lie in wait at a nearby trap point

use crate::config::SetTrapConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};
use crate::world::TrapPoint;
use rand::Rng;

pub struct SetTrapState {
    config: SetTrapConfig,
    trap: Option<TrapPoint>,
    failed: bool,
    waiting: bool,
    wait_elapsed: f32,
    last_exit: Option<f32>,
}

impl SetTrapState {
    /// Create a new trap behavior
    pub fn new(config: SetTrapConfig) -> Self {
        Self {
            config,
            trap: None,
            failed: false,
            waiting: false,
            wait_elapsed: 0.0,
            last_exit: None,
        }
    }

    /// Trap point chosen on entry
    pub fn trap(&self) -> Option<TrapPoint> {
        self.trap
    }

    /// Arrived at the trap point and holding still
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Entry failed or the wait ran out
    pub fn is_finished(&self) -> bool {
        self.failed || self.wait_elapsed >= self.config.max_wait
    }

    /// Enough time has passed since the last exit to enter again
    pub fn cooldown_elapsed(&self, time: f32) -> bool {
        self.last_exit
            .map_or(true, |exit| time - exit >= self.config.cooldown)
    }
}

impl Behavior for SetTrapState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::SetTrap
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.trap = None;
        self.failed = false;
        self.waiting = false;
        self.wait_elapsed = 0.0;

        let candidates = ctx
            .world
            .traps
            .points_within_range(ctx.movement.position(), self.config.detection_radius);
        if candidates.is_empty() {
            log::debug!("No trap point within {}", self.config.detection_radius);
            self.failed = true;
            return;
        }

        let trap = candidates[ctx.rng.gen_range(0..candidates.len())];
        ctx.movement.set_stopping_distance_override(0.0);
        ctx.movement.set_is_stopped(false);
        if !ctx.movement.set_destination(trap.position) {
            log::debug!("Trap point {:?} unreachable", trap.position);
            self.failed = true;
            return;
        }
        self.trap = Some(trap);
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        let Some(trap) = self.trap else {
            return;
        };

        if !self.waiting {
            if ctx.movement.has_reached_destination() {
                self.waiting = true;
                ctx.movement.set_is_stopped(true);
                log::debug!("Waiting at trap point {:?}", trap.position);
            }
            return;
        }

        self.wait_elapsed += ctx.dt;
        ctx.movement
            .rotate_to_direction(trap.facing, self.config.turn_speed, ctx.dt);
    }

    fn exit(&mut self, ctx: &mut BehaviorContext<'_>) {
        // Cooldown applies whether or not the trap was set
        self.last_exit = Some(ctx.time);
        self.trap = None;
        self.waiting = false;
        ctx.movement.reset_stopping_distance_override();
        ctx.movement.set_is_stopped(false);
    }
}
