//! Investigate the last heard sound

use crate::config::SearchConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};
use mimic_math::Vec3;

/// Walks to the point of interest and clears it on arrival
pub struct SearchState {
    config: SearchConfig,
    goal: Option<Vec3>,
    repath_timer: f32,
}

impl SearchState {
    /// Create an idle search with no goal
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            goal: None,
            repath_timer: 0.0,
        }
    }

    /// Point currently being investigated
    pub fn goal(&self) -> Option<Vec3> {
        self.goal
    }

    /// Path to `point` and restart the repath timer
    fn head_to(&mut self, ctx: &mut BehaviorContext<'_>, point: Vec3) {
        ctx.movement.set_destination(point);
        self.goal = Some(point);
        self.repath_timer = 0.0;
    }
}

impl Behavior for SearchState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Search
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.goal = None;
        ctx.movement.set_is_stopped(false);
        if let Some(point) = ctx.perception.result().point_of_interest {
            self.head_to(ctx, point);
        }
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.repath_timer += ctx.dt;
        let Some(point) = ctx.perception.result().point_of_interest else {
            return;
        };

        if self.goal != Some(point) {
            self.head_to(ctx, point);
        } else if ctx.movement.has_reached_destination() {
            log::debug!("Reached point of interest {:?}", point);
            ctx.perception.clear_point_of_interest();
            self.goal = None;
        } else if self.repath_timer >= self.config.repath_interval {
            self.head_to(ctx, point);
        }
    }

    fn exit(&mut self, _ctx: &mut BehaviorContext<'_>) {
        self.goal = None;
    }
}
