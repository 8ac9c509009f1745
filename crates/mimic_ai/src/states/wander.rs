//! Roam between wander regions and make periodic trap decisions

use crate::config::WanderConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};
use mimic_math::{Bounds, Vec3};
use rand::{Rng, RngCore};

/// A wander area with its cached reachability
#[derive(Debug, Clone, PartialEq)]
pub struct WanderRegion {
    pub bounds: Bounds,
    pub probe: Vec3,
    /// Stale between refreshes
    pub reachable: bool,
}

pub struct WanderState {
    config: WanderConfig,
    regions: Vec<WanderRegion>,
    decision_interval: f32,
    decision_timer: f32,
    reachability_timer: f32,
    warned_no_region: bool,
}

impl WanderState {
    pub fn new(config: WanderConfig) -> Self {
        let regions = config
            .regions
            .iter()
            .map(|r| WanderRegion {
                bounds: Bounds::new(r.centre, r.extents),
                probe: r.probe,
                reachable: false,
            })
            .collect();
        Self {
            decision_interval: config.decision_interval_max,
            config,
            regions,
            decision_timer: 0.0,
            reachability_timer: 0.0,
            warned_no_region: false,
        }
    }

    /// Configured regions with their last reachability result
    pub fn regions(&self) -> &[WanderRegion] {
        &self.regions
    }

    /// Decision timer has run out; the machine rolls for SetTrap
    pub fn is_decision_ready(&self) -> bool {
        self.decision_timer >= self.decision_interval
    }

    /// Chance per decision of switching to SetTrap
    pub fn trap_probability(&self) -> f32 {
        self.config.trap_probability
    }

    /// Restart the decision timer with a fresh random interval
    pub fn reset_decision(&mut self, rng: &mut dyn RngCore) {
        self.decision_timer = 0.0;
        self.decision_interval =
            rng.gen_range(self.config.decision_interval_min..=self.config.decision_interval_max);
    }

    fn refresh_reachability(&mut self, ctx: &BehaviorContext<'_>) {
        let radius_sq = self.config.reachability_radius * self.config.reachability_radius;
        for region in &mut self.regions {
            region.reachable = ctx
                .movement
                .calculate_path(region.probe)
                .and_then(|path| path.last_corner())
                .map_or(false, |end| {
                    end.horizontal().distance_squared(region.probe.horizontal()) <= radius_sq
                });
        }
        log::debug!(
            "Wander regions reachable: {}/{}",
            self.regions.iter().filter(|r| r.reachable).count(),
            self.regions.len()
        );
    }

    fn pick_destination(&mut self, ctx: &mut BehaviorContext<'_>) {
        let reachable: Vec<Bounds> = self
            .regions
            .iter()
            .filter(|r| r.reachable)
            .map(|r| r.bounds)
            .collect();

        if reachable.is_empty() {
            if !self.warned_no_region {
                log::warn!("No reachable wander region; standing still");
                self.warned_no_region = true;
            }
            return;
        }

        let bounds = reachable[ctx.rng.gen_range(0..reachable.len())];
        let mask = ctx.movement.area_mask();
        match ctx
            .movement
            .try_find_random_point_in_bounds(&bounds, mask, ctx.rng)
        {
            Some(point) => {
                if ctx.movement.set_destination(point) {
                    self.warned_no_region = false;
                }
            }
            None => log::debug!("No navigable point found in wander region"),
        }
    }
}

impl Behavior for WanderState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Wander
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.reset_decision(ctx.rng);
        self.reachability_timer = 0.0;
        ctx.movement.set_is_stopped(false);
        self.refresh_reachability(ctx);
        self.pick_destination(ctx);
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.decision_timer += ctx.dt;
        self.reachability_timer += ctx.dt;

        if self.reachability_timer >= self.config.reachability_interval {
            self.reachability_timer = 0.0;
            self.refresh_reachability(ctx);
        }

        if ctx.movement.has_reached_destination() {
            self.pick_destination(ctx);
        }
    }

    fn exit(&mut self, _ctx: &mut BehaviorContext<'_>) {}
}
