//! Movement abstraction over a navigation agent
//!
//! Behaviors never touch the navigation agent directly. They set defaults or
//! temporary overrides here; every tick the controller derives the posture,
//! combines overrides with defaults and pushes the result to the agent.
//! Vent links are crossed with a timed interpolation instead of the agent's
//! own path following.

use crate::config::MovementConfig;
use crate::error::Result;
use mimic_math::{radians, Bounds, Vec3};
use mimic_nav::{AreaMask, LinkKind, NavPath, NavQuery, NavigationAgent, OffMeshLinkData};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Heading error (degrees) under which the agent counts as facing a direction
const FACING_TOLERANCE_DEGREES: f32 = 1.0;

/// Posture derived from the area under the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementState {
    Walking,
    /// Has a multiplier but is never derived by the controller
    Crouching,
    Crawling,
}

/// Per-behavior overrides; `None` falls back to the default
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedOverrideSet {
    pub speed: Option<f32>,
    pub acceleration: Option<f32>,
    pub angular_speed: Option<f32>,
    pub stopping_distance: Option<f32>,
}

impl SpeedOverrideSet {
    /// No override is set
    pub fn is_empty(&self) -> bool {
        self.speed.is_none()
            && self.acceleration.is_none()
            && self.angular_speed.is_none()
            && self.stopping_distance.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
struct LinkTraversal {
    link: OffMeshLinkData,
    elapsed: f32,
    /// Travelling from the authored end back to the start
    exiting: bool,
    start_height: f32,
}

/// Route requested while a vent crossing owns the agent
#[derive(Debug, Clone)]
enum PendingRoute {
    Destination(Vec3),
    Path(NavPath),
}

/// Speed, posture and vent-link handling on top of a [`NavigationAgent`]
pub struct MovementController {
    agent: Box<dyn NavigationAgent>,
    nav: Arc<dyn NavQuery>,
    config: MovementConfig,
    speed: f32,
    acceleration: f32,
    angular_speed: f32,
    stopping_distance: f32,
    overrides: SpeedOverrideSet,
    state: MovementState,
    traversal: Option<LinkTraversal>,
    in_transition: bool,
    reentry_lockout: f32,
    pending_route: Option<PendingRoute>,
}

impl MovementController {
    /// Create a new controller and push the configured defaults to `agent`
    pub fn new(
        agent: Box<dyn NavigationAgent>,
        nav: Arc<dyn NavQuery>,
        config: MovementConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut controller = Self {
            agent,
            nav,
            speed: config.speed,
            acceleration: config.acceleration,
            angular_speed: config.angular_speed,
            stopping_distance: config.stopping_distance,
            config,
            overrides: SpeedOverrideSet::default(),
            state: MovementState::Walking,
            traversal: None,
            in_transition: false,
            reentry_lockout: 0.0,
            pending_route: None,
        };
        controller.apply_to_agent();
        Ok(controller)
    }

    /// Per-tick update: link traversal, posture, speeds, then agent step
    pub fn update(&mut self, dt: f32) {
        self.update_link_traversal(dt);

        self.state = if self.in_transition
            || self
                .agent
                .sample_path_area(self.config.area_lookahead)
                .intersects(AreaMask::CRAWL)
        {
            MovementState::Crawling
        } else {
            MovementState::Walking
        };

        self.apply_to_agent();
        self.agent.step(dt);
    }

    fn update_link_traversal(&mut self, dt: f32) {
        if self.traversal.is_none() && self.reentry_lockout > 0.0 {
            self.reentry_lockout -= dt;
            if self.reentry_lockout <= 0.0 {
                self.reentry_lockout = 0.0;
                self.in_transition = false;
            }
        }

        if let Some(mut traversal) = self.traversal.take() {
            traversal.elapsed += dt;
            let duration = self.config.link_curve.duration();
            let t = traversal.elapsed.min(duration);
            let progress = if traversal.exiting {
                self.config.link_curve.evaluate(duration - t)
            } else {
                self.config.link_curve.evaluate(t)
            };
            let position = traversal
                .link
                .start
                .lerp(traversal.link.end, progress)
                .with_y(traversal.start_height);
            self.agent.set_position(position);

            if traversal.elapsed >= duration {
                self.agent.complete_off_mesh_link();
                self.apply_pending_route();
                self.reentry_lockout = self.config.link_reentry_delay;
                if self.reentry_lockout <= 0.0 {
                    self.in_transition = false;
                }
                log::debug!("Finished vent crossing");
            } else {
                self.traversal = Some(traversal);
            }
            return;
        }

        let Some(link) = self.agent.current_off_mesh_link() else {
            return;
        };
        match link.kind {
            LinkKind::Generic => self.agent.complete_off_mesh_link(),
            LinkKind::Vent if !self.in_transition => {
                let position = self.agent.position();
                let exiting =
                    position.distance_squared(link.end) < position.distance_squared(link.start);
                log::debug!("Starting vent crossing (exiting: {})", exiting);
                self.traversal = Some(LinkTraversal {
                    link,
                    elapsed: 0.0,
                    exiting,
                    start_height: position.y,
                });
                self.in_transition = true;
            }
            LinkKind::Vent => {}
        }
    }

    fn effective_stopping_distance(&self) -> f32 {
        self.overrides
            .stopping_distance
            .unwrap_or(self.stopping_distance)
    }

    fn speed_multiplier(&self) -> f32 {
        match self.state {
            MovementState::Walking => 1.0,
            MovementState::Crouching => self.config.crouch_speed_multiplier,
            MovementState::Crawling => self.config.crawl_speed_multiplier,
        }
    }

    fn apply_to_agent(&mut self) {
        let speed = self.overrides.speed.unwrap_or(self.speed) * self.speed_multiplier();
        self.agent.set_speed(speed);
        self.agent
            .set_acceleration(self.overrides.acceleration.unwrap_or(self.acceleration));
        self.agent
            .set_angular_speed(self.overrides.angular_speed.unwrap_or(self.angular_speed));
        self.agent
            .set_stopping_distance(self.effective_stopping_distance());
    }

    /// Hand a route deferred during the crossing to the agent
    fn apply_pending_route(&mut self) {
        match self.pending_route.take() {
            Some(PendingRoute::Destination(target)) => {
                if !self.agent.set_destination(target) {
                    log::debug!("No path to {:?} after vent crossing", target);
                }
            }
            Some(PendingRoute::Path(path)) => {
                self.agent.set_path(path);
            }
            None => {}
        }
    }

    /// Where the agent leaves the link being crossed
    fn traversal_exit(&self) -> Option<Vec3> {
        self.traversal.map(|t| {
            if t.exiting {
                t.link.start
            } else {
                t.link.end
            }
        })
    }

    /// Abort a vent crossing and leave the agent at the link exit
    pub fn interrupt_link_traversal(&mut self) {
        if self.traversal.take().is_some() {
            self.agent.complete_off_mesh_link();
            log::debug!("Vent crossing interrupted");
        }
        self.pending_route = None;
        self.in_transition = false;
        self.reentry_lockout = 0.0;
    }

    /// Default speed in metres per second, before posture multipliers
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Default acceleration
    pub fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration;
    }

    /// Default turn rate in degrees per second
    pub fn set_angular_speed(&mut self, angular_speed: f32) {
        self.angular_speed = angular_speed;
    }

    /// Default distance short of the goal at which the agent halts
    pub fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance;
    }

    /// Replace the default speed until reset. Posture multipliers still apply.
    pub fn set_speed_override(&mut self, speed: f32) {
        self.overrides.speed = Some(speed);
    }

    /// Fall back to the default speed
    pub fn reset_speed_override(&mut self) {
        self.overrides.speed = None;
    }

    /// Replace the default acceleration until reset
    pub fn set_acceleration_override(&mut self, acceleration: f32) {
        self.overrides.acceleration = Some(acceleration);
    }

    pub fn reset_acceleration_override(&mut self) {
        self.overrides.acceleration = None;
    }

    /// Replace the default turn rate until reset
    pub fn set_angular_speed_override(&mut self, angular_speed: f32) {
        self.overrides.angular_speed = Some(angular_speed);
    }

    pub fn reset_angular_speed_override(&mut self) {
        self.overrides.angular_speed = None;
    }

    /// Replace the default stopping distance until reset. Also used as the
    /// arrival threshold when larger than the configured one.
    pub fn set_stopping_distance_override(&mut self, distance: f32) {
        self.overrides.stopping_distance = Some(distance);
    }

    pub fn reset_stopping_distance_override(&mut self) {
        self.overrides.stopping_distance = None;
    }

    /// Drop every override at once
    pub fn reset_all_overrides(&mut self) {
        self.overrides = SpeedOverrideSet::default();
    }

    pub fn overrides(&self) -> &SpeedOverrideSet {
        &self.overrides
    }

    /// Posture derived on the last update
    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Crossing a vent link, or inside the re-entry lockout after one
    pub fn is_in_transition(&self) -> bool {
        self.in_transition
    }

    pub fn position(&self) -> Vec3 {
        self.agent.position()
    }

    pub fn forward(&self) -> Vec3 {
        self.agent.forward()
    }

    pub fn area_mask(&self) -> AreaMask {
        self.agent.area_mask()
    }

    /// Path length left to the goal, zero without a path
    pub fn remaining_distance(&self) -> f32 {
        self.agent.remaining_distance()
    }

    /// Path to `target`. During a vent crossing the request is held until
    /// the agent leaves the link; the result then reports whether a path
    /// exists from the link exit.
    pub fn set_destination(&mut self, target: Vec3) -> bool {
        if let Some(exit) = self.traversal_exit() {
            let reachable = self
                .nav
                .calculate_path(exit, target, self.agent.area_mask())
                .is_some();
            if reachable {
                self.pending_route = Some(PendingRoute::Destination(target));
            }
            return reachable;
        }
        let ok = self.agent.set_destination(target);
        if !ok {
            log::debug!("No path to {:?}", target);
        }
        ok
    }

    /// Follow `path`, deferred like [`Self::set_destination`] while crossing
    pub fn set_path(&mut self, path: NavPath) -> bool {
        if self.traversal.is_some() {
            if path.corners.is_empty() {
                return false;
            }
            self.pending_route = Some(PendingRoute::Path(path));
            return true;
        }
        self.agent.set_path(path)
    }

    /// Path from the current position without adopting it
    pub fn calculate_path(&self, target: Vec3) -> Option<NavPath> {
        self.agent.calculate_path(target)
    }

    /// Halt or release the agent; the path is kept
    pub fn set_is_stopped(&mut self, stopped: bool) {
        self.agent.set_stopped(stopped);
    }

    pub fn is_stopped(&self) -> bool {
        self.agent.is_stopped()
    }

    /// Teleport, abandoning any path or crossing
    pub fn warp(&mut self, position: Vec3) -> bool {
        self.interrupt_link_traversal();
        self.agent.warp(position)
    }

    /// True without a path, or once the remaining distance is within the
    /// arrival threshold or stopping distance, whichever is larger
    pub fn has_reached_destination(&self) -> bool {
        if self.in_transition && self.traversal.is_some() {
            return false;
        }
        if !self.agent.has_path() {
            return true;
        }
        let threshold = self
            .config
            .arrival_threshold
            .max(self.effective_stopping_distance());
        self.agent.remaining_distance() <= threshold
    }

    /// Random navigable point inside `bounds`, trying a fixed number of samples
    pub fn try_find_random_point_in_bounds(
        &self,
        bounds: &Bounds,
        mask: AreaMask,
        rng: &mut dyn RngCore,
    ) -> Option<Vec3> {
        (0..self.config.random_point_attempts).find_map(|_| {
            let unit = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            self.nav
                .sample_position(bounds.point_at(unit), self.config.sample_radius, mask)
        })
    }

    /// Turn toward `direction` at `angular_speed` degrees per second (or the
    /// current effective rate). Returns true once facing it.
    pub fn rotate_to_direction(
        &mut self,
        direction: Vec3,
        angular_speed: Option<f32>,
        dt: f32,
    ) -> bool {
        let rate = angular_speed
            .or(self.overrides.angular_speed)
            .unwrap_or(self.angular_speed);
        let forward = self
            .agent
            .forward()
            .turn_towards(direction, radians(rate) * dt);
        self.agent.set_forward(forward);

        let flat = direction.horizontal();
        flat.length_squared() < 1e-10
            || forward.angle_between(flat) <= radians(FACING_TOLERANCE_DEGREES)
    }
}
