//! Contracts between the AI core and whatever moves the agent

use crate::path::{AreaMask, NavPath, OffMeshLinkData};
use mimic_math::Vec3;

/// Path-following movement primitive driven by the movement controller.
///
/// Angular speed is in degrees per second.
pub trait NavigationAgent: Send {
    fn position(&self) -> Vec3;

    /// Move the agent without touching its path (used while interpolating links)
    fn set_position(&mut self, position: Vec3);

    /// Teleport and drop the current path. Returns false if the point is off-mesh.
    fn warp(&mut self, position: Vec3) -> bool;

    fn forward(&self) -> Vec3;
    fn set_forward(&mut self, forward: Vec3);

    /// Plan and follow a path to `target`
    fn set_destination(&mut self, target: Vec3) -> bool;

    /// Follow a precomputed path
    fn set_path(&mut self, path: NavPath) -> bool;

    /// Plan a path from the agent's position without following it
    fn calculate_path(&self, target: Vec3) -> Option<NavPath>;

    fn has_path(&self) -> bool;

    /// Distance left along the current path (0 without a path)
    fn remaining_distance(&self) -> f32;

    fn is_stopped(&self) -> bool;
    fn set_stopped(&mut self, stopped: bool);

    fn speed(&self) -> f32;
    fn set_speed(&mut self, speed: f32);
    fn acceleration(&self) -> f32;
    fn set_acceleration(&mut self, acceleration: f32);
    fn angular_speed(&self) -> f32;
    fn set_angular_speed(&mut self, angular_speed: f32);
    fn stopping_distance(&self) -> f32;
    fn set_stopping_distance(&mut self, distance: f32);

    /// Areas this agent may path through
    fn area_mask(&self) -> AreaMask;

    /// Area type `lookahead` units further along the current path
    fn sample_path_area(&self, lookahead: f32) -> AreaMask;

    /// Link the agent is currently parked on, waiting to be traversed
    fn current_off_mesh_link(&self) -> Option<OffMeshLinkData>;

    /// Finish the current link and resume path following past it
    fn complete_off_mesh_link(&mut self);

    /// Advance path following by `dt` seconds
    fn step(&mut self, dt: f32);
}

/// Shared pathfinding queries, independent of any single agent
pub trait NavQuery: Send + Sync {
    fn calculate_path(&self, from: Vec3, to: Vec3, mask: AreaMask) -> Option<NavPath>;

    /// Nearest navigable point within `max_distance` of `point`
    fn sample_position(&self, point: Vec3, max_distance: f32, mask: AreaMask) -> Option<Vec3>;
}
