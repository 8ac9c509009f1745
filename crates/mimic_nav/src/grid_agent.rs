//! Path-following agent over a [`NavGrid`]

use crate::grid::NavGrid;
use crate::navigator::NavigationAgent;
use crate::path::{AreaMask, NavPath, OffMeshLinkData};
use mimic_math::{radians, Vec3};
use std::sync::Arc;

/// Kinematic agent that walks grid paths corner to corner.
///
/// The agent parks at the entry of every off-mesh link on its path and waits
/// for [`NavigationAgent::complete_off_mesh_link`].
#[derive(Debug, Clone)]
pub struct GridAgent {
    grid: Arc<NavGrid>,
    position: Vec3,
    forward: Vec3,
    current_speed: f32,
    speed: f32,
    acceleration: f32,
    angular_speed: f32,
    stopping_distance: f32,
    stopped: bool,
    area_mask: AreaMask,
    path: Option<NavPath>,
    next_corner: usize,
    on_link: Option<usize>,
}

impl GridAgent {
    pub fn new(grid: Arc<NavGrid>, position: Vec3) -> Self {
        Self {
            grid,
            position,
            forward: Vec3::Z,
            current_speed: 0.0,
            speed: 3.5,
            acceleration: 8.0,
            angular_speed: 120.0,
            stopping_distance: 0.0,
            stopped: false,
            area_mask: AreaMask::ALL,
            path: None,
            next_corner: 0,
            on_link: None,
        }
    }

    pub fn with_area_mask(mut self, mask: AreaMask) -> Self {
        self.area_mask = mask;
        self
    }

    pub fn grid(&self) -> &Arc<NavGrid> {
        &self.grid
    }

    pub fn path(&self) -> Option<&NavPath> {
        self.path.as_ref()
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    fn clear_path(&mut self) {
        self.path = None;
        self.next_corner = 0;
        self.on_link = None;
        self.current_speed = 0.0;
    }
}

impl NavigationAgent for GridAgent {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn warp(&mut self, position: Vec3) -> bool {
        if !self.grid.area_at(position).intersects(self.area_mask) {
            log::warn!("Warp target {:?} is off the navigation grid", position);
            return false;
        }
        self.position = position.with_y(self.grid.floor_height());
        self.clear_path();
        true
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn set_forward(&mut self, forward: Vec3) {
        let flat = forward.horizontal().normalize_or_zero();
        if flat != Vec3::ZERO {
            self.forward = flat;
        }
    }

    fn set_destination(&mut self, target: Vec3) -> bool {
        match self.calculate_path(target) {
            Some(path) => self.set_path(path),
            None => false,
        }
    }

    fn set_path(&mut self, path: NavPath) -> bool {
        if path.corners.is_empty() {
            return false;
        }
        self.path = Some(path);
        self.next_corner = 0;
        self.on_link = None;
        true
    }

    fn calculate_path(&self, target: Vec3) -> Option<NavPath> {
        self.grid.find_path(self.position, target, self.area_mask)
    }

    fn has_path(&self) -> bool {
        self.path.is_some()
    }

    fn remaining_distance(&self) -> f32 {
        let Some(path) = self.path.as_ref() else {
            return 0.0;
        };
        let Some(&next) = path.corners.get(self.next_corner) else {
            return 0.0;
        };
        let rest: f32 = path.corners[self.next_corner..]
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        self.position.distance(next) + rest
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    fn acceleration(&self) -> f32 {
        self.acceleration
    }

    fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration.max(0.0);
    }

    fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    fn set_angular_speed(&mut self, angular_speed: f32) {
        self.angular_speed = angular_speed.max(0.0);
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance.max(0.0);
    }

    fn area_mask(&self) -> AreaMask {
        self.area_mask
    }

    fn sample_path_area(&self, lookahead: f32) -> AreaMask {
        let Some(path) = self.path.as_ref() else {
            return self.grid.area_at(self.position);
        };

        let mut from = self.position;
        let mut left = lookahead.max(0.0);
        for &corner in path.corners.iter().skip(self.next_corner) {
            let span = from.distance(corner);
            if span >= left && span > 0.0 {
                return self.grid.area_at(from.lerp(corner, left / span));
            }
            left -= span;
            from = corner;
        }
        self.grid.area_at(from)
    }

    fn current_off_mesh_link(&self) -> Option<OffMeshLinkData> {
        let segment = self.on_link?;
        self.path
            .as_ref()
            .and_then(|p| p.link_at_segment(segment))
            .map(|l| l.link)
    }

    fn complete_off_mesh_link(&mut self) {
        let Some(segment) = self.on_link.take() else {
            return;
        };
        if let Some(exit) = self
            .path
            .as_ref()
            .and_then(|p| p.corners.get(segment + 1).copied())
        {
            self.position = exit;
            self.next_corner = segment + 2;
        }
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if self.stopped || self.on_link.is_some() {
            self.current_speed = 0.0;
            return;
        }

        let room = (self.remaining_distance() - self.stopping_distance).max(0.0);
        let Some(path) = self.path.as_ref() else {
            self.current_speed = 0.0;
            return;
        };
        if self.next_corner >= path.corners.len() || room <= 0.0 {
            self.current_speed = 0.0;
            return;
        }

        self.current_speed = (self.current_speed + self.acceleration * dt).min(self.speed);
        let mut budget = (self.current_speed * dt).min(room);
        let mut heading = None;

        while self.next_corner < path.corners.len() {
            let target = path.corners[self.next_corner];
            let offset = target - self.position;
            let distance = offset.length();

            if distance > budget {
                if budget > 0.0 {
                    self.position += offset * (budget / distance);
                    heading = Some(offset);
                }
                break;
            }

            budget -= distance;
            self.position = target;
            if distance > 0.0 {
                heading = Some(offset);
            }

            if path.link_at_segment(self.next_corner).is_some() {
                self.on_link = Some(self.next_corner);
                self.current_speed = 0.0;
                break;
            }
            self.next_corner += 1;
        }

        if let Some(dir) = heading {
            self.forward = self
                .forward
                .turn_towards(dir, radians(self.angular_speed) * dt);
        }
    }
}
