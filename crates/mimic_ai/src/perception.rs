//! Sight and hearing for one agent
//!
//! Sight is re-evaluated from scratch every tick. Hearing consumes sound
//! events queued on the agent's subscription since the previous tick; a
//! detected sound becomes the point of interest until a behavior clears it.

use crate::config::PerceptionConfig;
use crate::world::WorldContext;
use mimic_event::{BroadcastChannel, SoundEvent, Subscription};
use mimic_math::{degrees, Vec3};
use mimic_nav::AreaMask;

/// Tolerance on the view cone edge, in degrees
const CONE_EPSILON_DEGREES: f32 = 1e-3;

/// Output of one perception update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerceptionResult {
    pub has_target: bool,
    /// Last confirmed sighting
    pub target_position: Vec3,
    pub point_of_interest: Option<Vec3>,
}

/// Where the agent senses from this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPose {
    /// Feet position
    pub position: Vec3,
    pub forward: Vec3,
    /// Areas a sound path may cross
    pub area_mask: AreaMask,
}

pub struct PerceptionSystem {
    config: PerceptionConfig,
    result: PerceptionResult,
    sounds: Option<Subscription<SoundEvent>>,
}

impl PerceptionSystem {
    pub fn new(config: PerceptionConfig) -> Self {
        Self {
            config,
            result: PerceptionResult::default(),
            sounds: None,
        }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Start listening to world sounds
    pub fn activate(&mut self, sounds: &BroadcastChannel<SoundEvent>) {
        self.sounds = Some(sounds.subscribe());
    }

    /// Stop listening; queued sounds are discarded
    pub fn deactivate(&mut self) {
        self.sounds = None;
    }

    pub fn is_listening(&self) -> bool {
        self.sounds.is_some()
    }

    pub fn result(&self) -> &PerceptionResult {
        &self.result
    }

    pub fn clear_point_of_interest(&mut self) {
        if self.result.point_of_interest.take().is_some() {
            log::debug!("Point of interest cleared");
        }
    }

    /// Refresh sight, then process queued sounds
    pub fn update(&mut self, pose: SensorPose, world: &WorldContext) {
        match self.sight_check(pose, world) {
            Some(position) => {
                self.result.has_target = true;
                self.result.target_position = position;
            }
            None => self.result.has_target = false,
        }

        let heard: Vec<SoundEvent> = match &self.sounds {
            Some(sub) => sub.drain(),
            None => return,
        };
        for sound in heard {
            if self.can_hear(&sound, pose, world) {
                log::debug!("Heard sound at {:?} (volume {})", sound.origin, sound.volume);
                self.result.point_of_interest = Some(sound.origin);
            }
        }
    }

    /// Target position if any detection anchor is visible from `pose`
    pub fn sight_check(&self, pose: SensorPose, world: &WorldContext) -> Option<Vec3> {
        let target = &world.target;
        let eye = pose.position + Vec3::Y * self.config.eye_height;
        let target_position = target.position();

        let range = self.config.max_sight_range;
        if eye.distance_squared(target_position) > range * range || target.is_hidden() {
            return None;
        }

        let half_angle = self.config.view_angle * 0.5 + CONE_EPSILON_DEGREES;
        target
            .detection_anchors()
            .into_iter()
            .find(|&anchor| {
                if world.obstruction.linecast(eye, anchor) {
                    return false;
                }
                degrees(pose.forward.angle_between(anchor - eye)) <= half_angle
            })
            .map(|_| target_position)
    }

    /// Path-length hearing test for one sound
    pub fn can_hear(&self, sound: &SoundEvent, pose: SensorPose, world: &WorldContext) -> bool {
        let path = match world
            .nav
            .calculate_path(sound.origin, pose.position, pose.area_mask)
        {
            Some(path) if path.is_complete() => path,
            _ => return false,
        };

        let length = path.length();
        let loudness = sound.volume * self.config.hearing_sensitivity;
        loudness * loudness > length * length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ObstructionQuery, TargetableEntity};
    use mimic_nav::{NavPath, NavQuery, PathStatus};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Dummy {
        position: Mutex<Vec3>,
        hidden: Mutex<bool>,
    }

    impl Dummy {
        fn at(position: Vec3) -> Arc<Self> {
            Arc::new(Self {
                position: Mutex::new(position),
                hidden: Mutex::new(false),
            })
        }
    }

    impl TargetableEntity for Dummy {
        fn is_hidden(&self) -> bool {
            *self.hidden.lock()
        }

        fn position(&self) -> Vec3 {
            *self.position.lock()
        }

        fn detection_anchors(&self) -> Vec<Vec3> {
            vec![*self.position.lock()]
        }
    }

    /// Straight-line paths with a scripted length
    struct FixedPath {
        length: f32,
        status: PathStatus,
    }

    impl NavQuery for FixedPath {
        fn calculate_path(&self, from: Vec3, _to: Vec3, _mask: AreaMask) -> Option<NavPath> {
            let end = from + Vec3::X * self.length;
            Some(NavPath::new(vec![from, end], self.status))
        }

        fn sample_position(&self, point: Vec3, _max: f32, _mask: AreaMask) -> Option<Vec3> {
            Some(point)
        }
    }

    struct Wall;

    impl ObstructionQuery for Wall {
        fn linecast(&self, _from: Vec3, _to: Vec3) -> bool {
            true
        }
    }

    fn pose() -> SensorPose {
        SensorPose {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            area_mask: AreaMask::ALL,
        }
    }

    fn config() -> PerceptionConfig {
        PerceptionConfig::default()
            .with_max_sight_range(10.0)
            .with_view_angle(60.0)
            .with_eye_height(0.0)
    }

    fn world(target: Arc<Dummy>, path_length: f32) -> WorldContext {
        WorldContext::new(
            target,
            Arc::new(FixedPath {
                length: path_length,
                status: PathStatus::Complete,
            }),
        )
    }

    #[test]
    fn test_target_ahead_in_range_is_seen() {
        let world = world(Dummy::at(Vec3::new(0.0, 0.0, 5.0)), 0.0);
        let mut perception = PerceptionSystem::new(config());
        perception.update(pose(), &world);
        assert!(perception.result().has_target);
        assert_eq!(perception.result().target_position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_out_of_range_never_seen() {
        let world = world(Dummy::at(Vec3::new(0.0, 0.0, 10.01)), 0.0);
        let perception = PerceptionSystem::new(config());
        assert!(perception.sight_check(pose(), &world).is_none());
    }

    #[test]
    fn test_cone_edge_is_inclusive() {
        let perception = PerceptionSystem::new(config());
        let half = 30f32.to_radians();

        let edge = Vec3::new(half.sin(), 0.0, half.cos()) * 5.0;
        assert!(perception.sight_check(pose(), &world(Dummy::at(edge), 0.0)).is_some());

        let beyond = 30.5f32.to_radians();
        let outside = Vec3::new(beyond.sin(), 0.0, beyond.cos()) * 5.0;
        assert!(perception.sight_check(pose(), &world(Dummy::at(outside), 0.0)).is_none());
    }

    #[test]
    fn test_hidden_or_occluded_target_not_seen() {
        let target = Dummy::at(Vec3::new(0.0, 0.0, 3.0));
        let perception = PerceptionSystem::new(config());

        let blocked = world(target.clone(), 0.0).with_obstruction(Arc::new(Wall));
        assert!(perception.sight_check(pose(), &blocked).is_none());

        *target.hidden.lock() = true;
        assert!(perception.sight_check(pose(), &world(target, 0.0)).is_none());
    }

    #[test]
    fn test_losing_sight_keeps_last_position() {
        let target = Dummy::at(Vec3::new(0.0, 0.0, 4.0));
        let world = world(target.clone(), 0.0);
        let mut perception = PerceptionSystem::new(config());

        perception.update(pose(), &world);
        *target.position.lock() = Vec3::new(0.0, 0.0, -4.0);
        perception.update(pose(), &world);

        assert!(!perception.result().has_target);
        assert_eq!(perception.result().target_position, Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_hearing_uses_path_length() {
        let perception = PerceptionSystem::new(config());
        let sound = SoundEvent::new(Vec3::new(3.0, 0.0, 3.0), 10.0);
        let target = Dummy::at(Vec3::new(0.0, 0.0, -50.0));

        assert!(perception.can_hear(&sound, pose(), &world(target.clone(), 8.0)));
        assert!(!perception.can_hear(&sound, pose(), &world(target.clone(), 12.0)));
        // Equal is not louder
        assert!(!perception.can_hear(&sound, pose(), &world(target, 10.0)));
    }

    #[test]
    fn test_partial_path_is_inaudible() {
        let world = WorldContext::new(
            Dummy::at(Vec3::new(0.0, 0.0, -50.0)),
            Arc::new(FixedPath {
                length: 1.0,
                status: PathStatus::Partial,
            }),
        );
        let perception = PerceptionSystem::new(config());
        assert!(!perception.can_hear(&SoundEvent::new(Vec3::ZERO, 100.0), pose(), &world));
    }

    #[test]
    fn test_heard_sound_sets_point_of_interest() {
        let bus = BroadcastChannel::new();
        let world = world(Dummy::at(Vec3::new(0.0, 0.0, -50.0)), 5.0);
        let mut perception = PerceptionSystem::new(config());
        perception.activate(&bus);

        bus.publish(SoundEvent::new(Vec3::new(2.0, 0.0, 0.0), 1.0));
        bus.publish(SoundEvent::new(Vec3::new(4.0, 0.0, 0.0), 6.0));
        perception.update(pose(), &world);
        assert_eq!(perception.result().point_of_interest, Some(Vec3::new(4.0, 0.0, 0.0)));

        // Perception never clears it by itself
        perception.update(pose(), &world);
        assert!(perception.result().point_of_interest.is_some());
        perception.clear_point_of_interest();
        assert!(perception.result().point_of_interest.is_none());
    }

    #[test]
    fn test_deactivate_unsubscribes() {
        let bus: BroadcastChannel<SoundEvent> = BroadcastChannel::new();
        let mut perception = PerceptionSystem::new(config());
        perception.activate(&bus);
        assert_eq!(bus.subscriber_count(), 1);
        perception.deactivate();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
