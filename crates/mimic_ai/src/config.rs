//! Tunables for every subsystem of the agent
//!
//! Each section deserializes from TOML with per-field defaults, so a config
//! file only needs to name the values it changes.

use crate::error::{AiError, Result};
use mimic_math::{ProgressCurve, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sight and hearing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Maximum sight distance
    pub max_sight_range: f32,
    /// Full view cone angle in degrees
    pub view_angle: f32,
    /// Multiplier applied to sound volume before the path-length test
    pub hearing_sensitivity: f32,
    /// Height of the eyes above the agent's feet
    pub eye_height: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            max_sight_range: 15.0,
            view_angle: 110.0,
            hearing_sensitivity: 1.0,
            eye_height: 1.6,
        }
    }
}

impl PerceptionConfig {
    pub fn with_max_sight_range(mut self, range: f32) -> Self {
        self.max_sight_range = range;
        self
    }

    pub fn with_view_angle(mut self, degrees: f32) -> Self {
        self.view_angle = degrees;
        self
    }

    pub fn with_hearing_sensitivity(mut self, sensitivity: f32) -> Self {
        self.hearing_sensitivity = sensitivity;
        self
    }

    pub fn with_eye_height(mut self, height: f32) -> Self {
        self.eye_height = height;
        self
    }

    fn validate(&self) -> Result<()> {
        non_negative("perception.max_sight_range", self.max_sight_range)?;
        non_negative("perception.hearing_sensitivity", self.hearing_sensitivity)?;
        if !(self.view_angle > 0.0 && self.view_angle <= 360.0) {
            return Err(AiError::InvalidConfig(format!(
                "perception.view_angle must be in (0, 360], got {}",
                self.view_angle
            )));
        }
        Ok(())
    }
}

/// Navigation defaults and posture handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub speed: f32,
    pub acceleration: f32,
    /// Degrees per second
    pub angular_speed: f32,
    pub stopping_distance: f32,
    pub crouch_speed_multiplier: f32,
    pub crawl_speed_multiplier: f32,
    /// Minimum remaining distance that counts as arrived
    pub arrival_threshold: f32,
    /// How far ahead on the path the area type is sampled
    pub area_lookahead: f32,
    /// Delay after a vent crossing before another can start
    pub link_reentry_delay: f32,
    /// Progress over time while crossing a vent; its last key sets the duration
    pub link_curve: ProgressCurve,
    /// Samples tried when looking for a random point in bounds
    pub random_point_attempts: u32,
    /// Snap radius for random points
    pub sample_radius: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 3.5,
            acceleration: 8.0,
            angular_speed: 120.0,
            stopping_distance: 0.5,
            crouch_speed_multiplier: 0.6,
            crawl_speed_multiplier: 0.4,
            arrival_threshold: 0.1,
            area_lookahead: 0.5,
            link_reentry_delay: 0.5,
            link_curve: ProgressCurve::linear(1.5),
            random_point_attempts: 30,
            sample_radius: 2.0,
        }
    }
}

impl MovementConfig {
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_angular_speed(mut self, angular_speed: f32) -> Self {
        self.angular_speed = angular_speed;
        self
    }

    pub fn with_stopping_distance(mut self, distance: f32) -> Self {
        self.stopping_distance = distance;
        self
    }

    pub fn with_link_curve(mut self, curve: ProgressCurve) -> Self {
        self.link_curve = curve;
        self
    }

    pub fn with_link_reentry_delay(mut self, delay: f32) -> Self {
        self.link_reentry_delay = delay;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        non_negative("movement.speed", self.speed)?;
        non_negative("movement.acceleration", self.acceleration)?;
        non_negative("movement.angular_speed", self.angular_speed)?;
        non_negative("movement.stopping_distance", self.stopping_distance)?;
        non_negative("movement.crouch_speed_multiplier", self.crouch_speed_multiplier)?;
        non_negative("movement.crawl_speed_multiplier", self.crawl_speed_multiplier)?;
        non_negative("movement.arrival_threshold", self.arrival_threshold)?;
        non_negative("movement.link_reentry_delay", self.link_reentry_delay)?;
        non_negative("movement.sample_radius", self.sample_radius)?;
        if self.link_curve.is_empty() || self.link_curve.duration() <= 0.0 {
            return Err(AiError::InvalidConfig(
                "movement.link_curve needs keys spanning a positive duration".into(),
            ));
        }
        if self.random_point_attempts == 0 {
            return Err(AiError::InvalidConfig(
                "movement.random_point_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One wander area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanderRegionConfig {
    pub centre: Vec3,
    /// Half sizes
    pub extents: Vec3,
    /// Point whose reachability stands in for the whole region
    pub probe: Vec3,
}

impl WanderRegionConfig {
    pub fn new(centre: Vec3, extents: Vec3) -> Self {
        Self {
            centre,
            extents,
            probe: centre,
        }
    }

    pub fn with_probe(mut self, probe: Vec3) -> Self {
        self.probe = probe;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    pub decision_interval_min: f32,
    pub decision_interval_max: f32,
    /// Seconds between region reachability refreshes
    pub reachability_interval: f32,
    /// A probe path must end this close to the probe point
    pub reachability_radius: f32,
    pub trap_probability: f32,
    pub regions: Vec<WanderRegionConfig>,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            decision_interval_min: 4.0,
            decision_interval_max: 8.0,
            reachability_interval: 2.0,
            reachability_radius: 1.0,
            trap_probability: 0.2,
            regions: Vec::new(),
        }
    }
}

impl WanderConfig {
    pub fn with_decision_interval(mut self, min: f32, max: f32) -> Self {
        self.decision_interval_min = min;
        self.decision_interval_max = max;
        self
    }

    pub fn with_trap_probability(mut self, probability: f32) -> Self {
        self.trap_probability = probability;
        self
    }

    pub fn with_region(mut self, region: WanderRegionConfig) -> Self {
        self.regions.push(region);
        self
    }

    fn validate(&self) -> Result<()> {
        non_negative("wander.decision_interval_min", self.decision_interval_min)?;
        if self.decision_interval_max < self.decision_interval_min {
            return Err(AiError::InvalidConfig(format!(
                "wander.decision_interval_max ({}) is below decision_interval_min ({})",
                self.decision_interval_max, self.decision_interval_min
            )));
        }
        non_negative("wander.reachability_interval", self.reachability_interval)?;
        non_negative("wander.reachability_radius", self.reachability_radius)?;
        probability("wander.trap_probability", self.trap_probability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparingToChaseConfig {
    /// Seconds before the chase starts
    pub delay: f32,
    /// Mimicry strength while preparing
    pub mimicry_strength: f32,
    /// Turn rate while facing the target; falls back to the movement default
    pub turn_speed: Option<f32>,
}

impl Default for PreparingToChaseConfig {
    fn default() -> Self {
        Self {
            delay: 1.0,
            mimicry_strength: 0.5,
            turn_speed: Some(360.0),
        }
    }
}

impl PreparingToChaseConfig {
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    pub speed: f32,
    pub acceleration: f32,
    pub catch_radius: f32,
    /// Seconds the agent stands still after a catch
    pub attack_duration: f32,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            speed: 6.0,
            acceleration: 12.0,
            catch_radius: 0.75,
            attack_duration: 1.0,
        }
    }
}

impl ChaseConfig {
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_catch_radius(mut self, radius: f32) -> Self {
        self.catch_radius = radius;
        self
    }

    pub fn with_attack_duration(mut self, duration: f32) -> Self {
        self.attack_duration = duration;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Seconds between re-issuing the destination while searching
    pub repath_interval: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            repath_interval: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetTrapConfig {
    /// Trap points farther than this are ignored
    pub detection_radius: f32,
    /// Seconds to lie in wait once in position
    pub max_wait: f32,
    /// Minimum seconds between leaving SetTrap and entering it again
    pub cooldown: f32,
    pub turn_speed: Option<f32>,
}

impl Default for SetTrapConfig {
    fn default() -> Self {
        Self {
            detection_radius: 20.0,
            max_wait: 10.0,
            cooldown: 30.0,
            turn_speed: None,
        }
    }
}

impl SetTrapConfig {
    pub fn with_detection_radius(mut self, radius: f32) -> Self {
        self.detection_radius = radius;
        self
    }

    pub fn with_max_wait(mut self, seconds: f32) -> Self {
        self.max_wait = seconds;
        self
    }

    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StunnedConfig {
    /// Mimicry strength while stunned
    pub stunned_strength: f32,
    /// Mimicry strength restored on recovery
    pub recovered_strength: f32,
}

impl Default for StunnedConfig {
    fn default() -> Self {
        Self {
            stunned_strength: 0.0,
            recovered_strength: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VentConfig {
    /// Vent entrances farther than this are ignored
    pub search_radius: f32,
    pub cooldown: f32,
    /// Chance per Wander decision, only used with vent travel enabled
    pub probability: f32,
}

impl Default for VentConfig {
    fn default() -> Self {
        Self {
            search_radius: 25.0,
            cooldown: 45.0,
            probability: 0.1,
        }
    }
}

impl VentConfig {
    pub fn with_search_radius(mut self, radius: f32) -> Self {
        self.search_radius = radius;
        self
    }

    pub fn with_probability(mut self, probability: f32) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    /// Seed for the agent's random source
    pub seed: u64,
    /// Let Wander pick the Vent behavior on its decision roll
    pub enable_vent_travel: bool,
    pub perception: PerceptionConfig,
    pub movement: MovementConfig,
    pub wander: WanderConfig,
    pub preparing_to_chase: PreparingToChaseConfig,
    pub chase: ChaseConfig,
    pub search: SearchConfig,
    pub set_trap: SetTrapConfig,
    pub stunned: StunnedConfig,
    pub vent: VentConfig,
}

impl MimicConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::info!("Loading mimic config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_vent_travel(mut self, enabled: bool) -> Self {
        self.enable_vent_travel = enabled;
        self
    }

    pub fn with_perception(mut self, perception: PerceptionConfig) -> Self {
        self.perception = perception;
        self
    }

    pub fn with_movement(mut self, movement: MovementConfig) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_wander(mut self, wander: WanderConfig) -> Self {
        self.wander = wander;
        self
    }

    pub fn with_preparing_to_chase(mut self, config: PreparingToChaseConfig) -> Self {
        self.preparing_to_chase = config;
        self
    }

    pub fn with_chase(mut self, chase: ChaseConfig) -> Self {
        self.chase = chase;
        self
    }

    pub fn with_set_trap(mut self, set_trap: SetTrapConfig) -> Self {
        self.set_trap = set_trap;
        self
    }

    pub fn with_vent(mut self, vent: VentConfig) -> Self {
        self.vent = vent;
        self
    }

    /// Check every section for out-of-range values
    pub fn validate(&self) -> Result<()> {
        self.perception.validate()?;
        self.movement.validate()?;
        self.wander.validate()?;
        non_negative("preparing_to_chase.delay", self.preparing_to_chase.delay)?;
        non_negative("chase.speed", self.chase.speed)?;
        non_negative("chase.acceleration", self.chase.acceleration)?;
        non_negative("chase.catch_radius", self.chase.catch_radius)?;
        non_negative("chase.attack_duration", self.chase.attack_duration)?;
        non_negative("search.repath_interval", self.search.repath_interval)?;
        non_negative("set_trap.detection_radius", self.set_trap.detection_radius)?;
        non_negative("set_trap.max_wait", self.set_trap.max_wait)?;
        non_negative("set_trap.cooldown", self.set_trap.cooldown)?;
        non_negative("vent.search_radius", self.vent.search_radius)?;
        non_negative("vent.cooldown", self.vent.cooldown)?;
        probability("vent.probability", self.vent.probability)
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AiError::InvalidConfig(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )))
    }
}

fn probability(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AiError::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MimicConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MimicConfig::from_toml_str(
            r#"
            seed = 7

            [perception]
            view_angle = 90.0

            [[wander.regions]]
            centre = { x = 5.0, y = 0.0, z = 5.0 }
            extents = { x = 2.0, y = 1.0, z = 2.0 }
            probe = { x = 5.0, y = 0.0, z = 5.0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.perception.view_angle, 90.0);
        assert_eq!(config.perception.max_sight_range, 15.0);
        assert_eq!(config.wander.regions.len(), 1);
        assert!(!config.enable_vent_travel);
    }

    #[test]
    fn test_rejects_bad_view_angle() {
        let config = MimicConfig::default()
            .with_perception(PerceptionConfig::default().with_view_angle(0.0));
        assert!(matches!(config.validate(), Err(AiError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_inverted_decision_interval() {
        let config = MimicConfig::default()
            .with_wander(WanderConfig::default().with_decision_interval(5.0, 2.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_probability_out_of_range() {
        let config = MimicConfig::default()
            .with_wander(WanderConfig::default().with_trap_probability(1.5));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_link_curve() {
        let config = MimicConfig::default().with_movement(
            MovementConfig::default().with_link_curve(ProgressCurve::new(Vec::new())),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            MimicConfig::from_toml_str("seed = \"seven\""),
            Err(AiError::Toml(_))
        ));
    }
}
