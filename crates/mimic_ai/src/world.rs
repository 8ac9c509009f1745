//! Collaborators the agent reads from or signals to
//!
//! Everything here is owned by the level, not the agent. The agent receives a
//! [`WorldContext`] at construction and only reads registries; the stun meter
//! is written by damage sources, never by the agent itself.

use mimic_math::Vec3;
use mimic_nav::NavQuery;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Something the agent can see and chase (the player)
pub trait TargetableEntity: Send + Sync {
    /// Target opted out of sight checks (hiding spot, locker)
    fn is_hidden(&self) -> bool;

    /// Root position, reported as the sighting position
    fn position(&self) -> Vec3;

    /// Points tested for occlusion and view cone, in priority order
    fn detection_anchors(&self) -> Vec<Vec3>;
}

/// Occlusion test against level geometry
pub trait ObstructionQuery: Send + Sync {
    /// True when something blocks the segment between the two points
    fn linecast(&self, from: Vec3, to: Vec3) -> bool;
}

/// Nothing ever blocks sight
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSpace;

impl ObstructionQuery for OpenSpace {
    fn linecast(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}

/// External stun state
pub trait StunCapability: Send + Sync {
    fn is_stunned(&self) -> bool;

    /// Called by damage sources
    fn apply_stun(&self, strength_delta: f32);
}

/// Receiver for the agent's mimicry strength signal
pub trait MimicryStrengthControl: Send + Sync {
    fn set_target_strength(&self, strength: f32);
}

/// Coarse state persisted by the save system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveCategory {
    Idle,
    Chasing,
}

/// Receives the save category after every transition
pub trait SaveCategorySink: Send + Sync {
    fn record(&self, category: SaveCategory);
}

/// Location where the agent can lie in wait
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapPoint {
    pub position: Vec3,
    /// Direction to face while waiting
    pub facing: Vec3,
}

impl TrapPoint {
    pub fn new(position: Vec3, facing: Vec3) -> Self {
        Self { position, facing }
    }
}

/// Level-owned set of trap points
#[derive(Debug, Default)]
pub struct TrapPointRegistry {
    points: RwLock<Vec<TrapPoint>>,
}

impl TrapPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, point: TrapPoint) {
        self.points.write().push(point);
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Points within `radius` of `position`, in registration order
    pub fn points_within_range(&self, position: Vec3, radius: f32) -> Vec<TrapPoint> {
        let radius_sq = radius * radius;
        self.points
            .read()
            .iter()
            .filter(|p| p.position.distance_squared(position) <= radius_sq)
            .copied()
            .collect()
    }
}

/// Vent with its set of entrances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vent {
    pub id: u32,
    pub entrances: Vec<Vec3>,
}

/// One entrance of one vent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VentEntrance {
    pub vent_id: u32,
    pub index: usize,
    pub position: Vec3,
}

/// Level-owned set of vents
#[derive(Debug, Default)]
pub struct VentRegistry {
    vents: RwLock<Vec<Vent>>,
}

impl VentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, vent: Vent) {
        self.vents.write().push(vent);
    }

    pub fn vent(&self, id: u32) -> Option<Vent> {
        self.vents.read().iter().find(|v| v.id == id).cloned()
    }

    /// Entrances within `radius` of `position`, vents in registration order
    pub fn entrances_within_range(&self, position: Vec3, radius: f32) -> Vec<VentEntrance> {
        let radius_sq = radius * radius;
        self.vents
            .read()
            .iter()
            .flat_map(|vent| {
                vent.entrances
                    .iter()
                    .enumerate()
                    .map(move |(index, &entrance)| VentEntrance {
                        vent_id: vent.id,
                        index,
                        position: entrance,
                    })
            })
            .filter(|e| e.position.distance_squared(position) <= radius_sq)
            .collect()
    }
}

/// Accumulating stun: stunned while strength remains
#[derive(Debug)]
pub struct StunMeter {
    strength: Mutex<f32>,
    recovery_rate: f32,
}

impl StunMeter {
    /// `recovery_rate` is strength drained per second by [`StunMeter::recover`]
    pub fn new(recovery_rate: f32) -> Self {
        Self {
            strength: Mutex::new(0.0),
            recovery_rate,
        }
    }

    pub fn strength(&self) -> f32 {
        *self.strength.lock()
    }

    /// Drain stun strength over time
    pub fn recover(&self, dt: f32) {
        let mut strength = self.strength.lock();
        *strength = (*strength - self.recovery_rate * dt).max(0.0);
    }

    pub fn clear(&self) {
        *self.strength.lock() = 0.0;
    }
}

impl Default for StunMeter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl StunCapability for StunMeter {
    fn is_stunned(&self) -> bool {
        *self.strength.lock() > 0.0
    }

    fn apply_stun(&self, strength_delta: f32) {
        let mut strength = self.strength.lock();
        *strength = (*strength + strength_delta).max(0.0);
        log::debug!("Stun applied ({:+}), strength now {}", strength_delta, *strength);
    }
}

/// Read-only view of the level handed to the agent
#[derive(Clone)]
pub struct WorldContext {
    pub target: Arc<dyn TargetableEntity>,
    pub obstruction: Arc<dyn ObstructionQuery>,
    pub nav: Arc<dyn NavQuery>,
    pub traps: Arc<TrapPointRegistry>,
    pub vents: Arc<VentRegistry>,
    pub stun: Arc<dyn StunCapability>,
    pub mimicry: Option<Arc<dyn MimicryStrengthControl>>,
    pub save_sink: Option<Arc<dyn SaveCategorySink>>,
}

impl WorldContext {
    /// Context with empty registries, an unstunnable meter and no signal sinks
    pub fn new(target: Arc<dyn TargetableEntity>, nav: Arc<dyn NavQuery>) -> Self {
        Self {
            target,
            obstruction: Arc::new(OpenSpace),
            nav,
            traps: Arc::new(TrapPointRegistry::new()),
            vents: Arc::new(VentRegistry::new()),
            stun: Arc::new(StunMeter::default()),
            mimicry: None,
            save_sink: None,
        }
    }

    pub fn with_obstruction(mut self, obstruction: Arc<dyn ObstructionQuery>) -> Self {
        self.obstruction = obstruction;
        self
    }

    pub fn with_traps(mut self, traps: Arc<TrapPointRegistry>) -> Self {
        self.traps = traps;
        self
    }

    pub fn with_vents(mut self, vents: Arc<VentRegistry>) -> Self {
        self.vents = vents;
        self
    }

    pub fn with_stun(mut self, stun: Arc<dyn StunCapability>) -> Self {
        self.stun = stun;
        self
    }

    pub fn with_mimicry(mut self, mimicry: Arc<dyn MimicryStrengthControl>) -> Self {
        self.mimicry = Some(mimicry);
        self
    }

    pub fn with_save_sink(mut self, sink: Arc<dyn SaveCategorySink>) -> Self {
        self.save_sink = Some(sink);
        self
    }

    /// Forward a mimicry strength change if anything listens
    pub fn set_mimicry_strength(&self, strength: f32) {
        if let Some(mimicry) = &self.mimicry {
            mimicry.set_target_strength(strength);
        }
    }
}
