//! Level built from a scenario: grid, registries and the scripted player

use crate::config::{PlayerConfig, SimConfig, TimeWindow};
use mimic_ai::{
    MimicryStrengthControl, ObstructionQuery, SaveCategory, SaveCategorySink, StunMeter,
    TargetableEntity, TrapPointRegistry, VentRegistry,
};
use mimic_math::Vec3;
use mimic_nav::{NavGrid, NavError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sight is blocked by any cell that is not navigable
#[derive(Debug, Clone)]
pub struct GridObstruction {
    grid: Arc<NavGrid>,
    step: f32,
}

impl GridObstruction {
    pub fn new(grid: Arc<NavGrid>) -> Self {
        let step = grid.cell_size() * 0.25;
        Self { grid, step }
    }
}

impl ObstructionQuery for GridObstruction {
    fn linecast(&self, from: Vec3, to: Vec3) -> bool {
        let span = to.horizontal() - from.horizontal();
        let length = span.length();
        let samples = (length / self.step).ceil().max(1.0) as usize;
        (0..=samples).any(|i| {
            let point = from + span * (i as f32 / samples as f32);
            self.grid.area_at(point).is_empty()
        })
    }
}

/// Player that walks a fixed route
pub struct ScriptedPlayer {
    position: Mutex<Vec3>,
    hidden: AtomicBool,
    route: Vec<Vec3>,
    next_waypoint: Mutex<usize>,
    speed: f32,
    hidden_windows: Vec<TimeWindow>,
}

impl ScriptedPlayer {
    pub fn new(config: &PlayerConfig) -> Self {
        let start = config.route.first().copied().unwrap_or_default();
        Self {
            position: Mutex::new(start),
            hidden: AtomicBool::new(false),
            route: config.route.clone(),
            next_waypoint: Mutex::new(1),
            speed: config.speed,
            hidden_windows: config.hidden.clone(),
        }
    }

    /// Walk towards the next waypoint and update hiding
    pub fn advance(&self, time: f32, dt: f32) {
        let hidden = self.hidden_windows.iter().any(|w| w.contains(time));
        if self.hidden.swap(hidden, Ordering::Relaxed) != hidden {
            log::debug!("Player {} at {:.2}s", if hidden { "hides" } else { "reveals" }, time);
        }

        let mut position = self.position.lock();
        let mut next = self.next_waypoint.lock();
        let mut budget = self.speed * dt;
        while budget > 0.0 {
            let Some(&waypoint) = self.route.get(*next) else {
                break;
            };
            let offset = waypoint - *position;
            let distance = offset.length();
            if distance > budget {
                *position += offset * (budget / distance);
                break;
            }
            *position = waypoint;
            budget -= distance;
            *next += 1;
        }
    }
}

impl TargetableEntity for ScriptedPlayer {
    fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::Relaxed)
    }

    fn position(&self) -> Vec3 {
        *self.position.lock()
    }

    fn detection_anchors(&self) -> Vec<Vec3> {
        let root = *self.position.lock();
        vec![root + Vec3::Y * 1.6, root + Vec3::Y * 0.9, root]
    }
}

/// Disguise strength requested by the agent
#[derive(Debug)]
pub struct MimicryDial {
    strength: Mutex<f32>,
}

impl Default for MimicryDial {
    fn default() -> Self {
        Self {
            strength: Mutex::new(1.0),
        }
    }
}

impl MimicryDial {
    pub fn strength(&self) -> f32 {
        *self.strength.lock()
    }
}

impl MimicryStrengthControl for MimicryDial {
    fn set_target_strength(&self, strength: f32) {
        log::debug!("Mimicry strength -> {:.2}", strength);
        *self.strength.lock() = strength;
    }
}

/// Last save category written by the agent
#[derive(Debug, Default)]
pub struct SaveSlot {
    category: Mutex<Option<SaveCategory>>,
}

impl SaveSlot {
    pub fn category(&self) -> Option<SaveCategory> {
        *self.category.lock()
    }
}

impl SaveCategorySink for SaveSlot {
    fn record(&self, category: SaveCategory) {
        *self.category.lock() = Some(category);
    }
}

/// Everything the scenario places in the world
pub struct Level {
    pub grid: Arc<NavGrid>,
    pub player: Arc<ScriptedPlayer>,
    pub traps: Arc<TrapPointRegistry>,
    pub vents: Arc<VentRegistry>,
    pub stun: Arc<StunMeter>,
    pub mimicry: Arc<MimicryDial>,
    pub save: Arc<SaveSlot>,
}

impl Level {
    pub fn build(config: &SimConfig) -> Result<Self, NavError> {
        let mut grid = NavGrid::from_rows(&config.map.rows, config.map.cell_size, config.map.origin)?;
        for link in &config.links {
            grid.add_link(link.start, link.end, link.kind)?;
        }

        let traps = Arc::new(TrapPointRegistry::new());
        for &trap in &config.traps {
            traps.register(trap);
        }

        let vents = Arc::new(VentRegistry::new());
        for vent in &config.vents {
            vents.register(vent.clone());
        }

        log::info!(
            "Level built: {}x{} grid, {} links, {} traps, {} vents",
            grid.width(),
            grid.depth(),
            config.links.len(),
            traps.len(),
            config.vents.len()
        );

        Ok(Self {
            grid: Arc::new(grid),
            player: Arc::new(ScriptedPlayer::new(&config.player)),
            traps,
            vents,
            stun: Arc::new(StunMeter::new(config.stun_recovery_rate)),
            mimicry: Arc::new(MimicryDial::default()),
            save: Arc::new(SaveSlot::default()),
        })
    }
}
