//! Fixed-step scenario runner

use crate::config::{ScheduledSound, ScheduledStun, SimConfig};
use crate::level::{GridObstruction, Level};
use crate::report::{CatchRecord, SimReport};
use mimic_ai::{Mimic, StateChange, StunCapability, TargetableEntity, WorldContext};
use mimic_event::{BroadcastChannel, SimulationEvent, SoundEvent};
use mimic_math::Bounds;
use mimic_nav::GridAgent;
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;

pub struct Simulation {
    config: SimConfig,
    level: Level,
    mimic: Mimic,
    sounds: BroadcastChannel<SoundEvent>,
    simulation: BroadcastChannel<SimulationEvent>,
    transitions: Arc<Mutex<Vec<StateChange>>>,
    pending_sounds: Vec<ScheduledSound>,
    pending_stuns: Vec<ScheduledStun>,
    exit_zone: Option<Bounds>,
    catches: Vec<CatchRecord>,
    was_caught: bool,
    paused: bool,
    despawned_at: Option<f32>,
    time: f32,
    ticks_run: u32,
}

impl Simulation {
    /// Build the level and spawn an active agent
    pub fn new(config: SimConfig) -> Result<Self, Box<dyn Error>> {
        let level = Level::build(&config)?;

        let world = WorldContext::new(level.player.clone(), level.grid.clone())
            .with_obstruction(Arc::new(GridObstruction::new(level.grid.clone())))
            .with_traps(level.traps.clone())
            .with_vents(level.vents.clone())
            .with_stun(level.stun.clone())
            .with_mimicry(level.mimicry.clone())
            .with_save_sink(level.save.clone());

        let agent = GridAgent::new(level.grid.clone(), config.mimic_start);
        let mut mimic = Mimic::new(config.mimic.clone(), Box::new(agent), world)?;

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let log = transitions.clone();
        mimic.on_state_change(move |change| log.lock().push(*change));

        let sounds = BroadcastChannel::new();
        let simulation = BroadcastChannel::new();
        mimic.activate(&sounds, &simulation);

        // Drained from the back
        let mut pending_sounds = config.sounds.clone();
        pending_sounds.sort_by(|a, b| b.time.total_cmp(&a.time));
        let mut pending_stuns = config.stuns.clone();
        pending_stuns.sort_by(|a, b| b.time.total_cmp(&a.time));

        let exit_zone = config.exit_zone.map(|z| Bounds::new(z.centre, z.extents));

        Ok(Self {
            config,
            level,
            mimic,
            sounds,
            simulation,
            transitions,
            pending_sounds,
            pending_stuns,
            exit_zone,
            catches: Vec::new(),
            was_caught: false,
            paused: false,
            despawned_at: None,
            time: 0.0,
            ticks_run: 0,
        })
    }

    pub fn mimic(&self) -> &Mimic {
        &self.mimic
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_despawned(&self) -> bool {
        self.despawned_at.is_some()
    }

    fn update_pause(&mut self) {
        let paused = self.config.pauses.iter().any(|w| w.contains(self.time));
        if paused != self.paused {
            self.paused = paused;
            let event = if paused {
                SimulationEvent::PauseAll
            } else {
                SimulationEvent::ResumeAll
            };
            log::info!("{:?} at {:.2}s", event, self.time);
            self.simulation.publish(event);
        }
    }

    fn fire_due_stimuli(&mut self) {
        while self.pending_sounds.last().map_or(false, |s| s.time <= self.time) {
            if let Some(sound) = self.pending_sounds.pop() {
                log::debug!("Sound at {:?} (volume {})", sound.origin, sound.volume);
                self.sounds.publish(SoundEvent::new(sound.origin, sound.volume));
            }
        }
        while self.pending_stuns.last().map_or(false, |s| s.time <= self.time) {
            if let Some(stun) = self.pending_stuns.pop() {
                self.level.stun.apply_stun(stun.strength);
            }
        }
    }

    /// Advance the world and the agent by one fixed step
    pub fn step(&mut self) {
        let dt = self.config.dt;
        self.update_pause();

        if !self.paused {
            self.level.player.advance(self.time, dt);
            self.level.stun.recover(dt);
        }
        self.fire_due_stimuli();

        if !self.is_despawned() {
            self.mimic.tick(dt);
            self.record_catch();
            self.check_exit_zone();
        }

        self.time += dt;
        self.ticks_run += 1;
    }

    fn record_catch(&mut self) {
        let caught = self.mimic.has_caught_target();
        if caught && !self.was_caught {
            let record = CatchRecord {
                time: self.time,
                mimic_position: self.mimic.position(),
                player_position: self.level.player.position(),
            };
            log::info!("Target caught at {:.2}s", record.time);
            self.catches.push(record);
        }
        self.was_caught = caught;
    }

    fn check_exit_zone(&mut self) {
        let Some(zone) = self.exit_zone else {
            return;
        };
        if zone.contains(self.mimic.position()) {
            log::info!("Mimic reached the exit zone at {:.2}s", self.time);
            self.mimic.deactivate();
            self.despawned_at = Some(self.time);
        }
    }

    /// Run every configured tick and summarise
    pub fn run(&mut self) -> SimReport {
        while self.ticks_run < self.config.ticks {
            self.step();
        }
        self.report()
    }

    pub fn report(&self) -> SimReport {
        SimReport {
            scenario: self.config.name.clone(),
            ticks_run: self.ticks_run,
            simulated_seconds: self.time,
            transitions: self.transitions.lock().clone(),
            catches: self.catches.clone(),
            final_state: self.mimic.state(),
            final_save_category: self
                .level
                .save
                .category()
                .unwrap_or_else(|| self.mimic.save_category()),
            final_mimicry_strength: self.level.mimicry.strength(),
            final_position: self.mimic.position(),
            despawned_at: self.despawned_at,
        }
    }
}
