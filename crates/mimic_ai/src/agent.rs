//! The Mimic agent: perception, movement and behaviors ticked in order

use crate::config::MimicConfig;
use crate::error::Result;
use crate::movement::MovementController;
use crate::perception::{PerceptionResult, PerceptionSystem, SensorPose};
use crate::state_machine::{
    BehaviorContext, BehaviorKind, BehaviorStateMachine, Behaviors, StateChange,
};
use crate::world::{SaveCategory, WorldContext};
use mimic_event::{BroadcastChannel, SimulationEvent, SoundEvent, Subscription};
use mimic_math::Vec3;
use mimic_nav::NavigationAgent;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// One stalker NPC
pub struct Mimic {
    perception: PerceptionSystem,
    movement: MovementController,
    machine: BehaviorStateMachine,
    world: WorldContext,
    rng: Box<dyn RngCore + Send>,
    sim_events: Option<Subscription<SimulationEvent>>,
    time: f32,
    active: bool,
    paused: bool,
    stopped_before_pause: bool,
}

impl Mimic {
    /// Validate `config` and wire the subsystems together
    pub fn new(
        config: MimicConfig,
        agent: Box<dyn NavigationAgent>,
        world: WorldContext,
    ) -> Result<Self> {
        config.validate()?;
        let movement = MovementController::new(agent, world.nav.clone(), config.movement.clone())?;

        Ok(Self {
            perception: PerceptionSystem::new(config.perception.clone()),
            movement,
            machine: BehaviorStateMachine::new(&config),
            world,
            rng: Box::new(SmallRng::seed_from_u64(config.seed)),
            sim_events: None,
            time: 0.0,
            active: false,
            paused: false,
            stopped_before_pause: false,
        })
    }

    /// Replace the random source
    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    /// Replace the behaviors and transition table
    pub fn with_state_machine(mut self, machine: BehaviorStateMachine) -> Self {
        self.machine = machine;
        self
    }

    fn split(&mut self, dt: f32) -> (&mut BehaviorStateMachine, BehaviorContext<'_>) {
        let Self {
            perception,
            movement,
            machine,
            world,
            rng,
            time,
            ..
        } = self;
        let ctx = BehaviorContext {
            dt,
            time: *time,
            perception,
            movement,
            world,
            rng: &mut **rng,
        };
        (machine, ctx)
    }

    /// Subscribe to world channels and enter Wander
    pub fn activate(
        &mut self,
        sounds: &BroadcastChannel<SoundEvent>,
        simulation: &BroadcastChannel<SimulationEvent>,
    ) {
        if self.active {
            return;
        }
        self.perception.activate(sounds);
        self.sim_events = Some(simulation.subscribe());
        self.active = true;

        let (machine, mut ctx) = self.split(0.0);
        machine.activate(&mut ctx);
    }

    /// Drop subscriptions, abort any vent crossing and stop moving
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.perception.deactivate();
        self.sim_events = None;
        self.movement.interrupt_link_traversal();

        let (machine, mut ctx) = self.split(0.0);
        machine.deactivate(&mut ctx);

        self.movement.set_is_stopped(true);
        self.active = false;
        self.paused = false;
        log::info!("Mimic deactivated");
    }

    fn handle_simulation_events(&mut self) {
        let events = match &self.sim_events {
            Some(sub) => sub.drain(),
            None => return,
        };
        for event in events {
            match event {
                SimulationEvent::PauseAll if !self.paused => {
                    self.stopped_before_pause = self.movement.is_stopped();
                    self.movement.set_is_stopped(true);
                    self.paused = true;
                    log::debug!("Mimic paused");
                }
                SimulationEvent::ResumeAll if self.paused => {
                    self.movement.set_is_stopped(self.stopped_before_pause);
                    self.paused = false;
                    log::debug!("Mimic resumed");
                }
                _ => {}
            }
        }
    }

    /// Advance one simulation tick
    pub fn tick(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.handle_simulation_events();
        if self.paused {
            return;
        }
        self.time += dt;

        let pose = SensorPose {
            position: self.movement.position(),
            forward: self.movement.forward(),
            area_mask: self.movement.area_mask(),
        };
        self.perception.update(pose, &self.world);
        self.movement.update(dt);

        let (machine, mut ctx) = self.split(dt);
        machine.tick(&mut ctx);
    }

    /// Switch behavior immediately, bypassing the transition table.
    /// Ignored until the agent is activated.
    pub fn force_state(&mut self, to: BehaviorKind) {
        if !self.active {
            log::debug!("Ignoring forced {:?} on inactive agent", to);
            return;
        }
        let (machine, mut ctx) = self.split(0.0);
        machine.force_transition(to, &mut ctx);
    }

    /// Register a callback for every state change
    pub fn on_state_change<F>(&mut self, observer: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.machine.add_observer(observer);
    }

    pub fn state(&self) -> BehaviorKind {
        self.machine.current()
    }

    pub fn save_category(&self) -> SaveCategory {
        self.machine.save_category()
    }

    pub fn behaviors(&self) -> &Behaviors {
        self.machine.behaviors()
    }

    /// Chase reached the target during the current or last chase
    pub fn has_caught_target(&self) -> bool {
        self.machine.behaviors().chase.is_caught()
    }

    pub fn perception(&self) -> &PerceptionResult {
        self.perception.result()
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut MovementController {
        &mut self.movement
    }

    pub fn position(&self) -> Vec3 {
        self.movement.position()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
