//! Behavior state machine
//!
//! One behavior is active at a time. Each tick the machine checks global
//! transitions, then the transition table of the current behavior only, and
//! finally runs the (possibly new) behavior's tick. Transitions run the old
//! behavior's exit before the new behavior's enter.

use crate::config::MimicConfig;
use crate::movement::MovementController;
use crate::perception::PerceptionSystem;
use crate::states::{
    ChaseState, PreparingToChaseState, SearchState, SetTrapState, StunnedState, VentState,
    WanderState,
};
use crate::world::{SaveCategory, WorldContext};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Behavior variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    Wander,
    PreparingToChase,
    Chase,
    Search,
    SetTrap,
    Stunned,
    Vent,
}

impl BehaviorKind {
    /// Coarse category persisted by the save system
    pub fn save_category(self) -> SaveCategory {
        match self {
            BehaviorKind::PreparingToChase | BehaviorKind::Chase => SaveCategory::Chasing,
            _ => SaveCategory::Idle,
        }
    }
}

/// Everything a behavior may read or drive during one call
pub struct BehaviorContext<'a> {
    pub dt: f32,
    /// Agent clock in seconds
    pub time: f32,
    pub perception: &'a mut PerceptionSystem,
    pub movement: &'a mut MovementController,
    pub world: &'a WorldContext,
    pub rng: &'a mut dyn RngCore,
}

/// A behavior variant
pub trait Behavior: Send {
    fn kind(&self) -> BehaviorKind;

    /// Called when the machine switches to this behavior
    fn enter(&mut self, ctx: &mut BehaviorContext<'_>);

    /// Called every tick while active
    fn tick(&mut self, ctx: &mut BehaviorContext<'_>);

    /// Called when the machine switches away
    fn exit(&mut self, ctx: &mut BehaviorContext<'_>);
}

/// Snapshot that transition conditions are evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitionContext {
    pub time: f32,
    pub stunned: bool,
    pub has_target: bool,
    pub has_point_of_interest: bool,
    pub reached_destination: bool,
    /// Wander's decision timer has elapsed this tick
    pub decision_ready: bool,
    /// Roll drawn for the trap decision (1.0 when no decision is due)
    pub trap_roll: f32,
    pub trap_probability: f32,
    pub trap_cooldown_ready: bool,
    /// Roll drawn for the vent decision (1.0 when no decision is due)
    pub vent_roll: f32,
    pub vent_probability: f32,
    pub vent_cooldown_ready: bool,
    pub can_start_chase: bool,
    pub mid_attack: bool,
    pub trap_finished: bool,
    pub vent_finished: bool,
}

/// Transition condition
pub type TransitionCondition = Box<dyn Fn(&TransitionContext) -> bool + Send + Sync>;

/// A state transition
pub struct Transition {
    /// Target behavior
    pub to: BehaviorKind,
    /// Condition function
    pub condition: TransitionCondition,
    /// Priority (higher = checked first)
    pub priority: i32,
}

impl Transition {
    pub fn new<F>(to: BehaviorKind, condition: F) -> Self
    where
        F: Fn(&TransitionContext) -> bool + Send + Sync + 'static,
    {
        Self {
            to,
            condition: Box::new(condition),
            priority: 0,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn should_transition(&self, context: &TransitionContext) -> bool {
        (self.condition)(context)
    }
}

/// Emitted after every transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: BehaviorKind,
    pub to: BehaviorKind,
    pub time: f32,
}

type StateObserver = Box<dyn FnMut(&StateChange) + Send>;

/// The seven behavior variants, owned by the machine
pub struct Behaviors {
    pub wander: WanderState,
    pub preparing_to_chase: PreparingToChaseState,
    pub chase: ChaseState,
    pub search: SearchState,
    pub set_trap: SetTrapState,
    pub stunned: StunnedState,
    pub vent: VentState,
}

impl Behaviors {
    pub fn new(config: &MimicConfig) -> Self {
        Self {
            wander: WanderState::new(config.wander.clone()),
            preparing_to_chase: PreparingToChaseState::new(config.preparing_to_chase.clone()),
            chase: ChaseState::new(config.chase.clone()),
            search: SearchState::new(config.search.clone()),
            set_trap: SetTrapState::new(config.set_trap.clone()),
            stunned: StunnedState::new(config.stunned.clone()),
            vent: VentState::new(config.vent.clone()),
        }
    }

    pub fn get_mut(&mut self, kind: BehaviorKind) -> &mut dyn Behavior {
        match kind {
            BehaviorKind::Wander => &mut self.wander,
            BehaviorKind::PreparingToChase => &mut self.preparing_to_chase,
            BehaviorKind::Chase => &mut self.chase,
            BehaviorKind::Search => &mut self.search,
            BehaviorKind::SetTrap => &mut self.set_trap,
            BehaviorKind::Stunned => &mut self.stunned,
            BehaviorKind::Vent => &mut self.vent,
        }
    }
}

/// Finite state machine over [`BehaviorKind`]
pub struct BehaviorStateMachine {
    current: BehaviorKind,
    previous: Option<BehaviorKind>,
    behaviors: Behaviors,
    transitions: HashMap<BehaviorKind, Vec<Transition>>,
    global_transitions: Vec<Transition>,
    observers: Vec<StateObserver>,
    save_category: SaveCategory,
    active: bool,
}

impl BehaviorStateMachine {
    /// Machine with the standard transition table; inactive until
    /// [`BehaviorStateMachine::activate`]
    pub fn new(config: &MimicConfig) -> Self {
        let mut machine = Self::empty(Behaviors::new(config));
        machine.install_default_transitions(config.enable_vent_travel);
        machine
    }

    /// Machine with no transitions at all
    pub fn empty(behaviors: Behaviors) -> Self {
        Self {
            current: BehaviorKind::Wander,
            previous: None,
            behaviors,
            transitions: HashMap::new(),
            global_transitions: Vec::new(),
            observers: Vec::new(),
            save_category: SaveCategory::Idle,
            active: false,
        }
    }

    fn install_default_transitions(&mut self, vent_travel: bool) {
        use BehaviorKind::*;

        self.add_global_transition(Stunned, |c| c.stunned);

        self.add_transition_priority(Wander, PreparingToChase, |c| c.has_target, 30);
        self.add_transition_priority(Wander, Search, |c| c.has_point_of_interest, 20);
        self.add_transition_priority(
            Wander,
            SetTrap,
            |c| c.decision_ready && c.trap_roll < c.trap_probability && c.trap_cooldown_ready,
            10,
        );
        if vent_travel {
            self.add_transition_priority(
                Wander,
                Vent,
                |c| c.decision_ready && c.vent_roll < c.vent_probability && c.vent_cooldown_ready,
                5,
            );
        }

        self.add_transition(Chase, Wander, |c| {
            !c.has_target && c.reached_destination && !c.mid_attack
        });

        self.add_transition_priority(Search, PreparingToChase, |c| c.has_target, 10);
        self.add_transition(Search, Wander, |c| !c.has_point_of_interest);

        self.add_transition(PreparingToChase, Chase, |c| c.can_start_chase);

        self.add_transition_priority(SetTrap, PreparingToChase, |c| c.has_target, 30);
        self.add_transition_priority(SetTrap, Search, |c| c.has_point_of_interest, 20);
        self.add_transition_priority(SetTrap, Wander, |c| c.trap_finished, 10);

        self.add_transition(Stunned, Wander, |c| !c.stunned);

        self.add_transition(Vent, Wander, |c| c.vent_finished);
    }

    /// Add a transition
    pub fn add_transition<F>(&mut self, from: BehaviorKind, to: BehaviorKind, condition: F)
    where
        F: Fn(&TransitionContext) -> bool + Send + Sync + 'static,
    {
        self.add_transition_priority(from, to, condition, 0);
    }

    /// Add a transition with priority
    pub fn add_transition_priority<F>(
        &mut self,
        from: BehaviorKind,
        to: BehaviorKind,
        condition: F,
        priority: i32,
    ) where
        F: Fn(&TransitionContext) -> bool + Send + Sync + 'static,
    {
        let list = self.transitions.entry(from).or_default();
        list.push(Transition::new(to, condition).with_priority(priority));
        // Stable sort keeps insertion order among equal priorities
        list.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Add a global transition (can occur from any state)
    pub fn add_global_transition<F>(&mut self, to: BehaviorKind, condition: F)
    where
        F: Fn(&TransitionContext) -> bool + Send + Sync + 'static,
    {
        self.global_transitions.push(Transition::new(to, condition));
    }

    /// Register a callback for every state change
    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn current(&self) -> BehaviorKind {
        self.current
    }

    pub fn previous(&self) -> Option<BehaviorKind> {
        self.previous
    }

    pub fn is_in(&self, kind: BehaviorKind) -> bool {
        self.current == kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn save_category(&self) -> SaveCategory {
        self.save_category
    }

    pub fn behaviors(&self) -> &Behaviors {
        &self.behaviors
    }

    /// Enter Wander and start ticking
    pub fn activate(&mut self, ctx: &mut BehaviorContext<'_>) {
        if self.active {
            return;
        }
        self.active = true;
        self.current = BehaviorKind::Wander;
        self.previous = None;
        self.behaviors.wander.enter(ctx);
        self.persist_category(BehaviorKind::Wander, ctx.world);
        log::info!("Mimic activated in {:?}", self.current);
    }

    /// Exit the current behavior and stop ticking
    pub fn deactivate(&mut self, ctx: &mut BehaviorContext<'_>) {
        if !self.active {
            return;
        }
        self.behaviors.get_mut(self.current).exit(ctx);
        self.active = false;
    }

    /// Switch immediately, bypassing the transition table. No-op while inactive.
    pub fn force_transition(&mut self, to: BehaviorKind, ctx: &mut BehaviorContext<'_>) {
        if !self.active {
            return;
        }
        let from = self.current;
        self.behaviors.get_mut(from).exit(ctx);
        self.previous = Some(from);
        self.current = to;
        self.behaviors.get_mut(to).enter(ctx);

        let change = StateChange {
            from,
            to,
            time: ctx.time,
        };
        log::info!("Mimic {:?} -> {:?} at {:.2}s", from, to, ctx.time);
        for observer in &mut self.observers {
            observer(&change);
        }
        self.persist_category(to, ctx.world);
    }

    fn persist_category(&mut self, kind: BehaviorKind, world: &WorldContext) {
        self.save_category = kind.save_category();
        if let Some(sink) = &world.save_sink {
            sink.record(self.save_category);
        }
    }

    /// Gather transition inputs; rolls are drawn only when Wander's decision is due
    pub fn transition_context(&self, ctx: &mut BehaviorContext<'_>) -> TransitionContext {
        let result = ctx.perception.result();
        let wander = &self.behaviors.wander;
        let decision_ready = self.current == BehaviorKind::Wander && wander.is_decision_ready();

        let (trap_roll, vent_roll) = if decision_ready {
            let trap: f32 = ctx.rng.gen();
            let vent: f32 = ctx.rng.gen();
            (trap, vent)
        } else {
            (1.0, 1.0)
        };

        TransitionContext {
            time: ctx.time,
            stunned: ctx.world.stun.is_stunned(),
            has_target: result.has_target,
            has_point_of_interest: result.point_of_interest.is_some(),
            reached_destination: ctx.movement.has_reached_destination(),
            decision_ready,
            trap_roll,
            trap_probability: wander.trap_probability(),
            trap_cooldown_ready: self.behaviors.set_trap.cooldown_elapsed(ctx.time),
            vent_roll,
            vent_probability: self.behaviors.vent.probability(),
            vent_cooldown_ready: self.behaviors.vent.cooldown_elapsed(ctx.time),
            can_start_chase: self.behaviors.preparing_to_chase.can_start_chase(),
            mid_attack: self.behaviors.chase.is_mid_attack(),
            trap_finished: self.behaviors.set_trap.is_finished(),
            vent_finished: self.behaviors.vent.is_finished(),
        }
    }

    /// Target of the first satisfied transition; global rules pre-empt local ones
    pub fn evaluate(&self, context: &TransitionContext) -> Option<BehaviorKind> {
        for transition in &self.global_transitions {
            if self.current != transition.to && transition.should_transition(context) {
                return Some(transition.to);
            }
        }

        self.transitions
            .get(&self.current)?
            .iter()
            .find(|t| t.should_transition(context))
            .map(|t| t.to)
    }

    /// Evaluate transitions, then tick the active behavior
    pub fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        if !self.active {
            return;
        }

        let context = self.transition_context(ctx);
        match self.evaluate(&context) {
            Some(to) => self.force_transition(to, ctx),
            None if context.decision_ready => self.behaviors.wander.reset_decision(ctx.rng),
            None => {}
        }

        self.behaviors.get_mut(self.current).tick(ctx);
    }
}
