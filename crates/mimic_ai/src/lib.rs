//! # mimic_ai - Stalker AI core
//!
//! Drives one stalking NPC each tick in a fixed order:
//!
//! 1. [`PerceptionSystem`] refreshes sight and processes queued sounds
//! 2. [`MovementController`] derives posture and pushes speeds to the
//!    navigation agent, crossing vent links on its own
//! 3. [`BehaviorStateMachine`] checks the global stun rule, then the current
//!    behavior's transitions, then ticks the active behavior
//!
//! # Example
//!
//! ```ignore
//! use mimic_ai::prelude::*;
//!
//! let world = WorldContext::new(player, grid.clone());
//! let mut mimic = Mimic::new(MimicConfig::default(), Box::new(agent), world)?;
//! mimic.activate(&sounds, &simulation);
//! mimic.tick(1.0 / 30.0);
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod movement;
pub mod perception;
pub mod state_machine;
pub mod states;
pub mod world;

pub use error::{AiError, Result};

pub mod prelude {
    pub use crate::agent::Mimic;
    pub use crate::config::{
        ChaseConfig, MimicConfig, MovementConfig, PerceptionConfig, PreparingToChaseConfig,
        SearchConfig, SetTrapConfig, StunnedConfig, VentConfig, WanderConfig, WanderRegionConfig,
    };
    pub use crate::movement::{MovementController, MovementState, SpeedOverrideSet};
    pub use crate::perception::{PerceptionResult, PerceptionSystem, SensorPose};
    pub use crate::state_machine::{
        Behavior, BehaviorContext, BehaviorKind, BehaviorStateMachine, StateChange,
        TransitionContext,
    };
    pub use crate::world::{
        MimicryStrengthControl, ObstructionQuery, SaveCategory, SaveCategorySink,
        StunCapability, StunMeter, TargetableEntity, TrapPoint, TrapPointRegistry, Vent,
        VentRegistry, WorldContext,
    };
}

pub use prelude::*;
