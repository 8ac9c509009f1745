//! Behavior variants driven by the state machine

mod chase;
mod preparing_to_chase;
mod search;
mod set_trap;
mod stunned;
mod vent;
mod wander;

pub use chase::ChaseState;
pub use preparing_to_chase::PreparingToChaseState;
pub use search::SearchState;
pub use set_trap::SetTrapState;
pub use stunned::StunnedState;
pub use vent::VentState;
pub use wander::{WanderRegion, WanderState};
