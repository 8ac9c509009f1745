//! JSON run report

use mimic_ai::{BehaviorKind, SaveCategory, StateChange};
use mimic_math::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatchRecord {
    pub time: f32,
    pub mimic_position: Vec3,
    pub player_position: Vec3,
}

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub scenario: String,
    pub ticks_run: u32,
    pub simulated_seconds: f32,
    /// Times are agent time, which excludes paused ticks
    pub transitions: Vec<StateChange>,
    pub catches: Vec<CatchRecord>,
    pub final_state: BehaviorKind,
    pub final_save_category: SaveCategory,
    /// Disguise strength last requested by the agent
    pub final_mimicry_strength: f32,
    pub final_position: Vec3,
    /// Simulation time at which the agent entered the exit zone
    pub despawned_at: Option<f32>,
}

impl SimReport {
    /// Count of entries into `kind`
    pub fn entries_into(&self, kind: BehaviorKind) -> usize {
        self.transitions.iter().filter(|t| t.to == kind).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
