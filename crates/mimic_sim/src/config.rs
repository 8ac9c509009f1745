//! Scenario configuration
//!
//! A scenario describes the level, the player's route, scheduled stimuli and
//! the agent tuning. It is resolved from, in priority order:
//!
//! 1. The first positional command line argument
//! 2. Environment variable: `MIMIC_SIM_CONFIG=path/to/scenario.toml`
//! 3. The built-in corridor scenario
//!
//! # Example
//!
//! ```toml
//! name = "corridor"
//! ticks = 600
//! dt = 0.033
//! mimic_start = { x = 0.5, y = 0.0, z = 0.5 }
//!
//! [map]
//! rows = ["..........", "....##....", ".........."]
//! cell_size = 1.0
//!
//! [player]
//! speed = 1.5
//! route = [{ x = 9.5, y = 0.0, z = 2.5 }, { x = 0.5, y = 0.0, z = 2.5 }]
//!
//! [[sounds]]
//! time = 2.0
//! origin = { x = 6.5, y = 0.0, z = 0.5 }
//! volume = 10.0
//!
//! [mimic.chase]
//! speed = 5.0
//! ```

use mimic_ai::{MimicConfig, TrapPoint, Vent};
use mimic_math::Vec3;
use mimic_nav::LinkKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Environment variable naming the scenario file
pub const CONFIG_ENV: &str = "MIMIC_SIM_CONFIG";

/// Level layout as grid rows (`.` walkable, `~` crawl, `#` blocked)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub rows: Vec<String>,
    pub cell_size: f32,
    pub origin: Vec3,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            rows: vec![
                "............".to_string(),
                "....####....".to_string(),
                "............".to_string(),
            ],
            cell_size: 1.0,
            origin: Vec3::ZERO,
        }
    }
}

/// Off-mesh connection between two walkable points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub start: Vec3,
    pub end: Vec3,
    pub kind: LinkKind,
}

/// Scripted player
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Waypoints walked in order; the player stays at the last one
    pub route: Vec<Vec3>,
    /// Metres per second
    pub speed: f32,
    /// Hidden from sight between these times (seconds)
    pub hidden: Vec<TimeWindow>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            route: vec![Vec3::new(11.5, 0.0, 2.5), Vec3::new(0.5, 0.0, 2.5)],
            speed: 1.0,
            hidden: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f32,
    pub end: f32,
}

impl TimeWindow {
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start && time < self.end
    }
}

/// Sound published on the bus at `time`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScheduledSound {
    pub time: f32,
    pub origin: Vec3,
    pub volume: f32,
}

/// Stun strength added at `time`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScheduledStun {
    pub time: f32,
    pub strength: f32,
}

/// Axis-aligned region that despawns the agent on entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitZone {
    pub centre: Vec3,
    pub extents: Vec3,
}

/// Complete scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    /// Number of fixed steps to run
    pub ticks: u32,
    /// Seconds per step
    pub dt: f32,
    pub map: MapConfig,
    pub links: Vec<LinkConfig>,
    pub vents: Vec<Vent>,
    pub traps: Vec<TrapPoint>,
    pub mimic_start: Vec3,
    pub player: PlayerConfig,
    pub sounds: Vec<ScheduledSound>,
    pub stuns: Vec<ScheduledStun>,
    /// Stun strength drained per second
    pub stun_recovery_rate: f32,
    /// Simulation-wide pause windows (PauseAll / ResumeAll)
    pub pauses: Vec<TimeWindow>,
    pub exit_zone: Option<ExitZone>,
    pub mimic: MimicConfig,
    /// Scenario file, for reporting
    #[serde(skip)]
    pub source: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "corridor".to_string(),
            ticks: 900,
            dt: 1.0 / 30.0,
            map: MapConfig::default(),
            links: Vec::new(),
            vents: Vec::new(),
            traps: Vec::new(),
            mimic_start: Vec3::new(0.5, 0.0, 0.5),
            player: PlayerConfig::default(),
            sounds: vec![ScheduledSound {
                time: 1.0,
                origin: Vec3::new(6.5, 0.0, 0.5),
                volume: 10.0,
            }],
            stuns: Vec::new(),
            stun_recovery_rate: 1.0,
            pauses: Vec::new(),
            exit_zone: None,
            mimic: MimicConfig::default(),
            source: None,
        }
    }
}

impl SimConfig {
    /// Resolve the scenario from the command line, the environment or defaults
    pub fn load() -> Result<Self, Box<dyn Error>> {
        // First non-flag argument is the scenario path
        let from_args = std::env::args().skip(1).find(|arg| !arg.starts_with("--"));
        if let Some(path) = from_args {
            log::info!("Scenario from args: {}", path);
            return Self::load_from_file(&path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                log::info!("Scenario from env: {}", path);
                return Self::load_from_file(&path);
            }
        }

        log::info!("No scenario given, using built-in defaults");
        Ok(Self::default())
    }

    /// Load a scenario from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.display().to_string());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject scenarios the runner cannot execute
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(format!("dt must be positive, got {}", self.dt).into());
        }
        if self.map.rows.is_empty() {
            return Err("map.rows must not be empty".into());
        }
        if self.player.speed < 0.0 {
            return Err(format!("player.speed must be non-negative, got {}", self.player.speed).into());
        }
        self.mimic.validate()?;
        Ok(())
    }

    /// Print a human-readable summary
    pub fn print_summary(&self) {
        log::info!("=== Scenario: {} ===", self.name);
        if let Some(source) = &self.source {
            log::info!("  Source: {}", source);
        }
        log::info!(
            "  Map: {}x{} cells @ {}m",
            self.map.rows.first().map_or(0, |r| r.chars().count()),
            self.map.rows.len(),
            self.map.cell_size
        );
        log::info!("  Ticks: {} @ {:.3}s", self.ticks, self.dt);
        log::info!(
            "  Stimuli: {} sounds, {} stuns, {} pauses",
            self.sounds.len(),
            self.stuns.len(),
            self.pauses.len()
        );
        log::info!(
            "  Level: {} traps, {} vents, {} links",
            self.traps.len(),
            self.vents.len(),
            self.links.len()
        );
    }
}
