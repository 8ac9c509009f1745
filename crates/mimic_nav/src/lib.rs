//! # mimic_nav - Navigation for the stalker AI
//!
//! The AI core only talks to the [`NavigationAgent`] and [`NavQuery`]
//! traits. [`NavGrid`] and [`GridAgent`] are a reference backend: a uniform
//! grid with area types, A* pathfinding and off-mesh links, used by the
//! simulation runner and the scenario tests.

pub mod error;
pub mod grid;
pub mod grid_agent;
pub mod navigator;
pub mod path;

pub use error::{NavError, Result};
pub use grid::NavGrid;
pub use grid_agent::GridAgent;
pub use navigator::{NavQuery, NavigationAgent};
pub use path::{AreaMask, LinkKind, NavPath, OffMeshLinkData, PathLink, PathStatus};

/// Prelude
pub mod prelude {
    pub use crate::grid::NavGrid;
    pub use crate::grid_agent::GridAgent;
    pub use crate::navigator::{NavQuery, NavigationAgent};
    pub use crate::path::{AreaMask, LinkKind, NavPath, OffMeshLinkData, PathStatus};
}
