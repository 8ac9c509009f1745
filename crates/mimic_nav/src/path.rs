//! Paths, area masks and off-mesh link descriptions

use mimic_math::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Bit set of navigation area types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaMask(pub u32);

impl AreaMask {
    pub const NONE: Self = Self(0);
    /// Regular floor
    pub const WALKABLE: Self = Self(1 << 0);
    /// Low clearance space (ducts, crawlspaces)
    pub const CRAWL: Self = Self(1 << 3);
    pub const ALL: Self = Self(u32::MAX);

    /// True when any bit is shared
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True when every bit of `other` is set
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AreaMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Whether a path reaches the requested goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    /// Last corner is the goal
    Complete,
    /// Goal unreachable; path ends at the closest reachable point
    Partial,
}

/// Kind of off-mesh connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    /// Ventilation duct; traversed with an interpolated crawl
    Vent,
    /// Any other shortcut, completed instantly
    Generic,
}

/// Endpoints of an off-mesh link as declared in the level.
///
/// `start`/`end` are the authored endpoints, not the traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffMeshLinkData {
    pub start: Vec3,
    pub end: Vec3,
    pub kind: LinkKind,
}

impl OffMeshLinkData {
    pub fn new(start: Vec3, end: Vec3, kind: LinkKind) -> Self {
        Self { start, end, kind }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Marks a path segment that crosses an off-mesh link.
///
/// The segment runs from `corners[segment]` to `corners[segment + 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLink {
    pub segment: usize,
    pub link: OffMeshLinkData,
}

/// Corner path produced by a navigation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPath {
    pub corners: Vec<Vec3>,
    pub status: PathStatus,
    pub links: Vec<PathLink>,
}

impl NavPath {
    pub fn new(corners: Vec<Vec3>, status: PathStatus) -> Self {
        Self {
            corners,
            status,
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<PathLink>) -> Self {
        self.links = links;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == PathStatus::Complete
    }

    pub fn last_corner(&self) -> Option<Vec3> {
        self.corners.last().copied()
    }

    /// Sum of Euclidean segment lengths between consecutive corners
    pub fn length(&self) -> f32 {
        self.corners
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }

    /// Link crossing the segment that starts at `corner`, if any
    pub fn link_at_segment(&self, corner: usize) -> Option<&PathLink> {
        self.links.iter().find(|l| l.segment == corner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_path_length_follows_corners() {
        let path = NavPath::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 4.0),
            ],
            PathStatus::Complete,
        );
        // Straight-line distance would be 5
        assert_relative_eq!(path.length(), 7.0);
        assert_eq!(path.last_corner(), Some(Vec3::new(3.0, 0.0, 4.0)));
    }

    #[test]
    fn test_single_corner_path_has_zero_length() {
        let path = NavPath::new(vec![Vec3::ZERO], PathStatus::Partial);
        assert_eq!(path.length(), 0.0);
        assert!(!path.is_complete());
    }

    #[test]
    fn test_area_mask_ops() {
        let both = AreaMask::WALKABLE | AreaMask::CRAWL;
        assert!(both.contains(AreaMask::CRAWL));
        assert!(both.intersects(AreaMask::WALKABLE));
        assert!(!AreaMask::WALKABLE.intersects(AreaMask::CRAWL));
        assert!(AreaMask::NONE.is_empty());
    }
}
