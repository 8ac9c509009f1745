//! Axis-aligned bounds described by centre and half extents

use crate::vector::Vec3;

/// Axis-aligned box stored as centre + half extents
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub centre: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    #[inline]
    pub const fn new(centre: Vec3, extents: Vec3) -> Self {
        Self { centre, extents }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.centre - self.extents
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.centre + self.extents
    }

    /// Full size along each axis
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    /// Check if a point lies inside (boundary inclusive)
    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x
            && point.x <= max.x
            && point.y >= min.y
            && point.y <= max.y
            && point.z >= min.z
            && point.z <= max.z
    }

    /// Map unit coordinates in `[0, 1]^3` to a point inside the box.
    ///
    /// Callers feed random unit samples to get uniform points.
    pub fn point_at(&self, unit: Vec3) -> Vec3 {
        self.min() + self.size() * unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let b = Bounds::new(Vec3::new(5.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(b.contains(Vec3::new(5.5, 0.0, 4.0)));
        assert!(b.contains(Vec3::new(6.0, 1.0, 6.0)));
        assert!(!b.contains(Vec3::new(6.1, 0.0, 5.0)));
    }

    #[test]
    fn test_point_at_corners() {
        let b = Bounds::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 3.0));
        assert_eq!(b.point_at(Vec3::ZERO), Vec3::new(-2.0, 0.0, -3.0));
        assert_eq!(b.point_at(Vec3::ONE), Vec3::new(2.0, 0.0, 3.0));
    }
}
