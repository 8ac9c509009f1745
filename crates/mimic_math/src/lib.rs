//! # mimic_math - Math primitives for the stalker AI
//!
//! Just enough linear algebra for perception cones, path lengths,
//! wander bounds and timed link traversal.

pub mod bounds;
pub mod curve;
pub mod vector;

pub use bounds::*;
pub use curve::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

pub mod prelude {
    pub use crate::bounds::Bounds;
    pub use crate::curve::{CurveKey, ProgressCurve};
    pub use crate::vector::Vec3;
    pub use crate::{clamp, degrees, lerp, radians};
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angle_conversions() {
        assert_relative_eq!(radians(180.0), consts::PI);
        assert_relative_eq!(degrees(consts::PI / 2.0), 90.0);
    }

    #[test]
    fn test_clamp_and_lerp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(lerp(2.0, 4.0, 0.25), 2.5);
    }
}
