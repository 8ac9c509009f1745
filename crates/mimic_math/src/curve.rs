//! Keyframed progress curves
//!
//! A [`ProgressCurve`] maps elapsed time to an interpolation factor. The
//! curve's duration is the time of its last key, so authoring a slower curve
//! also lengthens whatever sequence it drives.

/// Single keyframe
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear curve over sorted keys
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressCurve {
    keys: Vec<CurveKey>,
}

impl Default for ProgressCurve {
    fn default() -> Self {
        Self::linear(1.0)
    }
}

impl ProgressCurve {
    /// Build from keys; they are sorted by time.
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Straight 0 -> 1 ramp over `duration` seconds
    pub fn linear(duration: f32) -> Self {
        Self::new(vec![CurveKey::new(0.0, 0.0), CurveKey::new(duration, 1.0)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the last key (0 for an empty curve)
    pub fn duration(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Sample the curve, clamping outside the key range
    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if time <= b.time {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    return b.value;
                }
                return crate::lerp(a.value, b.value, (time - a.time) / span);
            }
        }

        last.value
    }
}
