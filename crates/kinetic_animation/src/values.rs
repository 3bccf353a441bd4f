//! Animatable value types
//!
//! Provides the [`Interpolate`] trait, keyframe tracks sampled at a progress
//! value, and linear ranges used to map scroll progress onto visual
//! properties.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal (for settling detection)
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// f32 Implementation
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

// ============================================================================
// Keyframe Tracks
// ============================================================================

/// A keyframe holding a value of type T
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    /// Position on the track (0.0 to 1.0)
    pub time: f32,
    /// Value at this keyframe
    pub value: T,
    /// Easing when transitioning TO this keyframe
    #[serde(default)]
    pub easing: Easing,
}

impl<T: Interpolate> Keyframe<T> {
    pub fn new(time: f32, value: T, easing: Easing) -> Self {
        Self {
            time: time.clamp(0.0, 1.0),
            value,
            easing,
        }
    }

    /// Create a keyframe with linear easing
    pub fn linear(time: f32, value: T) -> Self {
        Self::new(time, value, Easing::Linear)
    }
}

/// Keyframes sorted by time, sampled at a progress value
///
/// Unlike a running animation this holds no clock; the owning effect decides
/// what progress to sample at.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframes<T: Interpolate> {
    frames: Vec<Keyframe<T>>,
}

impl<T: Interpolate> Keyframes<T> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Add a keyframe (builder pattern)
    pub fn keyframe(mut self, time: f32, value: T, easing: Easing) -> Self {
        self.insert(Keyframe::new(time, value, easing));
        self
    }

    /// Add a keyframe with linear easing
    pub fn at(self, time: f32, value: T) -> Self {
        self.keyframe(time, value, Easing::Linear)
    }

    fn insert(&mut self, frame: Keyframe<T>) {
        let index = self.frames.partition_point(|kf| kf.time <= frame.time);
        self.frames.insert(index, frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sample at a specific progress (0.0 to 1.0)
    pub fn sample_at(&self, progress: f32) -> Option<T> {
        let first = self.frames.first()?;
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        let mut prev_kf = first;
        let mut next_kf = first;

        for kf in &self.frames {
            if kf.time <= progress {
                prev_kf = kf;
            }
            if kf.time >= progress {
                next_kf = kf;
                break;
            }
        }

        if (prev_kf.time - next_kf.time).abs() < f32::EPSILON {
            return Some(prev_kf.value.clone());
        }

        let local_progress = (progress - prev_kf.time) / (next_kf.time - prev_kf.time);
        let eased = next_kf.easing.apply(local_progress);

        Some(prev_kf.value.lerp(&next_kf.value, eased))
    }
}

impl<T: Interpolate> Default for Keyframes<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interpolate> FromIterator<Keyframe<T>> for Keyframes<T> {
    fn from_iter<I: IntoIterator<Item = Keyframe<T>>>(iter: I) -> Self {
        let mut keyframes = Self::new();
        for frame in iter {
            keyframes.insert(frame);
        }
        keyframes
    }
}

// ============================================================================
// Linear Ranges
// ============================================================================

/// Maps progress in [0, 1] onto `from..=to`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRange {
    pub from: f32,
    pub to: f32,
}

impl LinearRange {
    pub fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    /// A range that always yields `value`
    pub fn constant(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Value at progress `t` (clamped)
    pub fn at(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self.from.lerp(&self.to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Pair(f32, f32);

    impl Interpolate for Pair {
        fn lerp(&self, other: &Self, t: f32) -> Self {
            Pair(self.0.lerp(&other.0, t), self.1.lerp(&other.1, t))
        }

        fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
            self.0.approx_eq(&other.0, epsilon) && self.1.approx_eq(&other.1, epsilon)
        }
    }

    #[test]
    fn test_float_interpolation() {
        assert!((0.0_f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0_f32.lerp(&20.0, 0.25) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_keyframes_sample() {
        let track = Keyframes::new()
            .at(0.0, Pair(0.0, 10.0))
            .at(0.5, Pair(50.0, 5.0))
            .at(1.0, Pair(100.0, 0.0));

        assert!(track.sample_at(0.0).unwrap().approx_eq(&Pair(0.0, 10.0), 1e-4));
        assert!(track.sample_at(0.25).unwrap().approx_eq(&Pair(25.0, 7.5), 1e-4));
        assert!(track.sample_at(0.5).unwrap().approx_eq(&Pair(50.0, 5.0), 1e-4));
        assert!(track.sample_at(1.0).unwrap().approx_eq(&Pair(100.0, 0.0), 1e-4));
    }

    #[test]
    fn test_keyframes_sorted_on_insert() {
        let track = Keyframes::new().at(1.0, 100.0_f32).at(0.0, 0.0);
        assert!((track.sample_at(0.5).unwrap() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_keyframes_clamp_and_empty() {
        let empty: Keyframes<f32> = Keyframes::new();
        assert_eq!(empty.sample_at(0.5), None);

        let track = Keyframes::new().at(0.2, 1.0_f32).at(0.8, 2.0);
        assert_eq!(track.sample_at(0.0), Some(1.0));
        assert_eq!(track.sample_at(1.0), Some(2.0));
        assert_eq!(track.sample_at(f32::NAN), Some(1.0));
    }

    #[test]
    fn test_segment_easing_applies_to_target_frame() {
        let track = Keyframes::new()
            .at(0.0, 0.0_f32)
            .keyframe(1.0, 100.0, Easing::EaseInQuad);
        assert!((track.sample_at(0.5).unwrap() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_range() {
        let blur = LinearRange::new(8.0, 0.0);
        assert_eq!(blur.at(0.0), 8.0);
        assert_eq!(blur.at(1.0), 0.0);
        assert!((blur.at(0.25) - 6.0).abs() < 1e-5);
        assert_eq!(blur.at(4.0), 0.0);
        assert_eq!(LinearRange::constant(1.0).at(0.3), 1.0);
    }
}
