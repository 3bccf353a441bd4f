//! Easing functions
//!
//! Maps linear progress `t` in [0, 1] to eased progress. The CSS keywords use
//! their standard cubic-bezier definitions.

use serde::{Deserialize, Serialize};

/// An easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// CSS `ease-in`
    EaseIn,
    /// CSS `ease-out`
    EaseOut,
    /// CSS `ease-in-out`
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    /// Custom cubic-bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the easing to linear progress (clamped to [0, 1])
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match *self {
            Easing::Linear => t,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }

    /// Whether the curve never decreases
    ///
    /// Curves that overshoot (bezier control points outside [0, 1]) can move
    /// backwards, which matters when they space out reveal order.
    pub fn is_monotonic(&self) -> bool {
        match *self {
            Easing::CubicBezier(_, y1, _, y2) => {
                (0.0..=1.0).contains(&y1) && (0.0..=1.0).contains(&y2)
            }
            _ => true,
        }
    }
}

/// Evaluate a CSS-style cubic bezier at horizontal position `x`
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Control x values outside [0, 1] make the curve non-functional
    let x1 = x1.clamp(0.0, 1.0);
    let x2 = x2.clamp(0.0, 1.0);

    let bezier = |p1: f32, p2: f32, t: f32| {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    };
    let slope = |p1: f32, p2: f32, t: f32| {
        let u = 1.0 - t;
        3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    };

    // Newton-Raphson first, bisection if the slope flattens out
    let mut t = x;
    for _ in 0..8 {
        let err = bezier(x1, x2, t) - x;
        if err.abs() < 1e-6 {
            return bezier(y1, y2, t);
        }
        let d = slope(x1, x2, t);
        if d.abs() < 1e-6 {
            break;
        }
        t = (t - err / d).clamp(0.0, 1.0);
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    t = x;
    for _ in 0..32 {
        let value = bezier(x1, x2, t);
        if (value - x).abs() < 1e-6 {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    bezier(y1, y2, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 11] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
    ];

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_clamps_input() {
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
        assert_eq!(Easing::EaseOut.apply(f32::NAN), 0.0);
    }

    #[test]
    fn test_monotonic_samples() {
        for easing in ALL {
            let mut prev = 0.0;
            for i in 0..=100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!(v + 1e-4 >= prev, "{:?} decreased at {}", easing, i);
                prev = v;
            }
        }
    }

    #[test]
    fn test_ease_out_front_loads() {
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_overshooting_bezier_is_not_monotonic() {
        assert!(!Easing::CubicBezier(0.34, 1.56, 0.64, 1.0).is_monotonic());
        assert!(Easing::EaseInOutCubic.is_monotonic());
    }
}
