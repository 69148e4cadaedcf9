mod range;

pub use crate::util::range::{NumRange, RangeValue};

use std::cmp::Ordering;

/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, evaluates it, logs how long it took, and returns the value.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Compare two `PartialOrd` values dangerously. If the partial comparison
/// fails (returns `None`), this will panic. This is useful if you have floats
/// that you know for a fact will not be `NaN`.
pub fn cmp_unwrap<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap()
}

/// Linear interpolation between `a` and `b`. `t` is not clamped; callers that
/// need clamping do it themselves.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Euclidean modulo for tile/cell coordinates: always lands in `[0, m)` even
/// for negative inputs.
pub fn wrap_mod(v: i64, m: i64) -> i64 {
    v.rem_euclid(m)
}

/// Toroidal distance between two points on one axis: the shorter of the
/// direct span and the wrap-around span.
pub fn toroidal_delta(a: f64, b: f64, extent: f64) -> f64 {
    let d = (a - b).abs();
    d.min(extent - d)
}

/// Toroidal Euclidean distance on a `width x height` torus.
pub fn toroidal_distance(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    width: f64,
    height: f64,
) -> f64 {
    let dx = toroidal_delta(ax, bx, width);
    let dy = toroidal_delta(ay, by, height);
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_wrap_mod() {
        assert_eq!(wrap_mod(5, 4), 1);
        assert_eq!(wrap_mod(-1, 4), 3);
        assert_eq!(wrap_mod(-4, 4), 0);
        assert_eq!(wrap_mod(8, 4), 0);
    }

    #[test]
    fn test_toroidal_delta() {
        assert_approx_eq!(toroidal_delta(1.0, 3.0, 10.0), 2.0);
        // Wrapping is shorter than the direct path
        assert_approx_eq!(toroidal_delta(0.5, 9.5, 10.0), 1.0);
    }

    #[test]
    fn test_toroidal_distance() {
        // Straight line, no wrap
        assert_approx_eq!(
            toroidal_distance(0.0, 0.0, 3.0, 4.0, 100.0, 100.0),
            5.0
        );
        // Wraps on both axes
        assert_approx_eq!(
            toroidal_distance(1.0, 1.0, 98.0, 97.0, 100.0, 100.0),
            5.0
        );
    }
}
