//! Assertion utilities for testing.
//!
//! This module provides helper functions for floating-point and pixel
//! comparisons.

/// Default epsilon for floating-point comparisons, in degrees
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that every value of `actual` is strictly outside the matching
/// value of `inner`: lower for minimums, higher for maximums.
///
/// Both arrays are `[x_min, x_max, y_min, y_max]`.
pub fn assert_strictly_contains(actual: [f64; 4], inner: [f64; 4]) {
    assert!(actual[0] < inner[0], "x_min {} not below {}", actual[0], inner[0]);
    assert!(actual[1] > inner[1], "x_max {} not above {}", actual[1], inner[1]);
    assert!(actual[2] < inner[2], "y_min {} not below {}", actual[2], inner[2]);
    assert!(actual[3] > inner[3], "y_max {} not above {}", actual[3], inner[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0, None);
        assert_approx_eq(1.0, 1.000_000_1, None);
        assert_approx_eq(1.0, 1.001, Some(0.01));
    }

    #[test]
    fn test_assert_strictly_contains() {
        assert_strictly_contains([0.0, 10.0, 0.0, 10.0], [1.0, 9.0, 1.0, 9.0]);
    }
}
