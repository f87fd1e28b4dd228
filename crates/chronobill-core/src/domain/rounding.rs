//! Rounding policy
//!
//! A project carries a rounding policy that turns reported hours into the
//! quantity used for delivery and invoicing: scale by the invoicing factor,
//! then snap to a granularity with the chosen rounding method.

use serde::{Deserialize, Serialize};

/// How a scaled amount is snapped to a granularity multiple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMethod {
    /// Round to the closest multiple, ties away from zero
    Nearest,
    /// Round to the next multiple at or above the value
    #[default]
    Up,
}

impl RoundingMethod {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingMethod::Nearest => "nearest",
            RoundingMethod::Up => "up",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nearest" => Some(RoundingMethod::Nearest),
            "up" => Some(RoundingMethod::Up),
            _ => None,
        }
    }
}

/// Per-project rounding policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// Smallest increment, in hours, to which quantities are rounded.
    /// 1.0 = hour, 0.25 = 15 min, 0.084 ~= 5 min. Zero disables rounding.
    pub granularity: f64,
    /// Rounding method applied after scaling
    pub method: RoundingMethod,
    /// Percentage multiplier applied before rounding, in [0, 500]
    pub invoicing_factor: f64,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            granularity: 0.25,
            method: RoundingMethod::Up,
            invoicing_factor: 100.0,
        }
    }
}

impl RoundingPolicy {
    /// Compute the rounded quantity for a reported amount.
    ///
    /// The amount is scaled by `invoicing_factor / 100` first. With a zero
    /// granularity the scaled amount is returned unrounded. No validation is
    /// performed; domain values are expected non-negative.
    pub fn apply(&self, amount: f64) -> f64 {
        let scaled = amount * self.invoicing_factor / 100.0;
        if self.granularity == 0.0 {
            return scaled;
        }
        round_to_multiple(scaled, self.granularity, self.method)
    }
}

/// Snap `value` to a multiple of `granularity` using `method`.
///
/// The normalized value is nudged by one ulp before snapping so that
/// representation error from the scaling step cannot push an exact multiple
/// over the next boundary (e.g. 0.1 / 0.05 -> 2.0000000000000004).
fn round_to_multiple(value: f64, granularity: f64, method: RoundingMethod) -> f64 {
    let normalized = value / granularity;
    if normalized == 0.0 {
        return 0.0;
    }
    let sign = normalized.signum();
    let magnitude = normalized.abs();
    let epsilon = 2f64.powf(magnitude.log2() - 52.0);
    let units = match method {
        RoundingMethod::Up => (magnitude - epsilon).ceil(),
        RoundingMethod::Nearest => (magnitude + epsilon).round(),
    };
    sign * units * granularity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(granularity: f64, method: RoundingMethod, factor: f64) -> RoundingPolicy {
        RoundingPolicy {
            granularity,
            method,
            invoicing_factor: factor,
        }
    }

    #[test]
    fn test_zero_granularity_only_scales() {
        let p = policy(0.0, RoundingMethod::Up, 200.0);
        assert_eq!(p.apply(1.0), 2.0);
        assert_eq!(p.apply(0.0), 0.0);

        let p = policy(0.0, RoundingMethod::Nearest, 150.0);
        assert!((p.apply(1.1) - 1.65).abs() < 1e-9);
    }

    #[test]
    fn test_up_rounding() {
        assert_eq!(policy(0.25, RoundingMethod::Up, 200.0).apply(1.0), 2.0);
        assert_eq!(policy(0.25, RoundingMethod::Up, 100.0).apply(1.0), 1.0);
        assert_eq!(policy(0.25, RoundingMethod::Up, 200.0).apply(0.9), 2.0);
        assert_eq!(policy(1.0, RoundingMethod::Up, 200.0).apply(0.6), 2.0);
    }

    #[test]
    fn test_nearest_rounding() {
        assert_eq!(policy(0.25, RoundingMethod::Nearest, 200.0).apply(1.01), 2.0);
        assert_eq!(policy(0.25, RoundingMethod::Nearest, 100.0).apply(1.1), 1.0);
    }

    #[test]
    fn test_nearest_ties_away_from_zero() {
        // 0.25 scaled is exactly half-way between 0 and 0.5
        assert_eq!(policy(0.5, RoundingMethod::Nearest, 100.0).apply(0.25), 0.5);
    }

    #[test]
    fn test_exact_multiple_is_not_bumped() {
        // 0.1 / 0.05 is 2.0000000000000004 in f64; ceiling must not reach 3
        assert!((policy(0.05, RoundingMethod::Up, 100.0).apply(0.1) - 0.1).abs() < 1e-9);
        assert_eq!(policy(0.25, RoundingMethod::Up, 100.0).apply(0.5), 0.5);
    }

    #[test]
    fn test_default_policy() {
        let p = RoundingPolicy::default();
        assert_eq!(p.granularity, 0.25);
        assert_eq!(p.method, RoundingMethod::Up);
        assert_eq!(p.invoicing_factor, 100.0);
        // one minute under the default policy bills a quarter hour
        assert_eq!(p.apply(0.02), 0.25);
    }

    #[test]
    fn test_method_parse_round_trip() {
        for method in [RoundingMethod::Nearest, RoundingMethod::Up] {
            assert_eq!(RoundingMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(RoundingMethod::parse("sideways"), None);
    }
}
