//! Piecewise-linear learning curve with O(1) lookup.
//!
//! Experience is accumulated in whole-day increments, so efficiency is
//! precomputed for every integer experience level up to [`MAX_LOOKUP_DAY`]
//! and `eff` is a single array access on the hot path.

use crate::{SewError, SewResult};

/// Upper bound of the precomputed table, in experience days. Comfortably
/// larger than any horizon plus initial experience offset.
pub const MAX_LOOKUP_DAY: usize = 2000;

/// Monotone map from accumulated experience days to fractional efficiency.
#[derive(Debug, Clone)]
pub struct EfficiencyCurve {
    /// `(experience_days, efficiency)` breakpoints, ascending in experience
    breakpoints: Vec<(f64, f64)>,
    /// `table[e]` = efficiency at ⌊experience⌋ = e
    table: Vec<f64>,
}

impl EfficiencyCurve {
    /// Build a curve from breakpoints. They are sorted by experience; at
    /// least one breakpoint is required.
    pub fn new(mut breakpoints: Vec<(f64, f64)>) -> SewResult<Self> {
        if breakpoints.is_empty() {
            return Err(SewError::Validation(
                "learning curve needs at least one breakpoint".into(),
            ));
        }
        breakpoints.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        for &(x, y) in &breakpoints {
            if !x.is_finite() || !y.is_finite() || y < 0.0 {
                return Err(SewError::Validation(format!(
                    "invalid learning-curve breakpoint ({}, {})",
                    x, y
                )));
            }
        }

        let table = build_table(&breakpoints);
        Ok(Self { breakpoints, table })
    }

    /// The fallback curve used when the workbook carries no usable curve.
    pub fn default_curve() -> Self {
        Self::new(vec![(1.0, 0.32), (10.0, 0.66), (17.0, 0.80)])
            .expect("default curve breakpoints are valid")
    }

    /// Efficiency at `experience_days`, clamped to the first/last segment.
    /// Lookup on the whole-day table; a single array access.
    pub fn eff(&self, experience_days: f64) -> f64 {
        let idx = if experience_days <= 0.0 {
            0
        } else {
            (experience_days as usize).min(MAX_LOOKUP_DAY)
        };
        self.table[idx]
    }

    /// Exact piecewise-linear interpolation (not table-quantised).
    pub fn interpolate(&self, experience_days: f64) -> f64 {
        interpolate(&self.breakpoints, experience_days)
    }

    pub fn breakpoints(&self) -> &[(f64, f64)] {
        &self.breakpoints
    }
}

impl Default for EfficiencyCurve {
    fn default() -> Self {
        Self::default_curve()
    }
}

fn build_table(breakpoints: &[(f64, f64)]) -> Vec<f64> {
    (0..=MAX_LOOKUP_DAY)
        .map(|day| interpolate(breakpoints, day as f64))
        .collect()
}

fn interpolate(curve: &[(f64, f64)], exp_days: f64) -> f64 {
    let (first_x, first_y) = curve[0];
    let (last_x, last_y) = curve[curve.len() - 1];
    if exp_days <= first_x {
        return first_y;
    }
    if exp_days >= last_x {
        return last_y;
    }
    for window in curve.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];
        if x1 <= exp_days && exp_days <= x2 {
            if (x2 - x1).abs() < f64::EPSILON {
                return y2;
            }
            return y1 + (y2 - y1) * (exp_days - x1) / (x2 - x1);
        }
    }
    last_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curve_endpoints() {
        let curve = EfficiencyCurve::default_curve();
        // Clamped below the first breakpoint and above the last
        assert!((curve.eff(0.0) - 0.32).abs() < 1e-12);
        assert!((curve.eff(1.0) - 0.32).abs() < 1e-12);
        assert!((curve.eff(17.0) - 0.80).abs() < 1e-12);
        assert!((curve.eff(500.0) - 0.80).abs() < 1e-12);
    }

    #[test]
    fn test_interpolation_between_breakpoints() {
        let curve = EfficiencyCurve::default_curve();
        // Halfway between (1, 0.32) and (10, 0.66): x = 5.5
        let expected = 0.32 + (0.66 - 0.32) * (5.5 - 1.0) / (10.0 - 1.0);
        assert!((curve.interpolate(5.5) - expected).abs() < 1e-12);
        // Table lookup quantises to whole days
        assert!((curve.eff(5.9) - curve.interpolate(5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_breakpoints_are_sorted() {
        let curve = EfficiencyCurve::new(vec![(10.0, 0.9), (1.0, 0.5)]).unwrap();
        assert!((curve.eff(0.0) - 0.5).abs() < 1e-12);
        assert!((curve.eff(20.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_empty_breakpoints_rejected() {
        assert!(EfficiencyCurve::new(vec![]).is_err());
    }

    #[test]
    fn test_negative_efficiency_rejected() {
        assert!(EfficiencyCurve::new(vec![(1.0, -0.1)]).is_err());
    }

    #[test]
    fn test_table_clamp_at_max() {
        let curve = EfficiencyCurve::default_curve();
        assert!((curve.eff(1e9) - 0.80).abs() < 1e-12);
        assert!((curve.eff(-5.0) - 0.32).abs() < 1e-12);
    }
}
