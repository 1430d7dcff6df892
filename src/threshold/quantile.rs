//! Quantiles and Tukey fences.

use serde::{Deserialize, Serialize};

/// Convention used to pick a quantile between two order statistics
///
/// With `h = (n - 1) * q` over the sorted values `x`:
/// - `Linear`: `x[floor(h)] + (h - floor(h)) * (x[ceil(h)] - x[floor(h)])`
/// - `Lower`: `x[floor(h)]`
/// - `Higher`: `x[ceil(h)]`
/// - `Midpoint`: mean of `x[floor(h)]` and `x[ceil(h)]`
/// - `NearestRank`: `x[ceil(q * n) - 1]`, no interpolation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileMethod {
    #[default]
    Linear,
    Lower,
    Higher,
    Midpoint,
    NearestRank,
}

/// Quantile `q` in `[0, 1]` of ascending, finite values
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64, method: QuantileMethod) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let q = q.clamp(0.0, 1.0);

    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (h.ceil() as usize).min(n - 1);
    let value = match method {
        QuantileMethod::Linear => sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]),
        QuantileMethod::Lower => sorted[lo],
        QuantileMethod::Higher => sorted[hi],
        QuantileMethod::Midpoint => (sorted[lo] + sorted[hi]) / 2.0,
        QuantileMethod::NearestRank => {
            let rank = ((q * n as f64).ceil() as usize).clamp(1, n);
            sorted[rank - 1]
        }
    };
    Some(value)
}

/// Upper Tukey fence of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TukeyFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// `q3 + multiplier * iqr`
    pub fence: f64,
}

impl TukeyFence {
    #[must_use]
    pub fn from_quartiles(q1: f64, q3: f64, multiplier: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            fence: q3 + multiplier * iqr,
        }
    }

    /// Fence of the finite values in `values`, `None` when there are none
    #[must_use]
    pub fn compute(values: &[f64], method: QuantileMethod, multiplier: f64) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25, method)?;
        let q3 = quantile(&sorted, 0.75, method)?;
        Some(Self::from_quartiles(q1, q3, multiplier))
    }

    /// Whether a value lies strictly above the fence
    #[must_use]
    pub fn is_outlier(&self, value: f64) -> bool {
        value > self.fence
    }
}
