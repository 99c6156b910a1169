use crate::forecast::{ForecastResult, ForecastRow};
use serde::{Deserialize, Serialize};

/// A validated what-if percentage in [-50, 50].
///
/// Applied multiplicatively to a forecast as `1 + pct/100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfPercent(i32);

impl WhatIfPercent {
    /// Smallest accepted percentage.
    pub const MIN: i32 = -50;
    /// Largest accepted percentage.
    pub const MAX: i32 = 50;

    /// Creates a validated percentage.
    ///
    /// # Returns
    /// Returns `None` if `pct` is outside [-50, 50].
    pub fn new(pct: i32) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&pct) {
            Some(WhatIfPercent(pct))
        } else {
            None
        }
    }

    /// The identity adjustment.
    pub fn zero() -> Self {
        WhatIfPercent(0)
    }

    /// Returns the raw percentage.
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Returns the multiplicative factor `1 + pct/100`.
    pub fn factor(&self) -> f64 {
        1.0 + f64::from(self.0) / 100.0
    }

    /// True for the identity adjustment.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WhatIfPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Applies a what-if adjustment to a forecast without refitting.
///
/// Multiplies `yhat`, `yhat_lower`, and `yhat_upper` of every row by the same
/// factor and returns a new ForecastResult; the input is never mutated. A
/// zero percentage returns a structural copy that is numerically identical.
///
/// Because the factor is uniform across all three fields, the row ordering
/// invariant `yhat_lower <= yhat <= yhat_upper` is preserved for every
/// factor in the accepted range (factors stay in [0.5, 1.5], so the sign of
/// the factor never flips). Bounds that cross zero are scaled as-is, not
/// clamped.
pub fn apply(result: &ForecastResult, pct: WhatIfPercent) -> ForecastResult {
    if pct.is_zero() {
        return result.clone();
    }
    let factor = pct.factor();
    let rows: Vec<ForecastRow> = result
        .rows
        .iter()
        .map(|row| ForecastRow {
            ds: row.ds,
            yhat: row.yhat * factor,
            yhat_lower: row.yhat_lower * factor,
            yhat_upper: row.yhat_upper * factor,
        })
        .collect();
    ForecastResult {
        rows,
        model: result.model.clone(),
    }
}
