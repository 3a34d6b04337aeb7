//! Linear mapping of a numeric domain onto ordered labels.

/// Maps `[lo, hi]` onto equal-width bands, one per label.
///
/// Values below `lo` clamp to the first label, values at or above `hi` to
/// the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMap<L> {
    lo: f64,
    hi: f64,
    labels: Vec<L>,
}

impl<L: Clone> LinearMap<L> {
    /// Returns `None` when `labels` is empty or the domain is degenerate.
    pub fn new(domain: [f64; 2], labels: Vec<L>) -> Option<Self> {
        let [lo, hi] = domain;
        if labels.is_empty() || lo.is_nan() || hi.is_nan() || hi <= lo {
            return None;
        }
        Some(Self { lo, hi, labels })
    }

    pub fn map(&self, value: f64) -> L {
        let last = self.labels.len() - 1;
        let fraction = (value - self.lo) / (self.hi - self.lo);
        let index = if fraction.is_nan() || fraction <= 0.0 {
            0
        } else {
            ((fraction * self.labels.len() as f64).floor() as usize).min(last)
        };
        self.labels[index].clone()
    }
}

/// Qualitative level of a mean FAIR score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FairLevel {
    Poor,
    Good,
    VeryFair,
}

impl FairLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Good => "Good",
            Self::VeryFair => "Very FAIR",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Poor => "rgba(255,10,10,1)",
            Self::Good => "rgba(132,0,214,1)",
            Self::VeryFair => "rgba(0,0,214,1)",
        }
    }

    /// Three bands over `[0, 1]`.
    pub fn mapper() -> LinearMap<Self> {
        LinearMap {
            lo: 0.0,
            hi: 1.0,
            labels: vec![Self::Poor, Self::Good, Self::VeryFair],
        }
    }
}
