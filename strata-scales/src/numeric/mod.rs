pub mod linear;
pub mod log;

use linear::{LinearScale, LinearScaleConfig};
use log::{LogScale, LogScaleConfig};

pub trait ContinuousScale {
    fn domain(&self) -> (f64, f64);

    fn range(&self) -> (f64, f64);

    fn scale(&self, value: f64) -> f64;

    fn invert(&self, value: f64) -> f64;

    fn ticks(&self, count: Option<f64>) -> Vec<f64>;

    /// Position of `value` within the domain as a fraction in `[0, 1]`
    fn normalize(&self, value: f64) -> f64 {
        let (r0, r1) = self.range();
        if r0 == r1 {
            return 0.0;
        }
        ((self.scale(value) - r0) / (r1 - r0)).clamp(0.0, 1.0)
    }
}

/// Axis or color scale that is either linear or base 10 logarithmic
#[derive(Clone, Debug, PartialEq)]
pub enum NumericScale {
    Linear(LinearScale),
    Log(LogScale),
}

impl NumericScale {
    /// Falls back to a linear scale when `log` is requested over a domain
    /// that is not strictly positive.
    pub fn new(domain: (f64, f64), range: (f64, f64), log: bool) -> Self {
        if log && domain.0 > 0.0 && domain.1 > 0.0 {
            NumericScale::Log(LogScale::new(&LogScaleConfig {
                domain,
                range,
                ..Default::default()
            }))
        } else {
            NumericScale::Linear(LinearScale::new(&LinearScaleConfig {
                domain,
                range,
                ..Default::default()
            }))
        }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, NumericScale::Log(_))
    }

    pub fn with_range(self, range: (f64, f64)) -> Self {
        match self {
            NumericScale::Linear(scale) => NumericScale::Linear(scale.with_range(range)),
            NumericScale::Log(scale) => NumericScale::Log(scale.with_range(range)),
        }
    }

    pub fn with_clamp(self, clamp: bool) -> Self {
        match self {
            NumericScale::Linear(scale) => NumericScale::Linear(scale.with_clamp(clamp)),
            NumericScale::Log(scale) => NumericScale::Log(scale.with_clamp(clamp)),
        }
    }

    /// Distance between linear ticks, used to pick label precision
    pub fn tick_step(&self, count: Option<f64>) -> Option<f64> {
        match self {
            NumericScale::Linear(scale) => {
                let (d0, d1) = scale.domain();
                Some(crate::array::tick_step(d0, d1, count.unwrap_or(10.0)))
                    .filter(|s| s.is_finite() && *s > 0.0)
            }
            NumericScale::Log(_) => None,
        }
    }
}

impl ContinuousScale for NumericScale {
    fn domain(&self) -> (f64, f64) {
        match self {
            NumericScale::Linear(scale) => scale.domain(),
            NumericScale::Log(scale) => scale.domain(),
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            NumericScale::Linear(scale) => scale.range(),
            NumericScale::Log(scale) => scale.range(),
        }
    }

    fn scale(&self, value: f64) -> f64 {
        match self {
            NumericScale::Linear(scale) => scale.scale(value),
            NumericScale::Log(scale) => scale.scale(value),
        }
    }

    fn invert(&self, value: f64) -> f64 {
        match self {
            NumericScale::Linear(scale) => scale.invert(value),
            NumericScale::Log(scale) => scale.invert(value),
        }
    }

    fn ticks(&self, count: Option<f64>) -> Vec<f64> {
        match self {
            NumericScale::Linear(scale) => scale.ticks(count),
            NumericScale::Log(scale) => scale.ticks(count),
        }
    }
}

impl From<LinearScale> for NumericScale {
    fn from(scale: LinearScale) -> Self {
        NumericScale::Linear(scale)
    }
}

impl From<LogScale> for NumericScale {
    fn from(scale: LogScale) -> Self {
        NumericScale::Log(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_falls_back_to_linear() {
        assert!(NumericScale::new((1e-3, 1.0), (0.0, 1.0), true).is_log());
        assert!(!NumericScale::new((-1.0, 1.0), (0.0, 1.0), true).is_log());
    }

    #[test]
    fn test_normalize() {
        let scale = NumericScale::new((1.0, 100.0), (600.0, 0.0), true);
        assert_eq!(scale.normalize(1.0), 0.0);
        assert_eq!(scale.normalize(1e5), 1.0);
        assert!((scale.normalize(10.0) - 0.5).abs() < 1e-12);
    }
}
