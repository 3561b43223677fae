use crate::array;

use super::ContinuousScale;

#[derive(Debug, Clone)]
pub struct LogScaleConfig {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub clamp: bool,
    pub nice: bool,
}

impl Default for LogScaleConfig {
    fn default() -> Self {
        Self {
            domain: (1.0, 10.0),
            range: (0.0, 1.0),
            clamp: false,
            nice: false,
        }
    }
}

/// A base 10 logarithmic scale over a strictly positive domain.
///
/// Non-positive inputs have no position and map to NaN unless clamping is
/// enabled, in which case they pin to the low end of the range.
#[derive(Clone, Debug, PartialEq)]
pub struct LogScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LogScale {
    pub fn new(config: &LogScaleConfig) -> Self {
        let this = Self {
            domain: config.domain,
            range: config.range,
            clamp: config.clamp,
        };
        if config.nice {
            this.nice()
        } else {
            this
        }
    }

    /// Extends the domain outward to whole decades
    pub fn nice(mut self) -> Self {
        let (d0, d1) = self.domain;
        if !(d0 > 0.0 && d1 > 0.0) {
            return self;
        }
        let (lo, hi) = if d0 <= d1 { (d0, d1) } else { (d1, d0) };
        let lo = 10f64.powf(lo.log10().floor());
        let hi = 10f64.powf(hi.log10().ceil());
        self.domain = if d0 <= d1 { (lo, hi) } else { (hi, lo) };
        self
    }

    pub fn with_domain(mut self, domain: (f64, f64)) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range = range;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    fn log_domain(&self) -> Option<(f64, f64)> {
        let (d0, d1) = self.domain;
        if !(d0 > 0.0 && d1 > 0.0) || d0 == d1 {
            return None;
        }
        Some((d0.log10(), d1.log10()))
    }
}

impl ContinuousScale for LogScale {
    fn domain(&self) -> (f64, f64) {
        self.domain
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }

    fn scale(&self, value: f64) -> f64 {
        let (r0, r1) = self.range;
        let Some((l0, l1)) = self.log_domain() else {
            return r0;
        };
        if value.is_nan() {
            return f64::NAN;
        }
        if value <= 0.0 {
            return if self.clamp { r0 } else { f64::NAN };
        }
        let t = (value.log10() - l0) / (l1 - l0);
        let t = if self.clamp { t.clamp(0.0, 1.0) } else { t };
        r0 + t * (r1 - r0)
    }

    fn invert(&self, value: f64) -> f64 {
        let (r0, r1) = self.range;
        let Some((l0, l1)) = self.log_domain() else {
            return self.domain.0;
        };
        if r0 == r1 {
            return self.domain.0;
        }
        let t = (value - r0) / (r1 - r0);
        let t = if self.clamp { t.clamp(0.0, 1.0) } else { t };
        10f64.powf(l0 + t * (l1 - l0))
    }

    /// Decade ticks, with 2..9 multiples when the domain spans few decades.
    /// Wide domains skip decades so roughly `count` ticks remain.
    fn ticks(&self, count: Option<f64>) -> Vec<f64> {
        let count = count.unwrap_or(10.0);
        let (d0, d1) = self.domain;
        if !(d0 > 0.0 && d1 > 0.0) {
            return vec![];
        }
        let reverse = d1 < d0;
        let (u, v) = if reverse { (d1, d0) } else { (d0, d1) };
        let (i, j) = (u.log10(), v.log10());

        let mut z = Vec::new();
        if j - i < count {
            for exp in (i.floor() as i32)..=(j.ceil() as i32) {
                for k in 1..10 {
                    let t = if exp < 0 {
                        k as f64 / 10f64.powi(-exp)
                    } else {
                        k as f64 * 10f64.powi(exp)
                    };
                    if t < u {
                        continue;
                    }
                    if t > v {
                        break;
                    }
                    z.push(t);
                }
            }
            if (z.len() as f64) * 2.0 < count {
                z = array::ticks(u, v, count);
            }
        } else {
            z = array::ticks(i, j, count.min(j - i))
                .into_iter()
                .map(|e| 10f64.powf(e))
                .collect();
        }

        if reverse {
            z.reverse();
        }
        z
    }
}

/// True when `value` is a whole power of ten, up to rounding
pub fn is_decade(value: f64) -> bool {
    if !(value > 0.0) {
        return false;
    }
    let e = value.log10();
    (e - e.round()).abs() < 1e-9
}
