use crate::array;

use super::ContinuousScale;

#[derive(Clone, Debug)]
pub struct LinearScaleConfig {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub clamp: bool,
    pub nice: Option<usize>,
}

impl Default for LinearScaleConfig {
    fn default() -> Self {
        Self {
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            clamp: false,
            nice: None,
        }
    }
}

/// Maps a numeric domain onto a range with an affine transform
#[derive(Clone, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new(config: &LinearScaleConfig) -> Self {
        let this = Self {
            domain: config.domain,
            range: config.range,
            clamp: config.clamp,
        };
        match config.nice {
            Some(count) => this.nice(Some(count)),
            None => this,
        }
    }

    /// Extends the domain outward to multiples of the tick step
    pub fn nice(mut self, count: Option<usize>) -> Self {
        let (d0, d1) = self.domain;
        if d0 == d1 || d0.is_nan() || d1.is_nan() {
            return self;
        }
        let (mut start, mut stop) = if d0 <= d1 { (d0, d1) } else { (d1, d0) };
        let count = count.unwrap_or(10) as f64;

        let mut prestep = 0.0;
        for _ in 0..10 {
            let step = array::tick_step(start, stop, count);
            if step == prestep || !(step > 0.0) {
                break;
            }
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
            prestep = step;
        }

        self.domain = if d0 <= d1 { (start, stop) } else { (stop, start) };
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
}

impl ContinuousScale for LinearScale {
    fn domain(&self) -> (f64, f64) {
        self.domain
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }

    fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 || r0 == r1 {
            return r0;
        }
        let t = (value - d0) / (d1 - d0);
        let t = if self.clamp { t.clamp(0.0, 1.0) } else { t };
        r0 + t * (r1 - r0)
    }

    fn invert(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r0 == r1 {
            return d0;
        }
        let t = (value - r0) / (r1 - r0);
        let t = if self.clamp { t.clamp(0.0, 1.0) } else { t };
        d0 + t * (d1 - d0)
    }

    fn ticks(&self, count: Option<f64>) -> Vec<f64> {
        array::ticks(self.domain.0, self.domain.1, count.unwrap_or(10.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_scale_and_invert() {
        let scale = LinearScale::new(&LinearScaleConfig {
            domain: (10.0, 30.0),
            range: (100.0, 500.0),
            ..Default::default()
        });
        assert_approx_eq!(f64, scale.scale(20.0), 300.0);
        assert_approx_eq!(f64, scale.scale(40.0), 700.0);
        assert_approx_eq!(f64, scale.invert(300.0), 20.0);
        assert_approx_eq!(f64, scale.with_clamp(true).scale(40.0), 500.0);
    }

    #[test]
    fn test_reversed_range() {
        // screen y grows downward
        let scale = LinearScale::new(&LinearScaleConfig {
            domain: (0.0, 1.0),
            range: (400.0, 0.0),
            ..Default::default()
        });
        assert_approx_eq!(f64, scale.scale(0.25), 300.0);
    }

    #[test]
    fn test_nice() {
        let scale = LinearScale::new(&LinearScaleConfig {
            domain: (0.13, 0.87),
            nice: Some(5),
            ..Default::default()
        });
        let (d0, d1) = scale.domain();
        assert_approx_eq!(f64, d0, 0.0);
        assert_approx_eq!(f64, d1, 1.0);
    }

    #[test]
    fn test_degenerate_domain() {
        let scale = LinearScale::new(&LinearScaleConfig {
            domain: (2.0, 2.0),
            range: (5.0, 9.0),
            ..Default::default()
        });
        assert_eq!(scale.scale(100.0), 5.0);
        assert_eq!(scale.ticks(None), vec![2.0]);
    }
}
