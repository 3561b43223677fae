//! Post-processing of aggregated bin values

use serde::{Deserialize, Serialize};

use crate::error::StrataProfileError;

/// Direction of a running sum along one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Accumulation {
    #[default]
    None,
    /// Running sum from the lowest bin upward
    Ascending,
    /// Running sum from the highest bin downward
    Descending,
}

impl From<bool> for Accumulation {
    fn from(value: bool) -> Self {
        if value {
            Accumulation::Ascending
        } else {
            Accumulation::None
        }
    }
}

/// Transforms applied on top of the raw aggregation, in a fixed order:
/// accumulation first, then fractional normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transforms {
    /// One entry per axis
    pub accumulation: Vec<Accumulation>,
    pub fractional: bool,
}

impl Transforms {
    pub fn is_identity(&self) -> bool {
        !self.fractional && self.accumulation.iter().all(|a| *a == Accumulation::None)
    }

    /// Expand the accumulation setting to one entry per axis.
    ///
    /// Empty means no accumulation and a single entry applies to every axis.
    pub fn resolve(mut self, n_axes: usize) -> Result<Self, StrataProfileError> {
        self.accumulation = match self.accumulation.len() {
            0 => vec![Accumulation::None; n_axes],
            1 => vec![self.accumulation[0]; n_axes],
            n if n == n_axes => self.accumulation,
            n => {
                return Err(StrataProfileError::InvalidBinSpec(format!(
                    "accumulation given for {n} axes but the profile has {n_axes}"
                )))
            }
        };
        Ok(self)
    }

    pub fn apply(&self, raw: &[f64], used: &[bool], shape: &[usize]) -> Vec<f64> {
        let mut values = raw.to_vec();
        for (axis, direction) in self.accumulation.iter().enumerate() {
            accumulate_axis(&mut values, shape, axis, *direction);
        }
        if self.fractional {
            normalize(&mut values, used_total(raw, used));
        }
        values
    }
}

/// Replace each bin with the running sum along `axis` of a row-major array
pub fn accumulate_axis(values: &mut [f64], shape: &[usize], axis: usize, direction: Accumulation) {
    if direction == Accumulation::None {
        return;
    }
    let len = shape[axis];
    let stride: usize = shape[axis + 1..].iter().product();
    let outer: usize = shape[..axis].iter().product();
    for o in 0..outer {
        for inner in 0..stride {
            let base = o * len * stride + inner;
            let mut running = 0.0;
            let mut step = |k: usize| {
                let index = base + k * stride;
                running += values[index];
                values[index] = running;
            };
            match direction {
                Accumulation::Ascending => (0..len).for_each(&mut step),
                Accumulation::Descending => (0..len).rev().for_each(&mut step),
                Accumulation::None => {}
            }
        }
    }
}

/// Sum of the raw values over used bins; the endpoint of a full accumulation
pub fn used_total(raw: &[f64], used: &[bool]) -> f64 {
    raw.iter()
        .zip(used)
        .filter(|(_, used)| **used)
        .map(|(v, _)| v)
        .sum()
}

/// Divide by `total` in place; a zero or non-finite total leaves values as they are
pub fn normalize(values: &mut [f64], total: f64) {
    if total == 0.0 || !total.is_finite() {
        return;
    }
    values.iter_mut().for_each(|v| *v /= total);
}
