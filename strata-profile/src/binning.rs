//! Bin edges and per-sample bin assignment

use serde::{Deserialize, Serialize};
use strata_data::SampleSet;

use crate::error::StrataProfileError;

/// Domain used when no sample can define a linear axis range
pub const DEFAULT_LINEAR_DOMAIN: (f64, f64) = (0.0, 1.0);
/// Domain used when no positive sample can define a log axis range
pub const DEFAULT_LOG_DOMAIN: (f64, f64) = (1.0, 10.0);

/// Bounds, count and scale of one binning axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    pub field: String,
    pub n_bins: usize,
    pub lower: f64,
    pub upper: f64,
    pub log: bool,
}

impl BinSpec {
    /// Creates a spec with explicit bounds
    pub fn new(
        field: impl Into<String>,
        n_bins: usize,
        (lower, upper): (f64, f64),
        log: bool,
    ) -> Result<Self, StrataProfileError> {
        let spec = Self {
            field: field.into(),
            n_bins,
            lower,
            upper,
            log,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Creates a spec whose bounds are the extrema of `values`.
    ///
    /// Non-finite values are ignored, and so are non-positive values on a log
    /// axis. When no value qualifies the default domain for the scale is used.
    /// A range too narrow to hold `n_bins` distinct edges, a single value
    /// included, is widened around the samples.
    pub fn from_samples(
        field: impl Into<String>,
        n_bins: usize,
        values: &[f64],
        log: bool,
    ) -> Result<Self, StrataProfileError> {
        let field = field.into();
        let extrema = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && (!log || *v > 0.0))
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        let Some((lo, hi)) = extrema else {
            let domain = if log {
                DEFAULT_LOG_DOMAIN
            } else {
                DEFAULT_LINEAR_DOMAIN
            };
            return Self::new(field, n_bins, domain, log);
        };
        let spec = Self {
            field,
            n_bins,
            lower: lo,
            upper: hi,
            log,
        };
        if spec.validate().is_ok() {
            return Ok(spec);
        }
        Self::new(spec.field, n_bins, widen_narrow(lo, hi, log), log)
    }

    pub fn validate(&self) -> Result<(), StrataProfileError> {
        if self.n_bins == 0 {
            return Err(StrataProfileError::InvalidBinSpec(format!(
                "`{}` needs at least one bin",
                self.field
            )));
        }
        if !(self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper) {
            return Err(StrataProfileError::InvalidBinSpec(format!(
                "`{}` bounds must be finite with lower < upper, got ({}, {})",
                self.field, self.lower, self.upper
            )));
        }
        if self.log && self.lower <= 0.0 {
            return Err(StrataProfileError::InvalidBinSpec(format!(
                "`{}` is log scaled so bounds must be positive, got ({}, {})",
                self.field, self.lower, self.upper
            )));
        }
        let increasing = |edges: Vec<f64>| edges.windows(2).all(|w| w[0] < w[1]);
        if !(increasing(self.transformed_edges()) && increasing(self.edges())) {
            return Err(StrataProfileError::InvalidBinSpec(format!(
                "{} bins do not fit between {} and {} for `{}`",
                self.n_bins, self.lower, self.upper, self.field
            )));
        }
        Ok(())
    }

    fn transform(&self, v: f64) -> f64 {
        if self.log {
            v.log10()
        } else {
            v
        }
    }

    /// Edges in the space bins are uniform in (log10 of the value on log axes)
    pub fn transformed_edges(&self) -> Vec<f64> {
        let start = self.transform(self.lower);
        let stop = self.transform(self.upper);
        let step = (stop - start) / self.n_bins as f64;
        (0..=self.n_bins)
            .map(|i| {
                if i == self.n_bins {
                    stop
                } else {
                    start + step * i as f64
                }
            })
            .collect()
    }

    /// Bin edges in value space, `n_bins + 1` of them with the bounds exact at both ends
    pub fn edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = if self.log {
            self.transformed_edges()
                .into_iter()
                .map(|e| 10f64.powf(e))
                .collect()
        } else {
            self.transformed_edges()
        };
        edges[0] = self.lower;
        edges[self.n_bins] = self.upper;
        edges
    }

    /// Index of the bin holding `value`, or `None` when it falls outside the axis.
    ///
    /// Bins are half open except the last, which also holds the upper bound.
    pub fn locate(&self, transformed_edges: &[f64], value: f64) -> Option<usize> {
        if self.log && !(value > 0.0) {
            return None;
        }
        let t = self.transform(value);
        let first = transformed_edges[0];
        let last = transformed_edges[self.n_bins];
        if !(t >= first && t <= last) {
            return None;
        }
        let index = transformed_edges.partition_point(|e| *e <= t) - 1;
        Some(index.min(self.n_bins - 1))
    }
}

/// Range around `[lo, hi]` wide enough for any bin count
fn widen_narrow(lo: f64, hi: f64, log: bool) -> (f64, f64) {
    if log {
        return (lo / 10.0, hi * 10.0);
    }
    let half = lo.abs().max(hi.abs()) * 0.5;
    if half == 0.0 {
        (-0.5, 0.5)
    } else {
        (lo - half, hi + half)
    }
}

/// Flat bin index for every sample, shared by all reductions of one profile
#[derive(Debug, Clone, PartialEq)]
pub struct BinAssignment {
    pub shape: Vec<usize>,
    pub bins: Vec<Option<usize>>,
}

impl BinAssignment {
    pub fn n_bins(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn in_range(&self) -> usize {
        self.bins.iter().filter(|b| b.is_some()).count()
    }
}

/// Assign every sample to a flat row-major bin index (x outer).
///
/// A sample outside the bounds of any axis is excluded from every bin.
pub fn assign(
    samples: &SampleSet,
    specs: &[BinSpec],
) -> Result<BinAssignment, StrataProfileError> {
    let shape: Vec<usize> = specs.iter().map(|s| s.n_bins).collect();
    let mut bins: Vec<Option<usize>> = vec![Some(0); samples.len()];

    for spec in specs {
        let values = samples.values(&spec.field)?;
        let edges = spec.transformed_edges();
        for (bin, &value) in bins.iter_mut().zip(values) {
            *bin = match (*bin, spec.locate(&edges, value)) {
                (Some(flat), Some(index)) => Some(flat * spec.n_bins + index),
                _ => None,
            };
        }
    }

    Ok(BinAssignment { shape, bins })
}
