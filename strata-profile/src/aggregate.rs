//! Per-bin reductions of dependent fields

use indexmap::IndexMap;
use itertools::izip;
use strata_data::SampleSet;

use crate::binning::BinAssignment;
use crate::error::StrataProfileError;

/// Reduction of one dependent field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAggregate {
    /// Weighted mean per bin, or the plain sum when unweighted
    pub values: Vec<f64>,
    /// Weighted standard deviation about the bin mean
    pub std: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub counts: Vec<u64>,
    /// Sum of weights per bin (sample count when unweighted)
    pub weights: Vec<f64>,
    pub used: Vec<bool>,
    pub fields: IndexMap<String, FieldAggregate>,
}

/// Reduce every dependent field over the bins of `assignment`.
///
/// Unweighted profiles hold per-bin sums, weighted ones hold `sum(v w) / sum(w)`.
/// Bins without samples, or whose weights sum to zero, are unused and hold 0.
pub fn aggregate(
    samples: &SampleSet,
    assignment: &BinAssignment,
    fields: &[&str],
    weight_field: Option<&str>,
) -> Result<Aggregation, StrataProfileError> {
    let n_bins = assignment.n_bins();
    let weights_in: Option<&[f64]> = weight_field.map(|w| samples.values(w)).transpose()?;
    let weight_of = |i: usize| weights_in.map(|w| w[i]).unwrap_or(1.0);

    let mut counts = vec![0u64; n_bins];
    let mut weights = vec![0.0; n_bins];
    for (i, bin) in assignment.bins.iter().enumerate() {
        if let Some(bin) = *bin {
            counts[bin] += 1;
            weights[bin] += weight_of(i);
        }
    }

    let used: Vec<bool> = counts
        .iter()
        .zip(&weights)
        .map(|(&count, &weight)| count > 0 && weight != 0.0)
        .collect();

    let mut out = IndexMap::new();
    for field in fields {
        let values = samples.values(field)?;

        let mut weighted_sums = vec![0.0; n_bins];
        for (i, (bin, value)) in assignment.bins.iter().zip(values).enumerate() {
            if let Some(bin) = *bin {
                weighted_sums[bin] += value * weight_of(i);
            }
        }

        let means: Vec<f64> = izip!(&weighted_sums, &weights, &used)
            .map(|(&sum, &weight, &used)| if used { sum / weight } else { 0.0 })
            .collect();

        let mut sq_dev = vec![0.0; n_bins];
        for (i, (bin, value)) in assignment.bins.iter().zip(values).enumerate() {
            if let Some(bin) = *bin {
                sq_dev[bin] += weight_of(i) * (value - means[bin]).powi(2);
            }
        }
        let std: Vec<f64> = izip!(&sq_dev, &weights, &used)
            .map(|(&dev, &weight, &used)| {
                if used {
                    (dev / weight).max(0.0).sqrt()
                } else {
                    0.0
                }
            })
            .collect();

        let values = if weight_field.is_some() {
            means
        } else {
            izip!(weighted_sums, &used)
                .map(|(sum, &used)| if used { sum } else { 0.0 })
                .collect()
        };

        out.insert(field.to_string(), FieldAggregate { values, std });
    }

    Ok(Aggregation {
        counts,
        weights,
        used,
        fields: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::{assign, BinSpec};
    use float_cmp::assert_approx_eq;
    use strata_data::FieldValues;

    fn samples(columns: &[(&str, Vec<f64>)]) -> SampleSet {
        SampleSet::from_columns(columns.iter().map(|(name, values)| {
            (
                name.to_string(),
                FieldValues {
                    values: values.clone(),
                    units: String::new(),
                },
            )
        }))
        .unwrap()
    }

    fn two_bins(samples: &SampleSet) -> BinAssignment {
        assign(samples, &[BinSpec::new("x", 2, (0.0, 2.0), false).unwrap()]).unwrap()
    }

    #[test]
    fn test_unweighted_sum() {
        let s = samples(&[("x", vec![0.5, 0.7, 1.5, 5.0]), ("y", vec![1.0, 2.0, 4.0, 100.0])]);
        let agg = aggregate(&s, &two_bins(&s), &["y"], None).unwrap();
        assert_eq!(agg.fields["y"].values, vec![3.0, 4.0]);
        assert_eq!(agg.counts, vec![2, 1]);
        assert_eq!(agg.used, vec![true, true]);
        assert_approx_eq!(f64, agg.fields["y"].std[0], 0.5);
        assert_approx_eq!(f64, agg.fields["y"].std[1], 0.0);
    }

    #[test]
    fn test_weighted_mean() {
        let s = samples(&[
            ("x", vec![0.5, 0.7, 1.5]),
            ("y", vec![1.0, 4.0, 9.0]),
            ("w", vec![3.0, 1.0, 2.0]),
        ]);
        let agg = aggregate(&s, &two_bins(&s), &["y"], Some("w")).unwrap();
        assert_approx_eq!(f64, agg.fields["y"].values[0], (3.0 + 4.0) / 4.0);
        assert_approx_eq!(f64, agg.fields["y"].values[1], 9.0);
        assert_eq!(agg.weights, vec![4.0, 2.0]);
    }

    #[test]
    fn test_zero_weight_bin_is_unused() {
        let s = samples(&[
            ("x", vec![0.5, 1.5]),
            ("y", vec![1.0, 9.0]),
            ("w", vec![0.0, 2.0]),
        ]);
        let agg = aggregate(&s, &two_bins(&s), &["y"], Some("w")).unwrap();
        assert_eq!(agg.used, vec![false, true]);
        assert_eq!(agg.counts, vec![1, 1]);
        assert_eq!(agg.fields["y"].values, vec![0.0, 9.0]);
        assert!(agg.fields["y"].values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_bins_zero_filled() {
        let s = samples(&[("x", vec![0.1, 0.2]), ("y", vec![1.0, 1.0])]);
        let agg = aggregate(&s, &two_bins(&s), &["y"], None).unwrap();
        assert_eq!(agg.fields["y"].values, vec![2.0, 0.0]);
        assert_eq!(agg.used, vec![true, false]);
    }

    #[test]
    fn test_fields_share_membership() {
        let s = samples(&[
            ("x", vec![0.5, 1.5, 3.0]),
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![10.0, 20.0, 30.0]),
        ]);
        let agg = aggregate(&s, &two_bins(&s), &["a", "b"], None).unwrap();
        assert_eq!(agg.fields["a"].values, vec![1.0, 2.0]);
        assert_eq!(agg.fields["b"].values, vec![10.0, 20.0]);
    }

    #[test]
    fn test_missing_weight_field() {
        let s = samples(&[("x", vec![0.5]), ("y", vec![1.0])]);
        let err = aggregate(&s, &two_bins(&s), &["y"], Some("w")).unwrap_err();
        assert!(matches!(err, StrataProfileError::DataError(_)));
    }
}
