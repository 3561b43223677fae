use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_units::UnitSystem;

use crate::aggregate::Aggregation;
use crate::error::StrataProfileError;
use crate::transform::Transforms;

/// One binned axis of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAxis {
    pub field: String,
    pub units: String,
    pub log: bool,
    /// `n_bins + 1` strictly increasing edges
    pub edges: Vec<f64>,
}

impl ProfileAxis {
    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Arithmetic midpoints on linear axes, geometric midpoints on log axes
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|w| {
                if self.log {
                    (w[0] * w[1]).sqrt()
                } else {
                    0.5 * (w[0] + w[1])
                }
            })
            .collect()
    }

    pub fn extent(&self) -> (f64, f64) {
        (
            self.edges.first().copied().unwrap_or(0.0),
            self.edges.last().copied().unwrap_or(0.0),
        )
    }
}

/// Values of one dependent field over the bin grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileField {
    pub units: String,
    /// Aggregation before accumulation or normalization
    pub raw: Vec<f64>,
    /// Raw values after the profile's transforms
    pub values: Vec<f64>,
    pub std: Vec<f64>,
}

/// Outcome of a build; the non-populated states are warnings, not errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileStatus {
    Populated,
    EmptySampleSet,
    AllSamplesOutOfRange,
    /// Samples landed in bins but every bin's weight sum is zero
    ZeroWeight,
}

/// Binned statistics of dependent fields over one or two independent fields.
///
/// A profile is never mutated in place. Transform and unit changes return a
/// new profile derived from the raw arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    source: String,
    axes: Vec<ProfileAxis>,
    fields: IndexMap<String, ProfileField>,
    weight_field: Option<String>,
    counts: Vec<u64>,
    weights: Vec<f64>,
    used: Vec<bool>,
    transforms: Transforms,
    status: ProfileStatus,
}

impl Profile {
    pub(crate) fn from_aggregation(
        source: String,
        axes: Vec<ProfileAxis>,
        aggregation: Aggregation,
        field_units: &IndexMap<String, String>,
        weight_field: Option<String>,
        transforms: Transforms,
        status: ProfileStatus,
    ) -> Self {
        let shape: Vec<usize> = axes.iter().map(|a| a.n_bins()).collect();
        let fields = aggregation
            .fields
            .into_iter()
            .map(|(name, agg)| {
                let values = transforms.apply(&agg.values, &aggregation.used, &shape);
                let field = ProfileField {
                    units: field_units.get(&name).cloned().unwrap_or_default(),
                    raw: agg.values,
                    values,
                    std: agg.std,
                };
                (name, field)
            })
            .collect();

        Self {
            source,
            axes,
            fields,
            weight_field,
            counts: aggregation.counts,
            weights: aggregation.weights,
            used: aggregation.used,
            transforms,
            status,
        }
    }

    /// Name of the field source the profile was built from
    pub fn source_name(&self) -> &str {
        &self.source
    }

    pub fn axes(&self) -> &[ProfileAxis] {
        &self.axes
    }

    pub fn x_axis(&self) -> &ProfileAxis {
        &self.axes[0]
    }

    pub fn y_axis(&self) -> Option<&ProfileAxis> {
        self.axes.get(1)
    }

    pub fn dims(&self) -> usize {
        self.axes.len()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.n_bins()).collect()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field(&self, field: &str) -> Result<&ProfileField, StrataProfileError> {
        self.fields
            .get(field)
            .ok_or_else(|| StrataProfileError::FieldNotInProfile(field.to_string()))
    }

    pub fn values(&self, field: &str) -> Result<&[f64], StrataProfileError> {
        Ok(&self.field(field)?.values)
    }

    pub fn raw(&self, field: &str) -> Result<&[f64], StrataProfileError> {
        Ok(&self.field(field)?.raw)
    }

    pub fn std(&self, field: &str) -> Result<&[f64], StrataProfileError> {
        Ok(&self.field(field)?.std)
    }

    /// Units of the transformed values; fractional profiles are dimensionless
    pub fn value_units(&self, field: &str) -> Result<&str, StrataProfileError> {
        let field = self.field(field)?;
        Ok(if self.transforms.fractional {
            ""
        } else {
            &field.units
        })
    }

    /// Value of a bin addressed by one index per axis
    pub fn value_at(&self, field: &str, index: &[usize]) -> Result<Option<f64>, StrataProfileError> {
        let values = self.values(field)?;
        Ok(self.flat_index(index).map(|i| values[i]))
    }

    fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.axes.len() {
            return None;
        }
        index
            .iter()
            .zip(&self.axes)
            .try_fold(0usize, |flat, (&i, axis)| {
                (i < axis.n_bins()).then_some(flat * axis.n_bins() + i)
            })
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn used(&self) -> &[bool] {
        &self.used
    }

    pub fn weight_field(&self) -> Option<&str> {
        self.weight_field.as_deref()
    }

    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    pub fn status(&self) -> ProfileStatus {
        self.status
    }

    /// A profile over the same bins with different post-processing
    pub fn with_transforms(&self, transforms: Transforms) -> Result<Self, StrataProfileError> {
        let transforms = transforms.resolve(self.axes.len())?;
        let shape = self.shape();
        let mut profile = self.clone();
        for field in profile.fields.values_mut() {
            field.values = transforms.apply(&field.raw, &profile.used, &shape);
        }
        profile.transforms = transforms;
        Ok(profile)
    }

    /// A profile with `field` expressed in `to`.
    ///
    /// Fractional values are ratios and come out unchanged.
    pub fn converted(
        &self,
        field: &str,
        to: &str,
        units: &dyn UnitSystem,
    ) -> Result<Self, StrataProfileError> {
        let shape = self.shape();
        let mut profile = self.clone();
        if let Some(axis) = profile.axes.iter_mut().find(|a| a.field == field) {
            let factor = conversion_factor(field, &axis.units, to, units)?;
            axis.edges.iter_mut().for_each(|e| *e *= factor);
            axis.units = to.to_string();
            if !profile.fields.contains_key(field) {
                return Ok(profile);
            }
        }

        let used = profile.used.clone();
        let transforms = profile.transforms.clone();
        let entry = profile
            .fields
            .get_mut(field)
            .ok_or_else(|| StrataProfileError::FieldNotInProfile(field.to_string()))?;
        let factor = conversion_factor(field, &entry.units, to, units)?;
        entry.raw.iter_mut().for_each(|v| *v *= factor);
        entry.std.iter_mut().for_each(|v| *v *= factor);
        entry.values = transforms.apply(&entry.raw, &used, &shape);
        entry.units = to.to_string();
        Ok(profile)
    }
}

pub(crate) fn conversion_factor(
    field: &str,
    from: &str,
    to: &str,
    units: &dyn UnitSystem,
) -> Result<f64, StrataProfileError> {
    units
        .conversion_factor(from, to)
        .map_err(|source| StrataProfileError::IncompatibleUnit {
            field: field.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            source,
        })
}
