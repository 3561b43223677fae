use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_data::{FieldSource, SampleSet};
use strata_units::UnitSystem;

use crate::aggregate::aggregate;
use crate::binning::{assign, BinSpec};
use crate::error::StrataProfileError;
use crate::profile::{conversion_factor, Profile, ProfileAxis, ProfileStatus};
use crate::transform::{Accumulation, Transforms};

pub const DEFAULT_N_BINS: usize = 64;
pub const DEFAULT_WEIGHT_FIELD: &str = "cell_mass";

/// Bin count for every axis, or one count per axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NBins {
    Uniform(usize),
    PerAxis(Vec<usize>),
}

impl Default for NBins {
    fn default() -> Self {
        NBins::Uniform(DEFAULT_N_BINS)
    }
}

impl From<usize> for NBins {
    fn from(value: usize) -> Self {
        NBins::Uniform(value)
    }
}

impl From<Vec<usize>> for NBins {
    fn from(value: Vec<usize>) -> Self {
        NBins::PerAxis(value)
    }
}

impl From<(usize, usize)> for NBins {
    fn from((nx, ny): (usize, usize)) -> Self {
        NBins::PerAxis(vec![nx, ny])
    }
}

impl NBins {
    fn resolve(&self, n_axes: usize) -> Result<Vec<usize>, StrataProfileError> {
        let counts = match self {
            NBins::Uniform(n) => vec![*n; n_axes],
            NBins::PerAxis(counts) if counts.len() == n_axes => counts.clone(),
            NBins::PerAxis(counts) => {
                return Err(StrataProfileError::InvalidBinSpec(format!(
                    "{} bin counts given for {} axes",
                    counts.len(),
                    n_axes
                )))
            }
        };
        if counts.contains(&0) {
            return Err(StrataProfileError::InvalidBinSpec(
                "bin counts must be positive".to_string(),
            ));
        }
        Ok(counts)
    }
}

/// Everything needed to build one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub bin_fields: Vec<String>,
    pub fields: Vec<String>,
    pub n_bins: NBins,
    pub weight_field: Option<String>,
    /// Empty for none, one entry for every axis, or one entry per axis
    pub accumulation: Vec<Accumulation>,
    pub fractional: bool,
    /// Target units keyed by field name
    pub units: IndexMap<String, String>,
    /// Explicit bounds of binned fields, in their target units
    pub extrema: IndexMap<String, (f64, f64)>,
    /// Log flags of binned fields, overriding the source's default
    pub logs: IndexMap<String, bool>,
}

impl ProfileRequest {
    pub fn new<B, F>(bin_fields: B, fields: F) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            bin_fields: bin_fields.into_iter().map(Into::into).collect(),
            fields: fields.into_iter().map(Into::into).collect(),
            n_bins: NBins::default(),
            weight_field: Some(DEFAULT_WEIGHT_FIELD.to_string()),
            accumulation: Vec::new(),
            fractional: false,
            units: IndexMap::new(),
            extrema: IndexMap::new(),
            logs: IndexMap::new(),
        }
    }

    pub fn with_n_bins(mut self, n_bins: impl Into<NBins>) -> Self {
        self.n_bins = n_bins.into();
        self
    }

    pub fn with_weight_field(mut self, weight_field: impl Into<String>) -> Self {
        self.weight_field = Some(weight_field.into());
        self
    }

    pub fn unweighted(mut self) -> Self {
        self.weight_field = None;
        self
    }

    /// Ascending accumulation along every axis, or none
    pub fn with_accumulation(mut self, accumulation: bool) -> Self {
        self.accumulation = vec![accumulation.into()];
        self
    }

    pub fn with_accumulation_per_axis(mut self, accumulation: Vec<Accumulation>) -> Self {
        self.accumulation = accumulation;
        self
    }

    pub fn with_fractional(mut self, fractional: bool) -> Self {
        self.fractional = fractional;
        self
    }

    pub fn with_units(mut self, field: impl Into<String>, units: impl Into<String>) -> Self {
        self.units.insert(field.into(), units.into());
        self
    }

    pub fn with_extrema(mut self, field: impl Into<String>, extrema: (f64, f64)) -> Self {
        self.extrema.insert(field.into(), extrema);
        self
    }

    pub fn with_log(mut self, field: impl Into<String>, log: bool) -> Self {
        self.logs.insert(field.into(), log);
        self
    }

    fn all_fields(&self) -> Vec<&str> {
        self.bin_fields
            .iter()
            .chain(&self.fields)
            .chain(&self.weight_field)
            .map(String::as_str)
            .collect()
    }
}

/// Bin, aggregate and post-process a snapshot of `source`.
///
/// Requests are validated before any values are fetched. An empty selection
/// or one with every sample out of range yields an all-unused profile with a
/// matching status rather than an error.
#[tracing::instrument(skip_all, fields(source = %source.name(), bin_fields = ?request.bin_fields))]
pub fn create_profile<S: FieldSource + ?Sized>(
    source: &S,
    request: &ProfileRequest,
    units: &dyn UnitSystem,
) -> Result<Profile, StrataProfileError> {
    let n_axes = request.bin_fields.len();
    if !(1..=2).contains(&n_axes) {
        return Err(StrataProfileError::InvalidAxisCount(n_axes));
    }
    let n_bins = request.n_bins.resolve(n_axes)?;
    if request.fields.is_empty() {
        return Err(StrataProfileError::NoFields);
    }
    let transforms = Transforms {
        accumulation: request.accumulation.clone(),
        fractional: request.fractional,
    }
    .resolve(n_axes)?;

    let all_fields = request.all_fields();
    if let Some(field) = request.units.keys().find(|f| !all_fields.contains(&f.as_str())) {
        return Err(StrataProfileError::FieldNotInProfile(field.clone()));
    }

    let mut samples = SampleSet::fetch(source, &all_fields)?;
    for (field, to) in &request.units {
        let from = samples.units(field)?.to_string();
        let factor = conversion_factor(field, &from, to, units)?;
        if factor != 1.0 || &from != to {
            let converted = samples.values(field)?.iter().map(|v| v * factor).collect();
            samples = samples.with_converted(field, converted, to)?;
        }
    }

    let specs = request
        .bin_fields
        .iter()
        .zip(&n_bins)
        .map(|(field, &n)| {
            let log = match request.logs.get(field) {
                Some(log) => *log,
                None => source.field_info(field)?.take_log,
            };
            match request.extrema.get(field) {
                Some(&extrema) => BinSpec::new(field, n, extrema, log),
                None => BinSpec::from_samples(field, n, samples.values(field)?, log),
            }
        })
        .collect::<Result<Vec<_>, StrataProfileError>>()?;

    let assignment = assign(&samples, &specs)?;
    let dependent: Vec<&str> = request.fields.iter().map(String::as_str).collect();
    let aggregation = aggregate(&samples, &assignment, &dependent, request.weight_field.as_deref())?;

    let status = if samples.is_empty() {
        tracing::warn!("Selection of {} holds no samples", source.name());
        ProfileStatus::EmptySampleSet
    } else if assignment.in_range() == 0 {
        tracing::warn!(
            "All {} samples of {} fall outside the bin range",
            samples.len(),
            source.name()
        );
        ProfileStatus::AllSamplesOutOfRange
    } else if !aggregation.used.iter().any(|u| *u) {
        tracing::warn!(
            "Every bin of {} has zero total weight in `{}`",
            source.name(),
            request.weight_field.as_deref().unwrap_or_default()
        );
        ProfileStatus::ZeroWeight
    } else {
        tracing::debug!(
            "Binned {} of {} samples into {:?} bins",
            assignment.in_range(),
            samples.len(),
            assignment.shape
        );
        ProfileStatus::Populated
    };

    let axes = specs
        .iter()
        .map(|spec| {
            Ok(ProfileAxis {
                field: spec.field.clone(),
                units: samples.units(&spec.field)?.to_string(),
                log: spec.log,
                edges: spec.edges(),
            })
        })
        .collect::<Result<Vec<_>, StrataProfileError>>()?;

    let field_units = dependent
        .iter()
        .map(|f| Ok((f.to_string(), samples.units(f)?.to_string())))
        .collect::<Result<IndexMap<_, _>, StrataProfileError>>()?;

    Ok(Profile::from_aggregation(
        source.name(),
        axes,
        aggregation,
        &field_units,
        request.weight_field.clone(),
        transforms,
        status,
    ))
}

/// Build independent profiles of the same source, in parallel when the
/// `rayon` feature is enabled. Results keep the order of `requests`.
pub fn create_profiles<S: FieldSource + ?Sized>(
    source: &S,
    requests: &[ProfileRequest],
    units: &dyn UnitSystem,
) -> Vec<Result<Profile, StrataProfileError>> {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        requests
            .par_iter()
            .map(|request| create_profile(source, request, units))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        requests
            .iter()
            .map(|request| create_profile(source, request, units))
            .collect()
    }
}
