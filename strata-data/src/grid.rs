//! Uniform-grid dataset with synthetic fields and spatial selections

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_units::{UnitRegistry, UnitSystem};

use crate::error::StrataDataError;
use crate::source::{unknown_field, FieldInfo, FieldSource, FieldValues};

/// Seed used when none is given, so synthetic datasets are reproducible
pub const DEFAULT_SEED: u64 = 0x4d3d3d3;

#[derive(Debug, Clone)]
pub struct FakeDatasetConfig {
    /// Cells per side of the cubic grid
    pub dims: usize,
    /// Base fields and their units
    pub fields: Vec<(String, String)>,
    /// Fields whose values are drawn from [-peak, peak) instead of [0, peak)
    pub negative: Vec<String>,
    pub peak_value: f64,
    /// Physical side length of the domain in cm
    pub length: f64,
    pub seed: u64,
}

impl Default for FakeDatasetConfig {
    fn default() -> Self {
        Self {
            dims: 16,
            fields: vec![
                ("density".to_string(), "g/cm**3".to_string()),
                ("temperature".to_string(), "K".to_string()),
                ("velocity_x".to_string(), "cm/s".to_string()),
                ("velocity_y".to_string(), "cm/s".to_string()),
                ("velocity_z".to_string(), "cm/s".to_string()),
            ],
            negative: vec![],
            peak_value: 1.0,
            length: 1.0,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone)]
struct GridField {
    info: FieldInfo,
    values: Vec<f64>,
}

/// A cubic grid of cells with per-cell field values.
///
/// Besides the stored fields, every selection exposes the derived fields
/// `x`, `y`, `z`, `dx`, `cell_volume` and `radius`; `cell_mass` when `density`
/// is present and `velocity_magnitude` when all velocity components are.
#[derive(Debug, Clone)]
pub struct GridDataset {
    name: String,
    dims: usize,
    left_edge: [f64; 3],
    right_edge: [f64; 3],
    fields: IndexMap<String, GridField>,
    units: UnitRegistry,
}

impl GridDataset {
    pub fn fake_random(config: &FakeDatasetConfig) -> Arc<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let n_cells = config.dims.pow(3);
        let mut fields = IndexMap::new();
        for (name, units) in &config.fields {
            let negative = config.negative.contains(name);
            let values = (0..n_cells)
                .map(|_| {
                    let v = rng.gen::<f64>();
                    if negative {
                        (v * 2.0 - 1.0) * config.peak_value
                    } else {
                        v * config.peak_value
                    }
                })
                .collect();
            let info = FieldInfo {
                name: name.clone(),
                units: units.clone(),
                take_log: default_take_log(name),
            };
            fields.insert(name.clone(), GridField { info, values });
        }
        Arc::new(Self {
            name: "FakeDataset".to_string(),
            dims: config.dims,
            left_edge: [0.0; 3],
            right_edge: [config.length; 3],
            fields,
            units: UnitRegistry::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_cells(&self) -> usize {
        self.dims.pow(3)
    }

    pub fn domain_center(&self) -> [f64; 3] {
        std::array::from_fn(|i| (self.left_edge[i] + self.right_edge[i]) / 2.0)
    }

    fn cell_width(&self) -> [f64; 3] {
        std::array::from_fn(|i| (self.right_edge[i] - self.left_edge[i]) / self.dims as f64)
    }

    fn cell_center(&self, index: usize) -> [f64; 3] {
        let ijk = [
            index / (self.dims * self.dims),
            (index / self.dims) % self.dims,
            index % self.dims,
        ];
        let dx = self.cell_width();
        std::array::from_fn(|i| self.left_edge[i] + (ijk[i] as f64 + 0.5) * dx[i])
    }

    fn stored(&self, field: &str) -> Option<&GridField> {
        self.fields.get(field)
    }

    pub fn all_data(self: &Arc<Self>) -> Selection {
        Selection {
            dataset: self.clone(),
            indices: Arc::new((0..self.n_cells()).collect()),
            center: self.domain_center(),
            kind: SelectionKind::AllData,
        }
    }

    /// Cells whose centers lie in the box `[left, right)`
    pub fn region(self: &Arc<Self>, center: [f64; 3], left: [f64; 3], right: [f64; 3]) -> Selection {
        let indices = (0..self.n_cells())
            .filter(|&i| {
                let c = self.cell_center(i);
                (0..3).all(|d| c[d] >= left[d] && c[d] < right[d])
            })
            .collect::<Vec<_>>();
        tracing::debug!(cells = indices.len(), "selected region");
        Selection {
            dataset: self.clone(),
            indices: Arc::new(indices),
            center,
            kind: SelectionKind::Region { left, right },
        }
    }

    /// Cells whose centers lie within `radius` (given in `radius_units`) of `center`
    pub fn sphere(
        self: &Arc<Self>,
        center: SphereCenter,
        radius: f64,
        radius_units: &str,
    ) -> Result<Selection, StrataDataError> {
        let center = match center {
            SphereCenter::Point(p) => p,
            SphereCenter::Max(field) => self.location_of_max(&field)?,
        };
        let radius_cm = radius * self.units.conversion_factor(radius_units, "cm")?;
        if !(radius_cm > 0.0) {
            return Err(StrataDataError::InvalidSelection(format!(
                "sphere radius must be positive, got {radius} {radius_units}"
            )));
        }
        let indices = (0..self.n_cells())
            .filter(|&i| distance(&self.cell_center(i), &center) <= radius_cm)
            .collect::<Vec<_>>();
        tracing::debug!(cells = indices.len(), radius_cm, "selected sphere");
        Ok(Selection {
            dataset: self.clone(),
            indices: Arc::new(indices),
            center,
            kind: SelectionKind::Sphere { radius: radius_cm },
        })
    }

    fn location_of_max(&self, field: &str) -> Result<[f64; 3], StrataDataError> {
        let stored = self.stored(field).ok_or_else(|| {
            unknown_field(field, self.fields.keys().cloned().collect())
        })?;
        let index = stored
            .values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
                if v > max {
                    (i, v)
                } else {
                    (best, max)
                }
            })
            .0;
        Ok(self.cell_center(index))
    }
}

fn default_take_log(field: &str) -> bool {
    !matches!(
        field,
        "x" | "y" | "z" | "velocity_x" | "velocity_y" | "velocity_z"
    )
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

pub enum SphereCenter {
    Point([f64; 3]),
    /// Location of the maximum of a stored field
    Max(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionKind {
    AllData,
    Region { left: [f64; 3], right: [f64; 3] },
    Sphere { radius: f64 },
}

/// A subset of grid cells, exposed as a field source
#[derive(Debug, Clone)]
pub struct Selection {
    dataset: Arc<GridDataset>,
    indices: Arc<Vec<usize>>,
    center: [f64; 3],
    kind: SelectionKind,
}

const DERIVED: [&str; 8] = [
    "x",
    "y",
    "z",
    "dx",
    "cell_volume",
    "radius",
    "cell_mass",
    "velocity_magnitude",
];

impl Selection {
    pub fn kind(&self) -> &SelectionKind {
        &self.kind
    }

    pub fn center(&self) -> [f64; 3] {
        self.center
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn gather(&self, values: &[f64]) -> Vec<f64> {
        self.indices.iter().map(|&i| values[i]).collect()
    }

    fn per_cell(&self, f: impl Fn([f64; 3]) -> f64) -> Vec<f64> {
        self.indices
            .iter()
            .map(|&i| f(self.dataset.cell_center(i)))
            .collect()
    }

    fn derived_available(&self, field: &str) -> bool {
        match field {
            "cell_mass" => self.dataset.stored("density").is_some(),
            "velocity_magnitude" => ["velocity_x", "velocity_y", "velocity_z"]
                .iter()
                .all(|f| self.dataset.stored(f).is_some()),
            _ => DERIVED.contains(&field),
        }
    }

    fn derived_units(&self, field: &str) -> &'static str {
        match field {
            "cell_volume" => "cm**3",
            "cell_mass" => "g",
            "velocity_magnitude" => "cm/s",
            _ => "cm",
        }
    }

    fn derived_values(&self, field: &str) -> Result<Vec<f64>, StrataDataError> {
        let dx = self.dataset.cell_width();
        let volume = dx[0] * dx[1] * dx[2];
        let values = match field {
            "x" => self.per_cell(|c| c[0]),
            "y" => self.per_cell(|c| c[1]),
            "z" => self.per_cell(|c| c[2]),
            "dx" => vec![dx[0]; self.len()],
            "cell_volume" => vec![volume; self.len()],
            "radius" => self.per_cell(|c| distance(&c, &self.center)),
            "cell_mass" => {
                let density = self.stored_values("density")?;
                let factor = self
                    .dataset
                    .units
                    .conversion_factor(&density.units, "g/cm**3")?;
                density
                    .values
                    .iter()
                    .map(|rho| rho * factor * volume)
                    .collect()
            }
            "velocity_magnitude" => {
                let vx = self.stored_values("velocity_x")?.values;
                let vy = self.stored_values("velocity_y")?.values;
                let vz = self.stored_values("velocity_z")?.values;
                vx.iter()
                    .zip(&vy)
                    .zip(&vz)
                    .map(|((x, y), z)| (x * x + y * y + z * z).sqrt())
                    .collect()
            }
            _ => return Err(unknown_field(field, self.field_names())),
        };
        Ok(values)
    }

    fn stored_values(&self, field: &str) -> Result<FieldValues, StrataDataError> {
        let stored = self
            .dataset
            .stored(field)
            .ok_or_else(|| unknown_field(field, self.field_names()))?;
        Ok(FieldValues {
            values: self.gather(&stored.values),
            units: stored.info.units.clone(),
        })
    }
}

impl FieldSource for Selection {
    fn name(&self) -> String {
        self.dataset.name.clone()
    }

    fn field_names(&self) -> BTreeSet<String> {
        self.dataset
            .fields
            .keys()
            .cloned()
            .chain(
                DERIVED
                    .iter()
                    .filter(|f| self.derived_available(f))
                    .map(|f| f.to_string()),
            )
            .collect()
    }

    fn field_info(&self, field: &str) -> Result<FieldInfo, StrataDataError> {
        if let Some(stored) = self.dataset.stored(field) {
            return Ok(stored.info.clone());
        }
        if self.derived_available(field) {
            return Ok(FieldInfo {
                name: field.to_string(),
                units: self.derived_units(field).to_string(),
                take_log: default_take_log(field),
            });
        }
        Err(unknown_field(field, self.field_names()))
    }

    fn values(&self, field: &str) -> Result<FieldValues, StrataDataError> {
        if self.dataset.stored(field).is_some() {
            return self.stored_values(field);
        }
        if self.derived_available(field) {
            return Ok(FieldValues {
                values: self.derived_values(field)?,
                units: self.derived_units(field).to_string(),
            });
        }
        Err(unknown_field(field, self.field_names()))
    }
}
