//! Display overrides layered over the defaults derived from profiles

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_render::types::Color;
use strata_scales::Colormap;

use crate::error::StrataPlotError;

/// Line colors assigned to overlaid profiles in order
pub const CATEGORY10: [Color; 10] = [
    [0.122, 0.467, 0.706, 1.0],
    [1.0, 0.498, 0.055, 1.0],
    [0.173, 0.627, 0.173, 1.0],
    [0.839, 0.153, 0.157, 1.0],
    [0.580, 0.404, 0.741, 1.0],
    [0.549, 0.337, 0.294, 1.0],
    [0.890, 0.467, 0.761, 1.0],
    [0.498, 0.498, 0.498, 1.0],
    [0.737, 0.741, 0.133, 1.0],
    [0.090, 0.745, 0.812, 1.0],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Figure width in points
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
    pub dash: Option<Vec<f32>>,
}

impl LineStyle {
    pub fn for_index(index: usize) -> Self {
        Self {
            color: CATEGORY10[index % CATEGORY10.len()],
            width: 1.5,
            dash: None,
        }
    }
}

/// One property of a profile line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineProperty {
    Color(Color),
    Width(f32),
    Dash(Option<Vec<f32>>),
}

impl LineProperty {
    pub(crate) fn apply(&self, style: &mut LineStyle) {
        match self {
            LineProperty::Color(color) => style.color = *color,
            LineProperty::Width(width) => style.width = *width,
            LineProperty::Dash(dash) => style.dash = dash.clone(),
        }
    }
}

/// Coordinate system of an annotation position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationCoords {
    /// Values on the plot axes
    #[default]
    Data,
    /// Fractions of the plot area, origin at the lower left
    Axes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub color: Color,
    pub font_size: Option<f32>,
    pub coords: AnnotationCoords,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            font_size: None,
            coords: AnnotationCoords::Data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub position: (f64, f64),
    pub text: String,
    pub style: TextStyle,
}

/// Overrides for one plotted field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldState {
    pub log: Option<bool>,
    pub unit: Option<String>,
    pub title: Option<String>,
    /// Value axis label of a profile plot, colorbar label of a phase plot
    pub label: Option<String>,
    pub limits: Option<(f64, f64)>,
    pub cmap: Option<Colormap>,
}

/// Overrides shared by every panel of a plot plus the per-field entries.
///
/// Every setter replaces a value, so applying the same calls in any order
/// yields the same state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotState {
    pub fields: IndexMap<String, FieldState>,
    pub x_log: Option<bool>,
    pub y_log: Option<bool>,
    pub x_unit: Option<String>,
    pub y_unit: Option<String>,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub annotations: Vec<Annotation>,
    pub figure: FigureConfig,
}

impl PlotState {
    pub fn field(&self, field: &str) -> Option<&FieldState> {
        self.fields.get(field)
    }

    pub(crate) fn field_mut(&mut self, field: &str) -> &mut FieldState {
        self.fields.entry(field.to_string()).or_default()
    }
}

pub(crate) fn check_limits(limits: (f64, f64)) -> Result<(f64, f64), StrataPlotError> {
    if limits.0 < limits.1 && limits.0.is_finite() && limits.1.is_finite() {
        Ok(limits)
    } else {
        Err(StrataPlotError::InvalidLimits(limits.0, limits.1))
    }
}

/// `"density (g/cm**3)"`, or the bare name without units
pub(crate) fn field_label(field: &str, units: &str) -> String {
    if units.is_empty() {
        field.to_string()
    } else {
        format!("{field} ({units})")
    }
}

/// Range covering `values`, skipping non-positive values on log axes.
/// Degenerate ranges are widened so every axis has a non-empty domain.
pub(crate) fn data_range(values: impl Iterator<Item = f64>, log: bool) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite() && (!log || *v > 0.0))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return if log { (1.0, 10.0) } else { (0.0, 1.0) };
    }
    if lo < hi {
        return (lo, hi);
    }
    if log {
        (lo / 10.0, lo * 10.0)
    } else if lo == 0.0 {
        (-0.5, 0.5)
    } else {
        (lo - 0.5 * lo.abs(), lo + 0.5 * lo.abs())
    }
}
