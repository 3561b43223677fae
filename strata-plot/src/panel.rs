use serde::{Deserialize, Serialize};
use strata_scales::Colormap;

use crate::state::{Annotation, FigureConfig, LineStyle};

/// A resolved axis: everything needed to build its scale and guide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelAxis {
    pub label: String,
    pub log: bool,
    pub limits: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub label: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub defined: Vec<bool>,
    pub style: LineStyle,
}

/// Binned values drawn as colored cells, row-major with x outer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellGrid {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub values: Vec<f64>,
    pub used: Vec<bool>,
    pub colorbar: PanelAxis,
    pub cmap: Colormap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelContent {
    Lines(Vec<LineSeries>),
    Cells(CellGrid),
}

/// One figure of a plot, fully resolved from profiles and display state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub field: String,
    pub title: Option<String>,
    pub x: PanelAxis,
    pub y: PanelAxis,
    pub content: PanelContent,
    pub annotations: Vec<Annotation>,
    pub figure: FigureConfig,
}

impl Panel {
    pub fn colorbar(&self) -> Option<&PanelAxis> {
        match &self.content {
            PanelContent::Cells(grid) => Some(&grid.colorbar),
            PanelContent::Lines(_) => None,
        }
    }
}
