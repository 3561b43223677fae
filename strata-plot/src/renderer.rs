//! Turning resolved panels into figures and figures into files

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use itertools::izip;
use strata_render::marks::group::{Clip, SceneGroup};
use strata_render::marks::line::SceneLineMark;
use strata_render::marks::mark::SceneMark;
use strata_render::marks::rect::SceneRectMark;
use strata_render::marks::text::SceneTextMark;
use strata_render::types::{TextAlign, TextBaseline, BLACK, TRANSPARENT, WHITE};
use strata_render::{ImageFormat, RenderConfig, SceneGraph};
use strata_scales::{ColorScale, ContinuousScale, NumericScale};

use crate::error::StrataPlotError;
use crate::guides::axis::{make_numeric_axis_marks, AxisConfig, AxisOrientation};
use crate::guides::colorbar::{make_colorbar_marks, ColorbarConfig};
use crate::guides::legend::make_line_legend_marks;
use crate::panel::{CellGrid, LineSeries, Panel, PanelContent};
use crate::state::{AnnotationCoords, FigureConfig};

/// Produces figures for plot panels and encodes them.
///
/// Plots call `render` only when their state changed since the last
/// render, so implementations may be expensive.
pub trait Renderer: Debug + Send + Sync {
    fn render(&self, panel: &Panel) -> Result<SceneGraph, StrataPlotError>;

    fn encode(&self, figure: &SceneGraph, format: ImageFormat) -> Result<Vec<u8>, StrataPlotError>;

    /// Write `figure` to `path` in the format named by its extension
    fn write(&self, figure: &SceneGraph, path: &Path) -> Result<PathBuf, StrataPlotError> {
        let format = strata_render::format_for_path(path)?;
        strata_render::write_bytes(path, &self.encode(figure, format)?)?;
        Ok(path.to_path_buf())
    }
}

/// Lays panels out as scene graphs and encodes them with `strata-render`
#[derive(Debug, Clone, Default)]
pub struct SceneRenderer {
    pub config: RenderConfig,
}

impl Renderer for SceneRenderer {
    fn render(&self, panel: &Panel) -> Result<SceneGraph, StrataPlotError> {
        Ok(layout_panel(panel))
    }

    fn encode(&self, figure: &SceneGraph, format: ImageFormat) -> Result<Vec<u8>, StrataPlotError> {
        Ok(strata_render::encode(figure, format, &self.config)?)
    }
}

/// Pixel rectangle of the plot area inside a figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlotArea {
    pub fn new(figure: &FigureConfig, has_title: bool, has_colorbar: bool) -> Self {
        let fs = figure.font_size;
        let left = fs * 6.5;
        let right = if has_colorbar { fs * 8.0 + 30.0 } else { fs * 1.5 };
        let top = if has_title { fs * 2.8 } else { fs * 1.2 };
        let bottom = fs * 4.0;
        Self {
            x: left,
            y: top,
            width: (figure.width - left - right).max(10.0),
            height: (figure.height - top - bottom).max(10.0),
        }
    }
}

/// Build the figure for one panel: plot area, axes, colorbar, legend and title
#[tracing::instrument(skip_all, fields(field = %panel.field))]
pub fn layout_panel(panel: &Panel) -> SceneGraph {
    let figure = &panel.figure;
    let area = PlotArea::new(figure, panel.title.is_some(), panel.colorbar().is_some());
    let x_scale = NumericScale::new(panel.x.limits, (0.0, area.width as f64), panel.x.log);
    let y_scale = NumericScale::new(panel.y.limits, (area.height as f64, 0.0), panel.y.log);

    let mut plot_marks: Vec<SceneMark> = vec![];
    let mut guide_marks: Vec<SceneMark> = vec![];
    match &panel.content {
        PanelContent::Lines(series) => {
            plot_marks.extend(
                series
                    .iter()
                    .enumerate()
                    .map(|(i, s)| line_mark(i, s, &x_scale, &y_scale).into()),
            );
            let entries: Vec<_> = series
                .iter()
                .filter_map(|s| s.label.clone().map(|label| (label, s.style.clone())))
                .collect();
            if !entries.is_empty() {
                plot_marks.push(
                    make_line_legend_marks(
                        &entries,
                        [area.width - 8.0, 8.0],
                        figure.font_size * 0.85,
                    )
                    .into(),
                );
            }
        }
        PanelContent::Cells(grid) => {
            let color_scale =
                ColorScale::new(grid.colorbar.limits, grid.colorbar.log, grid.cmap);
            plot_marks.push(cell_mark(grid, &color_scale, &x_scale, &y_scale).into());
            guide_marks.push(
                make_colorbar_marks(
                    &color_scale,
                    &grid.colorbar.label,
                    [area.x + area.width, area.y],
                    &ColorbarConfig {
                        dimensions: [figure.width - area.x - area.width, area.height],
                        font_size: figure.font_size,
                        ..Default::default()
                    },
                )
                .into(),
            );
        }
    }
    if !panel.annotations.is_empty() {
        plot_marks.push(annotation_marks(panel, &area, &x_scale, &y_scale).into());
    }

    let mut scene = SceneGraph::new(figure.width, figure.height);
    scene.marks.push(
        SceneRectMark {
            name: "background".to_string(),
            width: figure.width.into(),
            height: figure.height.into(),
            fill: WHITE.into(),
            ..Default::default()
        }
        .into(),
    );
    scene.marks.push(
        SceneGroup {
            name: "plot-area".to_string(),
            origin: [area.x, area.y],
            clip: Clip::Rect {
                x: 0.0,
                y: 0.0,
                width: area.width,
                height: area.height,
            },
            marks: plot_marks,
            zindex: None,
        }
        .into(),
    );
    scene.marks.push(
        SceneRectMark {
            name: "frame".to_string(),
            x: area.x.into(),
            y: area.y.into(),
            width: area.width.into(),
            height: area.height.into(),
            fill: TRANSPARENT.into(),
            stroke: Some(BLACK),
            ..Default::default()
        }
        .into(),
    );
    let axis_config = AxisConfig {
        font_size: figure.font_size,
        ..Default::default()
    };
    scene.marks.push(
        make_numeric_axis_marks(
            &x_scale,
            &panel.x.label,
            [area.x, area.y + area.height],
            &axis_config,
        )
        .into(),
    );
    scene.marks.push(
        make_numeric_axis_marks(
            &y_scale,
            &panel.y.label,
            [area.x, area.y],
            &AxisConfig {
                orientation: AxisOrientation::Left,
                ..axis_config
            },
        )
        .into(),
    );
    scene.marks.extend(guide_marks);
    if let Some(title) = &panel.title {
        scene.marks.push(
            SceneTextMark {
                name: "title".to_string(),
                text: title.clone().into(),
                x: (area.x + area.width / 2.0).into(),
                y: (figure.font_size * 0.8).into(),
                align: TextAlign::Center.into(),
                baseline: TextBaseline::Top.into(),
                font_size: (figure.font_size * 1.2).into(),
                ..Default::default()
            }
            .into(),
        );
    }
    scene
}

fn line_mark(
    index: usize,
    series: &LineSeries,
    x_scale: &NumericScale,
    y_scale: &NumericScale,
) -> SceneLineMark {
    let x: Vec<f32> = series.x.iter().map(|v| x_scale.scale(*v) as f32).collect();
    let y: Vec<f32> = series.y.iter().map(|v| y_scale.scale(*v) as f32).collect();
    // log scales map non-positive values to NaN, which also breaks the line
    let defined = izip!(&series.defined, &x, &y)
        .map(|(d, x, y)| *d && x.is_finite() && y.is_finite())
        .collect();
    SceneLineMark {
        name: format!("line-{index}"),
        x,
        y,
        defined,
        stroke: series.style.color,
        stroke_width: series.style.width,
        stroke_dash: series.style.dash.clone(),
        zindex: None,
    }
}

fn cell_mark(
    grid: &CellGrid,
    color_scale: &ColorScale,
    x_scale: &NumericScale,
    y_scale: &NumericScale,
) -> SceneRectMark {
    let px = |scale: &NumericScale, edges: &[f64]| -> Vec<f32> {
        edges.iter().map(|e| scale.scale(*e) as f32).collect()
    };
    let x_px = px(x_scale, &grid.x_edges);
    let y_px = px(y_scale, &grid.y_edges);
    let ny = grid.y_edges.len().saturating_sub(1);

    let (mut xs, mut ys, mut widths, mut heights, mut fills) =
        (vec![], vec![], vec![], vec![], vec![]);
    for (i, x) in x_px.windows(2).enumerate() {
        for (j, y) in y_px.windows(2).enumerate() {
            let k = i * ny + j;
            if !grid.used.get(k).copied().unwrap_or(false) {
                continue;
            }
            let fill = color_scale.color(grid.values[k]);
            if fill[3] == 0.0 || !(x.iter().chain(y).all(|v| v.is_finite())) {
                continue;
            }
            xs.push(x[0].min(x[1]));
            ys.push(y[0].min(y[1]));
            widths.push((x[1] - x[0]).abs());
            heights.push((y[1] - y[0]).abs());
            fills.push(fill);
        }
    }
    SceneRectMark {
        name: "cells".to_string(),
        len: xs.len() as u32,
        x: xs.into(),
        y: ys.into(),
        width: widths.into(),
        height: heights.into(),
        fill: fills.into(),
        ..Default::default()
    }
}

fn annotation_marks(
    panel: &Panel,
    area: &PlotArea,
    x_scale: &NumericScale,
    y_scale: &NumericScale,
) -> SceneGroup {
    let marks: Vec<SceneMark> = panel
        .annotations
        .iter()
        .map(|annotation| {
            let (x, y) = annotation.position;
            let (x, y) = match annotation.style.coords {
                AnnotationCoords::Data => (x_scale.scale(x), y_scale.scale(y)),
                AnnotationCoords::Axes => {
                    (x * area.width as f64, (1.0 - y) * area.height as f64)
                }
            };
            SceneTextMark {
                name: "annotation".to_string(),
                text: annotation.text.clone().into(),
                x: (x as f32).into(),
                y: (y as f32).into(),
                color: annotation.style.color.into(),
                font_size: annotation
                    .style
                    .font_size
                    .unwrap_or(panel.figure.font_size)
                    .into(),
                ..Default::default()
            }
            .into()
        })
        .collect();
    SceneGroup {
        name: "annotations".to_string(),
        marks,
        zindex: Some(2),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PanelAxis;
    use crate::state::{Annotation, LineStyle, TextStyle};
    use strata_scales::Colormap;

    fn axis(label: &str, log: bool, limits: (f64, f64)) -> PanelAxis {
        PanelAxis {
            label: label.to_string(),
            log,
            limits,
        }
    }

    fn cells_panel() -> Panel {
        Panel {
            field: "cell_mass".to_string(),
            title: Some("A phase plot.".to_string()),
            x: axis("density", true, (1e-3, 1.0)),
            y: axis("temperature", false, (0.0, 1.0)),
            content: PanelContent::Cells(CellGrid {
                x_edges: vec![1e-3, 1e-2, 1e-1, 1.0],
                y_edges: vec![0.0, 0.5, 1.0],
                values: vec![1.0, 2.0, 0.0, 4.0, 5.0, 6.0],
                used: vec![true, true, false, true, true, true],
                colorbar: axis("cell_mass", true, (1.0, 6.0)),
                cmap: Colormap::Viridis,
            }),
            annotations: vec![Annotation {
                position: (0.01, 0.5),
                text: "Hello".to_string(),
                style: TextStyle::default(),
            }],
            figure: FigureConfig::default(),
        }
    }

    #[test]
    fn test_layout_cells() {
        let scene = layout_panel(&cells_panel());
        assert_eq!((scene.width, scene.height), (640.0, 480.0));
        for name in [
            "background",
            "plot-area",
            "frame",
            "x-axis",
            "y-axis",
            "colorbar",
            "title",
            "annotations",
        ] {
            assert!(scene.find(name).is_some(), "missing {name}");
        }
        let Some(SceneMark::Rect(cells)) = scene.find("cells") else {
            panic!("expected a cell mark");
        };
        // the unused bin is not drawn
        assert_eq!(cells.len, 5);
        assert!(scene.texts().contains(&"A phase plot.".to_string()));
    }

    #[test]
    fn test_layout_lines_with_legend() {
        let panel = Panel {
            field: "temperature".to_string(),
            title: None,
            x: axis("density", false, (0.0, 1.0)),
            y: axis("temperature", true, (0.1, 10.0)),
            content: PanelContent::Lines(vec![LineSeries {
                label: Some("all_data".to_string()),
                x: vec![0.25, 0.5, 0.75],
                y: vec![1.0, 0.0, 2.0],
                defined: vec![true, true, true],
                style: LineStyle::for_index(0),
            }]),
            annotations: vec![],
            figure: FigureConfig::default(),
        };
        let scene = layout_panel(&panel);
        assert!(scene.find("legend").is_some());
        assert!(scene.find("title").is_none());
        let Some(SceneMark::Line(line)) = scene.find("line-0") else {
            panic!("expected a line mark");
        };
        // zero has no position on the log axis
        assert_eq!(line.defined, vec![true, false, true]);
    }

    #[test]
    fn test_renderer_encodes_svg() {
        let renderer = SceneRenderer::default();
        let figure = renderer.render(&cells_panel()).unwrap();
        let bytes = renderer.encode(&figure, ImageFormat::Svg).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("Hello"));
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let figure = layout_panel(&cells_panel());
        let renderer = SceneRenderer::default();

        let path = dir.path().join("nested").join("figure.svg");
        assert_eq!(renderer.write(&figure, &path).unwrap(), path);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));

        let err = renderer
            .write(&figure, &dir.path().join("figure"))
            .unwrap_err();
        assert!(matches!(
            err,
            StrataPlotError::RenderError(strata_render::StrataRenderError::UnsupportedFormat(_))
        ));
    }
}
