use std::borrow::Cow;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_data::FieldSource;
use strata_profile::{create_profile, Profile, ProfileRequest, StrataProfileError, DEFAULT_WEIGHT_FIELD};
use strata_render::ImageFormat;
use strata_scales::Colormap;
use strata_units::{UnitRegistry, UnitSystem};

use crate::error::StrataPlotError;
use crate::panel::{CellGrid, Panel, PanelAxis, PanelContent};
use crate::renderer::{Renderer, SceneRenderer};
use crate::save::{
    figures_to_html, into_written, resolve_save_name, write_figures, RenderedPlot, SaveReport,
};
use crate::state::{
    check_limits, data_range, field_label, Annotation, FigureConfig, PlotState, TextStyle,
};

pub const DEFAULT_PHASE_BINS: usize = 128;

/// Options for building a [`PhasePlot`] straight from a field source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasePlotConfig {
    pub weight_field: Option<String>,
    pub x_bins: usize,
    pub y_bins: usize,
    pub accumulation: bool,
    pub fractional: bool,
    pub cmap: Colormap,
    pub figure: FigureConfig,
}

impl Default for PhasePlotConfig {
    fn default() -> Self {
        Self {
            weight_field: Some(DEFAULT_WEIGHT_FIELD.to_string()),
            x_bins: DEFAULT_PHASE_BINS,
            y_bins: DEFAULT_PHASE_BINS,
            accumulation: false,
            fractional: false,
            cmap: Colormap::default(),
            figure: FigureConfig {
                width: 640.0,
                height: 512.0,
                ..Default::default()
            },
        }
    }
}

/// Axis settings a source-backed profile was binned with
#[derive(Debug, Clone, Default, PartialEq)]
struct Binning {
    xlim: Option<(f64, f64)>,
    ylim: Option<(f64, f64)>,
    x_log: Option<bool>,
    y_log: Option<bool>,
    x_unit: Option<String>,
    y_unit: Option<String>,
}

impl Binning {
    fn of(state: &PlotState) -> Self {
        Self {
            xlim: state.xlim,
            ylim: state.ylim,
            x_log: state.x_log,
            y_log: state.y_log,
            x_unit: state.x_unit.clone(),
            y_unit: state.y_unit.clone(),
        }
    }
}

/// Colored 2D histograms, one figure per dependent field.
///
/// A plot built from a field source keeps the source and rebuilds its
/// profile when the x or y limits or log settings change, so the bins
/// always span the visible range. A plot built from a profile only
/// changes the view.
pub struct PhasePlot {
    source: Option<Arc<dyn FieldSource>>,
    request: Option<ProfileRequest>,
    binned: Binning,
    profile: Arc<Profile>,
    x_field: String,
    y_field: String,
    fields: Vec<String>,
    cmap: Colormap,
    state: PlotState,
    units: Arc<dyn UnitSystem>,
    renderer: Arc<dyn Renderer>,
    plots: IndexMap<String, RenderedPlot>,
    stale: bool,
}

impl std::fmt::Debug for PhasePlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhasePlot")
            .field("source", &self.source.as_ref().map(|s| s.name()))
            .field("x_field", &self.x_field)
            .field("y_field", &self.y_field)
            .field("fields", &self.fields)
            .field("state", &self.state)
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}

impl PhasePlot {
    pub fn new<S: FieldSource + 'static>(
        source: S,
        x_field: &str,
        y_field: &str,
        z_fields: &[&str],
        config: &PhasePlotConfig,
    ) -> Result<Self, StrataPlotError> {
        let mut request = ProfileRequest::new([x_field, y_field], z_fields.iter().copied())
            .with_n_bins((config.x_bins, config.y_bins))
            .with_accumulation(config.accumulation)
            .with_fractional(config.fractional);
        request = match &config.weight_field {
            Some(weight_field) => request.with_weight_field(weight_field.clone()),
            None => request.unweighted(),
        };
        let units: Arc<dyn UnitSystem> = Arc::new(UnitRegistry::default());
        let profile = create_profile(&source, &request, units.as_ref())?;

        let mut plot = Self::from_profile(profile)?;
        plot.source = Some(Arc::new(source));
        plot.request = Some(request);
        plot.units = units;
        plot.cmap = config.cmap;
        plot.state.figure = config.figure;
        Ok(plot)
    }

    pub fn from_profile(profile: impl Into<Arc<Profile>>) -> Result<Self, StrataPlotError> {
        let profile = profile.into();
        let Some(y_axis) = profile.y_axis() else {
            return Err(StrataPlotError::InvalidProfiles(
                "phase plots need a 2D profile".to_string(),
            ));
        };
        Ok(Self {
            source: None,
            request: None,
            binned: Binning::default(),
            x_field: profile.x_axis().field.clone(),
            y_field: y_axis.field.clone(),
            fields: profile.field_names().map(str::to_string).collect(),
            profile,
            cmap: Colormap::default(),
            state: PlotState {
                figure: PhasePlotConfig::default().figure,
                ..Default::default()
            },
            units: Arc::new(UnitRegistry::default()),
            renderer: Arc::new(SceneRenderer::default()),
            plots: IndexMap::new(),
            stale: true,
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self.stale = true;
        self
    }

    pub fn with_units(mut self, units: Arc<dyn UnitSystem>) -> Self {
        self.units = units;
        self.stale = true;
        self
    }

    /// The profile currently displayed
    pub fn profile(&self) -> &Arc<Profile> {
        &self.profile
    }

    pub fn x_field(&self) -> &str {
        &self.x_field
    }

    pub fn y_field(&self) -> &str {
        &self.y_field
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn state(&self) -> &PlotState {
        &self.state
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn plots(&self) -> &IndexMap<String, RenderedPlot> {
        &self.plots
    }

    fn check_field(&self, field: &str) -> Result<(), StrataPlotError> {
        if self.fields.iter().any(|f| f == field) {
            Ok(())
        } else {
            Err(StrataPlotError::UnknownField {
                field: field.to_string(),
                available: self.fields.clone(),
            })
        }
    }

    fn touch(&mut self) -> &mut Self {
        self.stale = true;
        self
    }

    /// Log or linear display of the x, y or a dependent field
    pub fn set_log(&mut self, field: &str, log: bool) -> Result<&mut Self, StrataPlotError> {
        if field == self.x_field {
            self.state.x_log = Some(log);
        } else if field == self.y_field {
            self.state.y_log = Some(log);
        } else {
            self.check_field(field)?;
            self.state.field_mut(field).log = Some(log);
        }
        Ok(self.touch())
    }

    pub fn set_unit(&mut self, field: &str, unit: &str) -> Result<&mut Self, StrataPlotError> {
        let current = if field == self.x_field {
            self.profile.x_axis().units.clone()
        } else if field == self.y_field {
            self.profile.y_axis().map(|a| a.units.clone()).unwrap_or_default()
        } else {
            self.check_field(field)?;
            self.profile.field(field)?.units.clone()
        };
        self.units
            .conversion_factor(&current, unit)
            .map_err(|source| StrataProfileError::IncompatibleUnit {
                field: field.to_string(),
                from: current.clone(),
                to: unit.to_string(),
                source,
            })?;
        let unit = Some(unit.to_string());
        if field == self.x_field {
            self.state.x_unit = unit;
        } else if field == self.y_field {
            self.state.y_unit = unit;
        } else {
            self.state.field_mut(field).unit = unit;
        }
        Ok(self.touch())
    }

    /// Limits of the x axis, in the x field's display units
    pub fn set_xlim(&mut self, limits: (f64, f64)) -> Result<&mut Self, StrataPlotError> {
        self.state.xlim = Some(check_limits(limits)?);
        Ok(self.touch())
    }

    pub fn set_ylim(&mut self, limits: (f64, f64)) -> Result<&mut Self, StrataPlotError> {
        self.state.ylim = Some(check_limits(limits)?);
        Ok(self.touch())
    }

    /// Colorbar limits of a dependent field
    pub fn set_zlim(&mut self, field: &str, limits: (f64, f64)) -> Result<&mut Self, StrataPlotError> {
        self.check_field(field)?;
        self.state.field_mut(field).limits = Some(check_limits(limits)?);
        Ok(self.touch())
    }

    pub fn set_cmap(&mut self, field: &str, cmap: &str) -> Result<&mut Self, StrataPlotError> {
        self.check_field(field)?;
        let cmap =
            Colormap::from_str(cmap).map_err(|_| StrataPlotError::UnknownColormap(cmap.to_string()))?;
        self.state.field_mut(field).cmap = Some(cmap);
        Ok(self.touch())
    }

    pub fn set_title(&mut self, field: &str, title: &str) -> Result<&mut Self, StrataPlotError> {
        self.check_field(field)?;
        self.state.field_mut(field).title = Some(title.to_string());
        Ok(self.touch())
    }

    pub fn set_xlabel(&mut self, label: &str) -> &mut Self {
        self.state.x_label = Some(label.to_string());
        self.touch()
    }

    pub fn set_ylabel(&mut self, label: &str) -> &mut Self {
        self.state.y_label = Some(label.to_string());
        self.touch()
    }

    pub fn set_colorbar_label(&mut self, field: &str, label: &str) -> Result<&mut Self, StrataPlotError> {
        self.check_field(field)?;
        self.state.field_mut(field).label = Some(label.to_string());
        Ok(self.touch())
    }

    pub fn set_figure_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.state.figure.width = width;
        self.state.figure.height = height;
        self.touch()
    }

    pub fn set_font_size(&mut self, font_size: f32) -> &mut Self {
        self.state.figure.font_size = font_size;
        self.touch()
    }

    /// Add text at `position` to every figure
    pub fn annotate_text(&mut self, position: (f64, f64), text: &str, style: TextStyle) -> &mut Self {
        self.state.annotations.push(Annotation {
            position,
            text: text.to_string(),
            style,
        });
        self.touch()
    }

    /// Rebuild the profile from the source when the binned range is out of date
    fn rebin(&mut self) -> Result<(), StrataPlotError> {
        let binning = Binning::of(&self.state);
        let (Some(source), Some(request)) = (&self.source, &self.request) else {
            return Ok(());
        };
        if binning == self.binned {
            return Ok(());
        }
        let mut request = request.clone();
        for (field, unit, limits, log) in [
            (&self.x_field, &binning.x_unit, binning.xlim, binning.x_log),
            (&self.y_field, &binning.y_unit, binning.ylim, binning.y_log),
        ] {
            if let Some(unit) = unit {
                request = request.with_units(field.clone(), unit.clone());
            }
            if let Some(limits) = limits {
                request = request.with_extrema(field.clone(), limits);
            }
            if let Some(log) = log {
                request = request.with_log(field.clone(), log);
            }
        }
        tracing::debug!(
            "Rebinning {} over {:?} x {:?}",
            source.name(),
            binning.xlim,
            binning.ylim
        );
        self.profile = Arc::new(create_profile(source.as_ref(), &request, self.units.as_ref())?);
        self.binned = binning;
        Ok(())
    }

    /// Render every figure if the state changed since the last render
    pub fn setup_plots(&mut self) -> Result<(), StrataPlotError> {
        if !self.stale && !self.plots.is_empty() {
            return Ok(());
        }
        self.rebin()?;
        let mut plots = IndexMap::new();
        for field in &self.fields {
            let panel = self.build_panel(field)?;
            let figure = self.renderer.render(&panel)?;
            plots.insert(field.clone(), RenderedPlot { panel, figure });
        }
        tracing::debug!("Rendered {} phase figures", plots.len());
        self.plots = plots;
        self.stale = false;
        Ok(())
    }

    pub fn panel(&mut self, field: &str) -> Result<&Panel, StrataPlotError> {
        self.check_field(field)?;
        self.setup_plots()?;
        self.plots
            .get(field)
            .map(|p| &p.panel)
            .ok_or_else(|| StrataPlotError::UnknownField {
                field: field.to_string(),
                available: self.fields.clone(),
            })
    }

    fn build_panel(&self, field: &str) -> Result<Panel, StrataPlotError> {
        let field_state = self.state.field(field).cloned().unwrap_or_default();
        let mut profile = Cow::Borrowed(self.profile.as_ref());
        for (axis_field, unit) in [
            (&self.x_field, &self.state.x_unit),
            (&self.y_field, &self.state.y_unit),
        ] {
            if let Some(unit) = unit {
                let axis = profile.axes().iter().find(|a| &a.field == axis_field);
                if axis.is_some_and(|a| &a.units != unit) {
                    profile = Cow::Owned(profile.converted(axis_field, unit, self.units.as_ref())?);
                }
            }
        }
        if let Some(unit) = &field_state.unit {
            profile = Cow::Owned(profile.converted(field, unit, self.units.as_ref())?);
        }

        let x_axis = profile.x_axis();
        let y_axis = profile
            .y_axis()
            .ok_or_else(|| StrataPlotError::InvalidProfiles("profile lost its y axis".to_string()))?;
        let values = profile.values(field)?;
        let used = profile.used();

        let z_values = || {
            values
                .iter()
                .zip(used)
                .filter(|(_, u)| **u)
                .map(|(v, _)| *v)
        };
        let z_log = field_state.log.unwrap_or_else(|| {
            let mut values = z_values().peekable();
            values.peek().is_some() && values.all(|v| v > 0.0)
        });
        let z_limits = field_state
            .limits
            .unwrap_or_else(|| data_range(z_values(), z_log));
        let z_units = profile.value_units(field)?;

        let axis = |axis: &strata_profile::ProfileAxis,
                    label: &Option<String>,
                    log: Option<bool>,
                    limits: Option<(f64, f64)>| PanelAxis {
            label: label
                .clone()
                .unwrap_or_else(|| field_label(&axis.field, &axis.units)),
            log: log.unwrap_or(axis.log),
            limits: limits.unwrap_or_else(|| axis.extent()),
        };

        Ok(Panel {
            field: field.to_string(),
            title: field_state.title.clone(),
            x: axis(x_axis, &self.state.x_label, self.state.x_log, self.state.xlim),
            y: axis(y_axis, &self.state.y_label, self.state.y_log, self.state.ylim),
            content: PanelContent::Cells(CellGrid {
                x_edges: x_axis.edges.clone(),
                y_edges: y_axis.edges.clone(),
                values: values.to_vec(),
                used: used.to_vec(),
                colorbar: PanelAxis {
                    label: field_state
                        .label
                        .clone()
                        .unwrap_or_else(|| field_label(field, z_units)),
                    log: z_log,
                    limits: z_limits,
                },
                cmap: field_state.cmap.unwrap_or(self.cmap),
            }),
            annotations: self.state.annotations.clone(),
            figure: self.state.figure,
        })
    }

    fn file_name(&self, prefix: &str, field: &str, format: ImageFormat) -> PathBuf {
        PathBuf::from(format!(
            "{prefix}_2d-Profile_{}_{}_{field}.{}",
            self.x_field,
            self.y_field,
            format.extension()
        ))
    }

    /// Write one file per field and return the paths written
    pub fn save(&mut self, name: Option<&str>) -> Result<Vec<PathBuf>, StrataPlotError> {
        let (prefix, format) = resolve_save_name(name, self.profile.source_name());
        into_written(self.save_as(&prefix, &[format])?)
    }

    pub fn save_formats(
        &mut self,
        prefix: Option<&str>,
        formats: &[ImageFormat],
    ) -> Result<SaveReport, StrataPlotError> {
        let (prefix, _) = resolve_save_name(prefix, self.profile.source_name());
        self.save_as(&prefix, formats)
    }

    fn save_as(&mut self, prefix: &str, formats: &[ImageFormat]) -> Result<SaveReport, StrataPlotError> {
        self.setup_plots()?;
        let this = &*self;
        let figures = formats.iter().flat_map(move |format| {
            this.plots
                .iter()
                .map(move |(field, plot)| (this.file_name(prefix, field, *format), &plot.figure))
        });
        Ok(write_figures(this.renderer.as_ref(), figures))
    }

    pub fn repr_html(&mut self) -> Result<String, StrataPlotError> {
        self.setup_plots()?;
        figures_to_html(self.renderer.as_ref(), &self.plots)
    }
}
