use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_data::FieldSource;
use strata_profile::{
    create_profile, Profile, ProfileRequest, StrataProfileError, DEFAULT_N_BINS,
    DEFAULT_WEIGHT_FIELD,
};
use strata_render::ImageFormat;
use strata_units::{UnitRegistry, UnitSystem};

use crate::error::StrataPlotError;
use crate::panel::{LineSeries, Panel, PanelAxis, PanelContent};
use crate::renderer::{Renderer, SceneRenderer};
use crate::save::{
    figures_to_html, into_written, resolve_save_name, write_figures, RenderedPlot, SaveReport,
};
use crate::state::{
    check_limits, data_range, field_label, Annotation, FigureConfig, LineProperty, LineStyle,
    PlotState, TextStyle,
};

/// Options for building a [`ProfilePlot`] straight from a field source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePlotConfig {
    pub weight_field: Option<String>,
    pub n_bins: usize,
    pub accumulation: bool,
    pub fractional: bool,
    /// Legend label of the single profile
    pub label: Option<String>,
    pub x_log: Option<bool>,
    pub y_log: Option<bool>,
    pub figure: FigureConfig,
}

impl Default for ProfilePlotConfig {
    fn default() -> Self {
        Self {
            weight_field: Some(DEFAULT_WEIGHT_FIELD.to_string()),
            n_bins: DEFAULT_N_BINS,
            accumulation: false,
            fractional: false,
            label: None,
            x_log: None,
            y_log: None,
            figure: FigureConfig::default(),
        }
    }
}

/// Line plots of 1D profiles, one figure per dependent field, each
/// overlaying every profile that carries the field.
#[derive(Debug)]
pub struct ProfilePlot {
    profiles: Vec<Arc<Profile>>,
    labels: Vec<Option<String>>,
    line_styles: Vec<LineStyle>,
    x_field: String,
    fields: Vec<String>,
    state: PlotState,
    units: Arc<dyn UnitSystem>,
    renderer: Arc<dyn Renderer>,
    plots: IndexMap<String, RenderedPlot>,
    stale: bool,
}

impl ProfilePlot {
    /// Profile `y_fields` of `source` binned over `x_field`
    pub fn new<S: FieldSource + ?Sized>(
        source: &S,
        x_field: &str,
        y_fields: &[&str],
        config: &ProfilePlotConfig,
    ) -> Result<Self, StrataPlotError> {
        let mut request = ProfileRequest::new([x_field], y_fields.iter().copied())
            .with_n_bins(config.n_bins)
            .with_accumulation(config.accumulation)
            .with_fractional(config.fractional);
        request = match &config.weight_field {
            Some(weight_field) => request.with_weight_field(weight_field.clone()),
            None => request.unweighted(),
        };
        if let Some(log) = config.x_log {
            request = request.with_log(x_field, log);
        }
        let units = UnitRegistry::default();
        let profile = create_profile(source, &request, &units)?;

        let labels = config.label.clone().map(|label| vec![label]);
        let mut plot = Self::from_profiles(vec![Arc::new(profile)], labels)?;
        plot.state.y_log = config.y_log;
        plot.state.figure = config.figure;
        Ok(plot)
    }

    /// Overlay pre-built 1D profiles; `labels` name them in the legend
    pub fn from_profiles(
        profiles: Vec<Arc<Profile>>,
        labels: Option<Vec<String>>,
    ) -> Result<Self, StrataPlotError> {
        let first = profiles
            .first()
            .ok_or_else(|| StrataPlotError::InvalidProfiles("no profiles given".to_string()))?;
        if let Some(profile) = profiles.iter().find(|p| p.dims() != 1) {
            return Err(StrataPlotError::InvalidProfiles(format!(
                "profile plots need 1D profiles, got {} axes",
                profile.dims()
            )));
        }
        let x_field = first.x_axis().field.clone();
        if let Some(profile) = profiles.iter().find(|p| p.x_axis().field != x_field) {
            return Err(StrataPlotError::InvalidProfiles(format!(
                "profiles are binned over both `{x_field}` and `{}`",
                profile.x_axis().field
            )));
        }
        let labels = match labels {
            Some(labels) if labels.len() != profiles.len() => {
                return Err(StrataPlotError::InvalidProfiles(format!(
                    "{} labels given for {} profiles",
                    labels.len(),
                    profiles.len()
                )))
            }
            Some(labels) => labels.into_iter().map(Some).collect(),
            None => vec![None; profiles.len()],
        };

        let mut fields: Vec<String> = vec![];
        for name in profiles.iter().flat_map(|p| p.field_names()) {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }

        Ok(Self {
            line_styles: (0..profiles.len()).map(LineStyle::for_index).collect(),
            profiles,
            labels,
            x_field,
            fields,
            state: PlotState::default(),
            units: Arc::new(UnitRegistry::default()),
            renderer: Arc::new(SceneRenderer::default()),
            plots: IndexMap::new(),
            stale: true,
        })
    }

    pub fn from_profile(profile: impl Into<Arc<Profile>>) -> Result<Self, StrataPlotError> {
        Self::from_profiles(vec![profile.into()], None)
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

    pub fn profiles(&self) -> &[Arc<Profile>] {
        &self.profiles
    }

    pub fn labels(&self) -> &[Option<String>] {
        &self.labels
    }

    pub fn x_field(&self) -> &str {
        &self.x_field
    }

    /// Dependent fields, one figure each
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn state(&self) -> &PlotState {
        &self.state
    }

    pub fn line_styles(&self) -> &[LineStyle] {
        &self.line_styles
    }

    /// True when the figures no longer reflect the plot state
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Figures from the last render
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

    /// Log or linear display of the x field or a dependent field
    pub fn set_log(&mut self, field: &str, log: bool) -> Result<&mut Self, StrataPlotError> {
        if field == self.x_field {
            self.state.x_log = Some(log);
        } else {
            self.check_field(field)?;
            self.state.field_mut(field).log = Some(log);
        }
        Ok(self.touch())
    }

    /// Display the x field or a dependent field in `unit`
    pub fn set_unit(&mut self, field: &str, unit: &str) -> Result<&mut Self, StrataPlotError> {
        let current = if field == self.x_field {
            self.profiles[0].x_axis().units.clone()
        } else {
            self.check_field(field)?;
            self.profiles
                .iter()
                .find_map(|p| p.field(field).ok().map(|f| f.units.clone()))
                .unwrap_or_default()
        };
        self.units
            .conversion_factor(&current, unit)
            .map_err(|source| StrataProfileError::IncompatibleUnit {
                field: field.to_string(),
                from: current.clone(),
                to: unit.to_string(),
                source,
            })?;
        if field == self.x_field {
            self.state.x_unit = Some(unit.to_string());
        } else {
            self.state.field_mut(field).unit = Some(unit.to_string());
        }
        Ok(self.touch())
    }

    pub fn set_xlim(&mut self, limits: (f64, f64)) -> Result<&mut Self, StrataPlotError> {
        self.state.xlim = Some(check_limits(limits)?);
        Ok(self.touch())
    }

    pub fn set_ylim(&mut self, field: &str, limits: (f64, f64)) -> Result<&mut Self, StrataPlotError> {
        self.check_field(field)?;
        self.state.field_mut(field).limits = Some(check_limits(limits)?);
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

    pub fn set_ylabel(&mut self, field: &str, label: &str) -> Result<&mut Self, StrataPlotError> {
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

    /// Change one property of the line at `index`, or of every line
    pub fn set_line_property(
        &mut self,
        property: LineProperty,
        index: Option<usize>,
    ) -> Result<&mut Self, StrataPlotError> {
        match index {
            Some(index) => {
                let len = self.line_styles.len();
                let style = self
                    .line_styles
                    .get_mut(index)
                    .ok_or(StrataPlotError::InvalidLineIndex { index, len })?;
                property.apply(style);
            }
            None => self.line_styles.iter_mut().for_each(|s| property.apply(s)),
        }
        Ok(self.touch())
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

    /// Render every figure if the state changed since the last render
    pub fn setup_plots(&mut self) -> Result<(), StrataPlotError> {
        if !self.stale && !self.plots.is_empty() {
            return Ok(());
        }
        let mut plots = IndexMap::new();
        for field in &self.fields {
            let panel = self.build_panel(field)?;
            let figure = self.renderer.render(&panel)?;
            plots.insert(field.clone(), RenderedPlot { panel, figure });
        }
        tracing::debug!("Rendered {} profile figures", plots.len());
        self.plots = plots;
        self.stale = false;
        Ok(())
    }

    /// Resolved panel of `field` after bringing the figures up to date
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
        let mut series = vec![];
        let mut x_units = None;
        let mut y_units = None;
        for (i, profile) in self.profiles.iter().enumerate() {
            if !profile.has_field(field) {
                continue;
            }
            let mut profile = Cow::Borrowed(profile.as_ref());
            if let Some(unit) = &self.state.x_unit {
                profile = Cow::Owned(profile.converted(&self.x_field, unit, self.units.as_ref())?);
            }
            if let Some(unit) = &field_state.unit {
                profile = Cow::Owned(profile.converted(field, unit, self.units.as_ref())?);
            }
            x_units.get_or_insert_with(|| profile.x_axis().units.clone());
            if let Ok(units) = profile.value_units(field) {
                y_units.get_or_insert_with(|| units.to_string());
            }
            series.push((
                profile.x_axis().extent(),
                profile.x_axis().log,
                LineSeries {
                    label: self.labels[i].clone(),
                    x: profile.x_axis().centers(),
                    y: profile.values(field)?.to_vec(),
                    defined: profile.used().to_vec(),
                    style: self.line_styles[i].clone(),
                },
            ));
        }

        let x_log = self
            .state
            .x_log
            .unwrap_or_else(|| series.first().map(|(_, log, _)| *log).unwrap_or(false));
        let x_limits = self.state.xlim.unwrap_or_else(|| {
            data_range(
                series.iter().flat_map(|((lo, hi), _, _)| [*lo, *hi]),
                x_log,
            )
        });
        let used_values = || {
            series.iter().flat_map(|(_, _, s)| {
                s.y.iter()
                    .zip(&s.defined)
                    .filter(|(_, d)| **d)
                    .map(|(v, _)| *v)
            })
        };
        let y_log = field_state.log.or(self.state.y_log).unwrap_or_else(|| {
            let mut values = used_values().peekable();
            values.peek().is_some() && values.all(|v| v > 0.0)
        });
        let y_limits = field_state
            .limits
            .unwrap_or_else(|| data_range(used_values(), y_log));

        Ok(Panel {
            field: field.to_string(),
            title: field_state.title.clone(),
            x: PanelAxis {
                label: self.state.x_label.clone().unwrap_or_else(|| {
                    field_label(&self.x_field, x_units.as_deref().unwrap_or(""))
                }),
                log: x_log,
                limits: x_limits,
            },
            y: PanelAxis {
                label: field_state
                    .label
                    .clone()
                    .unwrap_or_else(|| field_label(field, y_units.as_deref().unwrap_or(""))),
                log: y_log,
                limits: y_limits,
            },
            content: PanelContent::Lines(series.into_iter().map(|(_, _, s)| s).collect()),
            annotations: self.state.annotations.clone(),
            figure: self.state.figure,
        })
    }

    /// Default file prefix: the data source's name, or `Multi-data` when the
    /// profiles come from several sources
    fn default_prefix(&self) -> String {
        let first = self.profiles[0].source_name();
        if self.profiles.iter().all(|p| p.source_name() == first) {
            first.to_string()
        } else {
            "Multi-data".to_string()
        }
    }

    fn file_name(&self, prefix: &str, field: &str, format: ImageFormat) -> PathBuf {
        PathBuf::from(format!(
            "{prefix}_1d-Profile_{}_{field}.{}",
            self.x_field,
            format.extension()
        ))
    }

    /// Write one file per field and return the paths written.
    ///
    /// The format follows the extension of `name` (PNG without one) and the
    /// prefix defaults to the data source's name.
    pub fn save(&mut self, name: Option<&str>) -> Result<Vec<PathBuf>, StrataPlotError> {
        let (prefix, format) = resolve_save_name(name, &self.default_prefix());
        into_written(self.save_as(&prefix, &[format])?)
    }

    /// Write every field in every format, reporting each file's outcome
    pub fn save_formats(
        &mut self,
        prefix: Option<&str>,
        formats: &[ImageFormat],
    ) -> Result<SaveReport, StrataPlotError> {
        let (prefix, _) = resolve_save_name(prefix, &self.default_prefix());
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

    /// Inline PNG `<img>` tags for notebook-style display
    pub fn repr_html(&mut self) -> Result<String, StrataPlotError> {
        self.setup_plots()?;
        figures_to_html(self.renderer.as_ref(), &self.plots)
    }
}
