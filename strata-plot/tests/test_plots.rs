use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use float_cmp::assert_approx_eq;
use rstest::rstest;
use strata_data::{FakeDatasetConfig, GridDataset, Selection};
use strata_plot::{
    ImageFormat, LineProperty, Panel, PanelContent, PhasePlot, PhasePlotConfig, ProfilePlot,
    ProfilePlotConfig, Renderer, SceneRenderer, StrataPlotError, TextStyle,
};
use strata_profile::{create_profile, ProfileRequest, StrataProfileError};
use strata_render::SceneGraph;
use strata_units::UnitRegistry;

fn dataset() -> Arc<GridDataset> {
    GridDataset::fake_random(&FakeDatasetConfig::default())
}

fn selection(ds: &Arc<GridDataset>, region: bool) -> Selection {
    if region {
        ds.region([0.5; 3], [0.25; 3], [0.75; 3])
    } else {
        ds.all_data()
    }
}

fn small_phase_config() -> PhasePlotConfig {
    PhasePlotConfig {
        x_bins: 16,
        y_bins: 16,
        ..Default::default()
    }
}

/// Wraps the default renderer and counts layouts
#[derive(Debug, Default)]
struct CountingRenderer {
    inner: SceneRenderer,
    renders: AtomicUsize,
}

impl Renderer for CountingRenderer {
    fn render(&self, panel: &Panel) -> Result<SceneGraph, StrataPlotError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.inner.render(panel)
    }

    fn encode(&self, figure: &SceneGraph, format: ImageFormat) -> Result<Vec<u8>, StrataPlotError> {
        self.inner.encode(figure, format)
    }
}

fn assert_written(paths: &[std::path::PathBuf], expected: &[&str]) {
    assert_eq!(paths.len(), expected.len());
    for (path, name) in paths.iter().zip(expected) {
        assert!(path.exists(), "{} was not written", path.display());
        assert_eq!(path.file_name().unwrap().to_string_lossy(), *name);
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }
}

#[rstest]
#[case("density", "temperature")]
#[case("density", "velocity_x")]
#[case("temperature", "cell_mass")]
#[case("density", "radius")]
#[case("velocity_magnitude", "cell_mass")]
fn test_profile_plot_saves_every_format(
    #[case] x_field: &str,
    #[case] y_field: &str,
    #[values(true, false)] region: bool,
    #[values(ImageFormat::Png, ImageFormat::Svg, ImageFormat::Pdf, ImageFormat::Eps, ImageFormat::Ps)]
    format: ImageFormat,
) {
    let ds = dataset();
    let source = selection(&ds, region);
    let mut plot =
        ProfilePlot::new(&source, x_field, &[y_field], &ProfilePlotConfig::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let name = dir.path().join(format!("test.{}", format.extension()));
    let paths = plot.save(Some(&name.to_string_lossy())).unwrap();
    assert_written(
        &paths,
        &[&format!("test_1d-Profile_{x_field}_{y_field}.{}", format.extension())],
    );
}

#[rstest]
#[case("density", "temperature", "cell_mass")]
#[case("density", "velocity_x", "cell_mass")]
#[case("radius", "temperature", "velocity_magnitude")]
fn test_phase_plot_saves_every_format(
    #[case] x_field: &str,
    #[case] y_field: &str,
    #[case] z_field: &str,
    #[values(true, false)] region: bool,
    #[values(ImageFormat::Png, ImageFormat::Svg, ImageFormat::Pdf, ImageFormat::Eps, ImageFormat::Ps)]
    format: ImageFormat,
) {
    let ds = dataset();
    let mut plot = PhasePlot::new(
        selection(&ds, region),
        x_field,
        y_field,
        &[z_field],
        &small_phase_config(),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let name = dir.path().join(format!("test.{}", format.extension()));
    let paths = plot.save(Some(&name.to_string_lossy())).unwrap();
    assert_written(
        &paths,
        &[&format!(
            "test_2d-Profile_{x_field}_{y_field}_{z_field}.{}",
            format.extension()
        )],
    );
}

#[rstest]
#[case(true, false)]
#[case(false, true)]
#[case(true, true)]
fn test_phase_plot_transforms(#[case] fractional: bool, #[case] accumulation: bool) {
    let ds = dataset();
    let config = PhasePlotConfig {
        fractional,
        accumulation,
        weight_field: None,
        ..small_phase_config()
    };
    let mut plot =
        PhasePlot::new(ds.all_data(), "density", "temperature", &["cell_mass"], &config).unwrap();
    let panel = plot.panel("cell_mass").unwrap();
    let PanelContent::Cells(grid) = &panel.content else {
        panic!("phase panels hold cells");
    };
    assert_eq!(grid.values.len(), 16 * 16);
    if fractional && !accumulation {
        let total: f64 = grid
            .values
            .iter()
            .zip(&grid.used)
            .filter(|(_, u)| **u)
            .map(|(v, _)| v)
            .sum();
        assert_approx_eq!(f64, total, 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_limits_are_reported_exactly() {
    let ds = dataset();
    let source = ds.all_data();

    let mut profile_plot =
        ProfilePlot::new(&source, "density", &["temperature"], &ProfilePlotConfig::default())
            .unwrap();
    profile_plot.set_xlim((0.3, 0.8)).unwrap();
    profile_plot.set_ylim("temperature", (0.4, 0.6)).unwrap();
    let panel = profile_plot.panel("temperature").unwrap();
    assert_eq!(panel.x.limits, (0.3, 0.8));
    assert_eq!(panel.y.limits, (0.4, 0.6));

    let mut phase_plot = PhasePlot::new(
        source,
        "density",
        "temperature",
        &["cell_mass"],
        &small_phase_config(),
    )
    .unwrap();
    phase_plot.set_xlim((0.3, 0.8)).unwrap();
    phase_plot.set_ylim((0.4, 0.6)).unwrap();
    let panel = phase_plot.panel("cell_mass").unwrap();
    assert_eq!(panel.x.limits, (0.3, 0.8));
    assert_eq!(panel.y.limits, (0.4, 0.6));

    // the profile is rebinned over the visible range
    let x_axis = phase_plot.profile().x_axis();
    assert_approx_eq!(f64, x_axis.edges[0], 0.3, epsilon = 1e-12);
    assert_approx_eq!(f64, *x_axis.edges.last().unwrap(), 0.8, epsilon = 1e-12);
}

#[test]
fn test_invalid_limits() {
    let ds = dataset();
    let mut plot =
        PhasePlot::new(ds.all_data(), "density", "temperature", &["cell_mass"], &small_phase_config())
            .unwrap();
    assert!(matches!(
        plot.set_xlim((0.8, 0.3)),
        Err(StrataPlotError::InvalidLimits(_, _))
    ));
}

#[test]
fn test_from_profiles_keeps_profiles() {
    let ds = dataset();
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["density"], ["temperature"]).with_n_bins(32);
    let all = Arc::new(create_profile(&ds.all_data(), &request, &registry).unwrap());
    let region = Arc::new(
        create_profile(&selection(&ds, true), &request, &registry).unwrap(),
    );

    let mut plot = ProfilePlot::from_profiles(
        vec![all.clone(), region.clone()],
        Some(vec!["all".to_string(), "region".to_string()]),
    )
    .unwrap();
    assert!(Arc::ptr_eq(&plot.profiles()[0], &all));
    assert!(Arc::ptr_eq(&plot.profiles()[1], &region));

    let panel = plot.panel("temperature").unwrap();
    let PanelContent::Lines(lines) = &panel.content else {
        panic!("profile panels hold lines");
    };
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].label.as_deref(), Some("region"));
    assert_ne!(lines[0].style.color, lines[1].style.color);
    let figure = &plot.plots()["temperature"].figure;
    assert!(figure.find("legend").is_some());
    assert!(figure.texts().iter().any(|t| t == "region"));
}

#[test]
fn test_from_profiles_validation() {
    let ds = dataset();
    let registry = UnitRegistry::default();
    let one_d = Arc::new(
        create_profile(
            &ds.all_data(),
            &ProfileRequest::new(["density"], ["temperature"]),
            &registry,
        )
        .unwrap(),
    );
    let two_d = Arc::new(
        create_profile(
            &ds.all_data(),
            &ProfileRequest::new(["density", "temperature"], ["cell_mass"]).with_n_bins(8),
            &registry,
        )
        .unwrap(),
    );

    assert!(matches!(
        ProfilePlot::from_profiles(vec![], None),
        Err(StrataPlotError::InvalidProfiles(_))
    ));
    assert!(matches!(
        ProfilePlot::from_profiles(vec![two_d.clone()], None),
        Err(StrataPlotError::InvalidProfiles(_))
    ));
    assert!(matches!(
        ProfilePlot::from_profiles(vec![one_d.clone()], Some(vec![])),
        Err(StrataPlotError::InvalidProfiles(_))
    ));
    assert!(matches!(
        PhasePlot::from_profile(one_d),
        Err(StrataPlotError::InvalidProfiles(_))
    ));

    let mut phase = PhasePlot::from_profile(two_d.clone()).unwrap();
    assert!(Arc::ptr_eq(phase.profile(), &two_d));
    assert_eq!(phase.x_field(), "density");
    assert_eq!(phase.y_field(), "temperature");
    phase.set_xlim((0.3, 0.8)).unwrap();
    phase.setup_plots().unwrap();
    // without a source only the view changes
    assert!(Arc::ptr_eq(phase.profile(), &two_d));
}

#[test]
fn test_rendering_is_lazy() {
    let ds = dataset();
    let renderer = Arc::new(CountingRenderer::default());
    let mut plot = ProfilePlot::new(
        &ds.all_data(),
        "density",
        &["temperature", "velocity_x"],
        &ProfilePlotConfig::default(),
    )
    .unwrap()
    .with_renderer(renderer.clone());

    assert!(plot.is_stale());
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);

    plot.set_log("density", false).unwrap();
    plot.set_title("temperature", "Temperature").unwrap();
    plot.set_font_size(14.0);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);

    plot.setup_plots().unwrap();
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 2);
    plot.panel("temperature").unwrap();
    plot.repr_html().unwrap();
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 2);

    plot.set_line_property(LineProperty::Width(3.0), None).unwrap();
    assert!(plot.is_stale());
    plot.setup_plots().unwrap();
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 4);
    assert_eq!(plot.line_styles()[0].width, 3.0);
}

#[test]
fn test_state_changes_are_reflected() {
    let ds = dataset();
    let mut plot = ProfilePlot::new(
        &ds.all_data(),
        "density",
        &["temperature"],
        &ProfilePlotConfig::default(),
    )
    .unwrap();

    plot.set_title("temperature", "Temperature profile").unwrap();
    plot.set_xlabel("Density");
    plot.set_log("temperature", false).unwrap();
    plot.annotate_text((0.5, 0.5), "center", TextStyle::default());
    let panel = plot.panel("temperature").unwrap();
    assert_eq!(panel.title.as_deref(), Some("Temperature profile"));
    assert_eq!(panel.x.label, "Density");
    assert_eq!(panel.y.label, "temperature (K)");
    assert!(!panel.y.log);
    assert!(panel.x.log);

    let figure = &plot.plots()["temperature"].figure;
    let texts = figure.texts();
    assert!(texts.iter().any(|t| t == "Temperature profile"));
    assert!(texts.iter().any(|t| t == "center"));
}

#[test]
fn test_unit_changes() {
    let ds = dataset();
    let mut plot = ProfilePlot::new(
        &ds.all_data(),
        "radius",
        &["cell_mass"],
        &ProfilePlotConfig::default(),
    )
    .unwrap();
    let extent_cm = plot.profiles()[0].x_axis().extent();

    plot.set_unit("radius", "km").unwrap();
    plot.set_unit("cell_mass", "kg").unwrap();
    let panel = plot.panel("cell_mass").unwrap();
    assert_eq!(panel.x.label, "radius (km)");
    assert_eq!(panel.y.label, "cell_mass (kg)");
    assert_approx_eq!(f64, panel.x.limits.1, extent_cm.1 / 1.0e5, epsilon = 1e-18);

    let err = plot.set_unit("cell_mass", "K").unwrap_err();
    assert!(matches!(
        err,
        StrataPlotError::ProfileError(StrataProfileError::IncompatibleUnit { .. })
    ));
    assert_eq!(plot.state().field("cell_mass").unwrap().unit.as_deref(), Some("kg"));
}

#[test]
fn test_unknown_fields() {
    let ds = dataset();
    let mut profile_plot = ProfilePlot::new(
        &ds.all_data(),
        "density",
        &["temperature"],
        &ProfilePlotConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        profile_plot.set_title("pressure", "P"),
        Err(StrataPlotError::UnknownField { .. })
    ));
    assert!(matches!(
        profile_plot.panel("pressure"),
        Err(StrataPlotError::UnknownField { .. })
    ));

    let mut phase_plot = PhasePlot::new(
        ds.all_data(),
        "density",
        "temperature",
        &["cell_mass"],
        &small_phase_config(),
    )
    .unwrap();
    assert!(matches!(
        phase_plot.set_zlim("pressure", (0.0, 1.0)),
        Err(StrataPlotError::UnknownField { .. })
    ));
    assert!(matches!(
        phase_plot.set_cmap("cell_mass", "rainbow_unicorn"),
        Err(StrataPlotError::UnknownColormap(_))
    ));
    assert!(matches!(
        PhasePlot::new(ds.all_data(), "density", "pressure", &["cell_mass"], &small_phase_config()),
        Err(StrataPlotError::ProfileError(_))
    ));
}

#[test]
fn test_phase_colorbar() {
    let ds = dataset();
    let mut plot = PhasePlot::new(
        ds.all_data(),
        "density",
        "temperature",
        &["cell_mass"],
        &small_phase_config(),
    )
    .unwrap();
    plot.set_zlim("cell_mass", (1e-6, 1e-3)).unwrap();
    plot.set_cmap("cell_mass", "magma").unwrap();
    plot.set_colorbar_label("cell_mass", "Mass").unwrap();
    let panel = plot.panel("cell_mass").unwrap().clone();
    let colorbar = panel.colorbar().unwrap();
    assert_eq!(colorbar.limits, (1e-6, 1e-3));
    assert_eq!(colorbar.label, "Mass");
    assert!(colorbar.log);

    let figure = &plot.plots()["cell_mass"].figure;
    assert!(figure.find("colorbar").is_some());
    assert!(figure.find("cells").is_some());
}

#[test]
fn test_repr_html() {
    let ds = dataset();
    let mut plot = PhasePlot::new(
        ds.all_data(),
        "density",
        "temperature",
        &["cell_mass", "velocity_x"],
        &small_phase_config(),
    )
    .unwrap();
    let html = plot.repr_html().unwrap();
    assert_eq!(html.matches("data:image/png;base64,").count(), 2);
}

#[test]
fn test_save_formats_report() {
    let ds = dataset();
    let mut plot = ProfilePlot::new(
        &ds.all_data(),
        "density",
        &["temperature", "velocity_x"],
        &ProfilePlotConfig::default(),
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("galaxy");
    let report = plot
        .save_formats(
            Some(&prefix.to_string_lossy()),
            &[ImageFormat::Png, ImageFormat::Pdf],
        )
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.written.len(), 4);
    assert!(dir
        .path()
        .join("galaxy_1d-Profile_density_velocity_x.pdf")
        .exists());
}

#[test]
fn test_default_names() {
    let ds = dataset();
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["density"], ["temperature"]);
    let profile = Arc::new(create_profile(&ds.all_data(), &request, &registry).unwrap());
    let other = strata_data::SampleTable::new("other")
        .with_field("density", "g/cm**3", vec![0.1, 0.2, 0.4])
        .with_field("temperature", "K", vec![10.0, 20.0, 40.0])
        .with_field("cell_mass", "g", vec![1.0, 1.0, 1.0]);
    let other = Arc::new(create_profile(&other, &request, &registry).unwrap());

    let dir = tempfile::tempdir().unwrap();
    let dir_name = format!("{}/", dir.path().display());

    let mut single = ProfilePlot::from_profile(profile.clone()).unwrap();
    let paths = single.save(Some(&dir_name)).unwrap();
    assert_written(&paths, &["FakeDataset_1d-Profile_density_temperature.png"]);

    let mut multi = ProfilePlot::from_profiles(vec![profile, other], None).unwrap();
    let paths = multi.save(Some(&dir_name)).unwrap();
    assert_written(&paths, &["Multi-data_1d-Profile_density_temperature.png"]);
    assert!(Path::new(&dir_name)
        .join("Multi-data_1d-Profile_density_temperature.png")
        .exists());
}

#[test]
fn test_png_matches_figure_size() {
    let ds = dataset();
    let mut plot = ProfilePlot::new(
        &ds.all_data(),
        "density",
        &["temperature"],
        &ProfilePlotConfig::default(),
    )
    .unwrap();
    plot.set_figure_size(400.0, 300.0);
    let dir = tempfile::tempdir().unwrap();
    let paths = plot.save(Some(&format!("{}/", dir.path().display()))).unwrap();
    let img = image::open(&paths[0]).unwrap();
    assert_eq!((img.width(), img.height()), (400, 300));
}

#[test]
fn test_config_from_partial_json() {
    let config: PhasePlotConfig =
        serde_json::from_str(r#"{"x_bins": 32, "cmap": "inferno", "weight_field": null}"#).unwrap();
    assert_eq!(config.x_bins, 32);
    assert_eq!(config.y_bins, PhasePlotConfig::default().y_bins);
    assert_eq!(config.weight_field, None);
    assert_eq!(config.cmap.to_string(), "inferno");

    let config: ProfilePlotConfig = serde_json::from_str(r#"{"n_bins": 10}"#).unwrap();
    assert_eq!(config.n_bins, 10);
    assert_eq!(config.weight_field.as_deref(), Some("cell_mass"));
}
