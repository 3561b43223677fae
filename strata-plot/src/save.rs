//! File naming, multi-format saving and inline HTML shared by both plot kinds

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use strata_render::{ImageFormat, SceneGraph};

use crate::error::StrataPlotError;
use crate::panel::Panel;
use crate::renderer::Renderer;

/// A rendered panel and the figure produced from it
#[derive(Debug, Clone)]
pub struct RenderedPlot {
    pub panel: Panel,
    pub figure: SceneGraph,
}

/// Outcome of writing several files; failures do not stop the other files
#[derive(Debug, Default)]
pub struct SaveReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, StrataPlotError)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Split a save name into a file prefix and an image format.
///
/// No name means the default prefix; a directory means the default prefix
/// inside it. A recognized extension picks the format, anything else is
/// kept as part of the prefix and PNG is used.
pub(crate) fn resolve_save_name(
    name: Option<&str>,
    default_prefix: &str,
) -> (String, ImageFormat) {
    let Some(name) = name else {
        return (default_prefix.to_string(), ImageFormat::Png);
    };
    let path = Path::new(name);
    if name.ends_with('/') || name.ends_with(std::path::MAIN_SEPARATOR) || path.is_dir() {
        return (
            path.join(default_prefix).to_string_lossy().into_owned(),
            ImageFormat::Png,
        );
    }
    match ImageFormat::from_path(path) {
        Ok(Some(format)) => (
            path.with_extension("").to_string_lossy().into_owned(),
            format,
        ),
        Ok(None) => (name.to_string(), ImageFormat::Png),
        Err(_) => {
            tracing::warn!("Unrecognized image extension in `{name}`, saving as png");
            (name.to_string(), ImageFormat::Png)
        }
    }
}

/// Write every `(path, figure)` pair, recording each outcome
pub(crate) fn write_figures<'a>(
    renderer: &dyn Renderer,
    figures: impl IntoIterator<Item = (PathBuf, &'a SceneGraph)>,
) -> SaveReport {
    let mut report = SaveReport::default();
    for (path, figure) in figures {
        match renderer.write(figure, &path) {
            Ok(path) => {
                tracing::info!("Saved {}", path.display());
                report.written.push(path);
            }
            Err(err) => {
                tracing::warn!("Failed to save {}: {err}", path.display());
                report.failed.push((path, err));
            }
        }
    }
    report
}

/// Paths written, or the first failure when nothing could be written
pub(crate) fn into_written(report: SaveReport) -> Result<Vec<PathBuf>, StrataPlotError> {
    if report.written.is_empty() {
        if let Some((_, err)) = report.failed.into_iter().next() {
            return Err(err);
        }
        return Err(StrataPlotError::NothingWritten("no figures".to_string()));
    }
    Ok(report.written)
}

/// `<img>` tags with every figure inlined as a base64 PNG
pub(crate) fn figures_to_html(
    renderer: &dyn Renderer,
    plots: &IndexMap<String, RenderedPlot>,
) -> Result<String, StrataPlotError> {
    let mut html = String::new();
    for plot in plots.values() {
        let png = renderer.encode(&plot.figure, ImageFormat::Png)?;
        html.push_str(&format!(
            r#"<img src="data:image/png;base64,{}"><br>"#,
            STANDARD.encode(png)
        ));
    }
    Ok(html)
}
