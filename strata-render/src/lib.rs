mod canvas;
pub mod error;
pub mod format;
pub mod marks;
pub mod pdf;
#[cfg(feature = "png")]
pub mod png;
pub mod ps;
pub mod scene_graph;
pub mod svg;
pub mod types;
pub mod value;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::StrataRenderError;
pub use format::ImageFormat;
pub use scene_graph::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Raster pixels per figure unit
    pub scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Encode a scene in the requested format
#[tracing::instrument(skip_all, fields(format = %format))]
pub fn encode(
    scene: &SceneGraph,
    format: ImageFormat,
    config: &RenderConfig,
) -> Result<Vec<u8>, StrataRenderError> {
    if !(scene.width > 0.0 && scene.height > 0.0) {
        return Err(StrataRenderError::InvalidSize {
            width: scene.width,
            height: scene.height,
        });
    }
    let bytes = match format {
        ImageFormat::Svg => svg::scene_to_svg(scene)?.into_bytes(),
        ImageFormat::Eps => ps::scene_to_ps(scene, true)?.into_bytes(),
        ImageFormat::Ps => ps::scene_to_ps(scene, false)?.into_bytes(),
        ImageFormat::Pdf => pdf::scene_to_pdf(scene)?,
        #[cfg(feature = "png")]
        ImageFormat::Png => png::svg_to_png(&svg::scene_to_svg(scene)?, config.scale)?,
        #[cfg(not(feature = "png"))]
        ImageFormat::Png => {
            let _ = config;
            return Err(StrataRenderError::UnsupportedFormat(
                "png (built without the png feature)".to_string(),
            ));
        }
    };
    tracing::debug!(bytes = bytes.len(), "encoded scene");
    Ok(bytes)
}

/// Format named by the extension of `path`, which must have one
pub fn format_for_path(path: &Path) -> Result<ImageFormat, StrataRenderError> {
    ImageFormat::from_path(path)?
        .ok_or_else(|| StrataRenderError::UnsupportedFormat(path.display().to_string()))
}

/// Write encoded bytes to `path`, creating missing parent directories
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), StrataRenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode a scene into `path`, picking the format from its extension
pub fn write(
    scene: &SceneGraph,
    path: &Path,
    config: &RenderConfig,
) -> Result<ImageFormat, StrataRenderError> {
    let format = format_for_path(path)?;
    write_bytes(path, &encode(scene, format, config)?)?;
    Ok(format)
}
