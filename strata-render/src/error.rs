#[derive(Debug, thiserror::Error)]
pub enum StrataRenderError {
    #[error("Unsupported image format: `{0}`")]
    UnsupportedFormat(String),

    #[error("Invalid image size: {width}x{height}")]
    InvalidSize { width: f32, height: f32 },

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("formatting error")]
    FmtError(#[from] std::fmt::Error),

    #[cfg(feature = "png")]
    #[error("usvg error: {0}")]
    UsvgError(#[from] usvg::Error),

    #[cfg(feature = "png")]
    #[error("roxml Error: {0}")]
    RoxmlError(#[from] usvg::roxmltree::Error),
}
