use strata_data::StrataDataError;
use strata_profile::StrataProfileError;
use strata_render::StrataRenderError;

#[derive(Debug, thiserror::Error)]
pub enum StrataPlotError {
    #[error("Field `{field}` is not plotted, available fields: {available:?}")]
    UnknownField {
        field: String,
        available: Vec<String>,
    },

    #[error("Unknown colormap `{0}`")]
    UnknownColormap(String),

    #[error("Invalid limits ({0}, {1}): lower bound must be below upper bound")]
    InvalidLimits(f64, f64),

    #[error("Invalid profiles: {0}")]
    InvalidProfiles(String),

    #[error("No line with index {index}, plot has {len}")]
    InvalidLineIndex { index: usize, len: usize },

    #[error("Nothing was written: {0}")]
    NothingWritten(String),

    #[error("Profile error: `{0}`")]
    ProfileError(#[from] StrataProfileError),

    #[error("Data error: `{0}`")]
    DataError(#[from] StrataDataError),

    #[error("Render error: `{0}`")]
    RenderError(#[from] StrataRenderError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
