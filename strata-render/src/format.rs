use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::StrataRenderError;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageFormat {
    Png,
    Svg,
    Pdf,
    Eps,
    Ps,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
            ImageFormat::Eps => "eps",
            ImageFormat::Ps => "ps",
        }
    }

    pub fn from_extension(extension: &str) -> Result<Self, StrataRenderError> {
        extension
            .trim_start_matches('.')
            .parse()
            .map_err(|_| StrataRenderError::UnsupportedFormat(extension.to_string()))
    }

    /// Format named by the extension of `path`, `None` when it has none
    pub fn from_path(path: &Path) -> Result<Option<Self>, StrataRenderError> {
        path.extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy()))
            .transpose()
    }

    pub fn is_raster(&self) -> bool {
        matches!(self, ImageFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case("png", ImageFormat::Png)]
    #[case(".svg", ImageFormat::Svg)]
    #[case("PDF", ImageFormat::Pdf)]
    #[case("eps", ImageFormat::Eps)]
    #[case("ps", ImageFormat::Ps)]
    fn test_from_extension(#[case] ext: &str, #[case] expected: ImageFormat) {
        assert_eq!(ImageFormat::from_extension(ext).unwrap(), expected);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            ImageFormat::from_path(&PathBuf::from("out/plot.eps")).unwrap(),
            Some(ImageFormat::Eps)
        );
        assert_eq!(ImageFormat::from_path(&PathBuf::from("plot")).unwrap(), None);
        assert!(matches!(
            ImageFormat::from_path(&PathBuf::from("plot.gif")),
            Err(StrataRenderError::UnsupportedFormat(_))
        ));
    }
}
