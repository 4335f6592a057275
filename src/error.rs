//! Error types for the navigator

use thiserror::Error;

/// Result type alias for navigator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering or serving pages
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Failed to render content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to produce a PDF
    #[error("PDF export failed: {0}")]
    PdfError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The renderer produced a different number of page rasters and box
    /// trees for a single render pass.
    #[error("Renderer produced {rasters} page rasters but {boxes} box trees")]
    PageMismatch { rasters: usize, boxes: usize },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_mismatch_names_both_counts() {
        let e = Error::PageMismatch { rasters: 3, boxes: 2 };
        assert_eq!(e.to_string(), "Renderer produced 3 page rasters but 2 box trees");
    }
}
