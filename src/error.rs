//! Error types for the invoice generator

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside the calculation model.
///
/// Computing totals and rendering the preview never fail; only the document
/// backend, file access and configuration can.
#[derive(Error, Debug)]
pub enum Error {
    /// The PDF backend rejected the document
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An invoice file could not be parsed
    #[error("Invalid invoice file {path}: {source}")]
    ParseInvoice {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not serialize settings for {path}: {source}")]
    SettingsWrite {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
