use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the SocialPulse report engine.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A workbook file could not be opened or decoded.
    #[error("Failed to read workbook {path}: {message}")]
    WorkbookRead { path: PathBuf, message: String },

    /// A workbook supplied as an in-memory byte buffer could not be decoded.
    #[error("Failed to read workbook data: {0}")]
    WorkbookData(String),

    /// The workbook was readable but no sheet yielded a usable data row.
    #[error("No valid data found in the workbook")]
    NoValidData,

    /// The report path given on the command line does not exist.
    #[error("Report path not found: {0}")]
    ReportPathNotFound(PathBuf),

    /// No workbook files were found under the given directory.
    #[error("No workbook files found in {0}")]
    NoWorkbookFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
