use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Fatal failure reported by the spot detector; carries its diagnostic verbatim.
    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Result table error: {0}")]
    Table(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, CountError>;
