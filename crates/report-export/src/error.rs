use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV format error: {0}")]
    Format(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}
