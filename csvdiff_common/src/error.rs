use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Report output error: {0}")]
    Output(String),
}

pub type Result<T> = std::result::Result<T, CsvDiffError>;
