use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid backup target: {0}")]
    InvalidTarget(String),

    #[error("Unsupported connection scheme: {0}")]
    UnsupportedScheme(String),

    #[error("No dump tool known for dialect: {0}")]
    UnknownDialect(String),

    #[error("{0} executable not found in PATH. Please ensure the database client tools are installed.")]
    ToolNotFound(String),

    #[error("{tool} failed with {status}: {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, BackupError>;
