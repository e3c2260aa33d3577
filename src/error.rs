use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to assume role: {0}")]
    Credential(String),

    #[error("Step '{program}' failed: {detail}")]
    Step { program: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Credential(_) => "CREDENTIAL_ERROR",
            Error::Step { .. } => "STEP_FAILED",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    pub fn step(program: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Step {
            program: program.into(),
            detail: detail.into(),
        }
    }
}
