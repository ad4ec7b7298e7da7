use thiserror::Error;

#[derive(Error, Debug)]
pub enum LcsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Genetic operator error: {0}")]
    Operator(String),

    #[error("Representation error: {0}")]
    Representation(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, LcsError>;
