use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Pose error: {0}")]
    Pose(String),

    #[error("Segmentation error: {0}")]
    Segmentation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}
