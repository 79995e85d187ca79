use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] liquex_core::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Tick interval must be greater than zero")]
    InvalidTickInterval,
    #[error("Location out of range: {lat}, {lng}")]
    InvalidLocation { lat: f64, lng: f64 },
}
