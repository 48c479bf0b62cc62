use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid bbox {0:?}: coordinates must be finite, non-negative and span a positive area")]
    InvalidBBox([f32; 4]),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Registry Error: lookup of {plate} failed: {reason}")]
    Registry { plate: String, reason: String },

    #[error("Persistence Error: {0}")]
    Persistence(String),

    #[error("Collaborator Error: {0}")]
    Collaborator(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn registry<P: Into<String>, R: ToString>(plate: P, reason: R) -> Self {
        Self::Registry {
            plate: plate.into(),
            reason: reason.to_string(),
        }
    }

    /// Transient collaborator failures may succeed when retried on a later frame.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Registry { .. } | Error::Persistence(_) | Error::Collaborator(_)
        )
    }
}
