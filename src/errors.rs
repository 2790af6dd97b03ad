//! Centralised error type for the inspector.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    /// Missing file, malformed database, bad query or attempted write.
    #[error("failed to access database {}: {source}", .path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl InspectError {
    pub(crate) fn access(path: impl Into<PathBuf>, source: sqlx::Error) -> Self {
        InspectError::Access {
            path: path.into(),
            source,
        }
    }

    /// True for the single database access failure kind.
    pub fn is_access_failure(&self) -> bool {
        matches!(self, InspectError::Access { .. })
    }
}
