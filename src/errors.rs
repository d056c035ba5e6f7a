use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    // Config-related errors
    #[error("Failed to get config directory")]
    ConfigDirNotFound,

    #[error("Failed to access config or snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] toml::ser::Error),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(#[from] toml::de::Error),

    #[error("Config file not found at path: {path}")]
    ConfigFileNotFound { path: PathBuf },

    #[error("Invalid pathfinding config: {reason}")]
    InvalidConfig { reason: String },

    // Terrain and grid errors
    #[error("Invalid terrain data: {reason}")]
    InvalidTerrainData { reason: String },

    #[error("Invalid grid dimensions: {reason}")]
    InvalidGridDimensions { reason: String },

    #[error("Corrupted grid snapshot: {reason}")]
    CorruptedSnapshot { reason: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

/// Result type alias for all fallible setup operations
pub type NavResult<T> = Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_error_display() {
        let err = NavError::InvalidGridDimensions {
            reason: "cell size must be positive".to_string(),
        };
        assert!(err.to_string().contains("Invalid grid dimensions"));

        let err = NavError::ConfigDirNotFound;
        assert_eq!(err.to_string(), "Failed to get config directory");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: NavError = io.into();
        assert!(matches!(err, NavError::Io(_)));
    }
}
