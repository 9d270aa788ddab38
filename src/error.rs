//! Error types and handling for the `AQICast` pipeline

use thiserror::Error;

/// Main error type for the `AQICast` application
///
/// The first four variants are the pipeline taxonomy: each one aborts the
/// current render before any later stage runs.
#[derive(Error, Debug)]
pub enum AqiCastError {
    /// The user's coordinates could not be resolved
    #[error("Location unavailable: {message}")]
    LocationUnavailable { message: String },

    /// The forecast feature table could not be built
    #[error("Feature build error: {message}")]
    FeatureBuild { message: String },

    /// The model artifact could not be loaded
    #[error("Model load error: {message}")]
    ModelLoad { message: String },

    /// The feature table does not match the model's input schema
    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Historical data could not be read
    #[error("History error: {message}")]
    History { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AqiCastError {
    /// Create a new location error
    pub fn location<S: Into<String>>(message: S) -> Self {
        Self::LocationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new feature build error
    pub fn feature_build<S: Into<String>>(message: S) -> Self {
        Self::FeatureBuild {
            message: message.into(),
        }
    }

    /// Create a new model load error
    pub fn model_load<S: Into<String>>(message: S) -> Self {
        Self::ModelLoad {
            message: message.into(),
        }
    }

    /// Create a new schema mismatch error
    pub fn schema_mismatch<S: Into<String>>(message: S) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new history error
    pub fn history<S: Into<String>>(message: S) -> Self {
        Self::History {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Stable machine-readable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            AqiCastError::LocationUnavailable { .. } => "location_unavailable",
            AqiCastError::FeatureBuild { .. } => "feature_build_error",
            AqiCastError::ModelLoad { .. } => "model_load_error",
            AqiCastError::SchemaMismatch { .. } => "schema_mismatch",
            AqiCastError::Config { .. } => "config_error",
            AqiCastError::History { .. } => "history_error",
            AqiCastError::Cache { .. } => "cache_error",
            AqiCastError::Io { .. } => "io_error",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AqiCastError::LocationUnavailable { message } => {
                format!("Error fetching coordinates: {message}")
            }
            AqiCastError::FeatureBuild { message } => {
                format!("Unable to build the forecast: {message}")
            }
            AqiCastError::ModelLoad { message } => {
                format!("The forecast model could not be loaded: {message}")
            }
            AqiCastError::SchemaMismatch { .. } => {
                "The forecast model does not accept the prepared features. Please retrain or update the model."
                    .to_string()
            }
            AqiCastError::Config { message } => {
                format!("Configuration error: {message}")
            }
            AqiCastError::History { message } => {
                format!("Error loading data: {message}")
            }
            AqiCastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            AqiCastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
