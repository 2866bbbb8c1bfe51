use thiserror::Error;

/// Errors produced while building or querying weather data.
#[derive(Debug, Error)]
pub enum MeteoError {
    /// Caller supplied a contradictory or incomplete parameter combination.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No record found for {0}")]
    NotFound(String),

    #[error("Field '{0}' is not present in record")]
    MissingField(String),

    #[error("Field '{field}' holds an unparsable timestamp: '{value}'")]
    InvalidTimestamp { field: String, value: String },

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    /// Payload does not have the shape a section requires.
    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Meteosource request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("None of the requested archive days could be downloaded")]
    EmptyArchive,
}

pub type Result<T> = std::result::Result<T, MeteoError>;
