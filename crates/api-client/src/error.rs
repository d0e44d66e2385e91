use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to send the HTTP request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    /// A non-2xx answer. `message` is the server's `error` field when it sent one.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid client configuration: {0}")]
    InvalidData(String),
}

impl ApiError {
    /// The HTTP status of a server-reported failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
