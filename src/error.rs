use thiserror::Error;

/// Message shown when the backend fails without a usable `detail`
pub const GENERIC_ERROR: &str = "An error occurred";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    /// Non-success status; `message` is the server's `detail` or [`GENERIC_ERROR`]
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("could not parse response: {0}")]
    Parse(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("both a proposal form and a financial statement must be selected")]
    MissingFiles,

    #[error("{file} is not a supported {kind} ({accepted})")]
    UnsupportedFile {
        file: String,
        kind: &'static str,
        accepted: String,
    },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}
