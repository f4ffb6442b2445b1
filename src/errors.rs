use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmartPlateError {
    /// The API answered 401. The only signal that the stored session is no
    /// longer valid and the user must authenticate again.
    #[error("unauthorized: session is no longer valid")]
    Unauthorized,

    /// Any other failed API call: non-2xx response (status is Some) or a
    /// transport-level failure before a status was received (status is None).
    #[error("request failed: {message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// Rejected client-side before any network I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl SmartPlateError {
    /// True when the failure means the caller must re-authenticate.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

pub type SmartPlateResult<T> = Result<T, SmartPlateError>;
