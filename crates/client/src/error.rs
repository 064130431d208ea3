use rwportal_auth::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The request was rejected and the session could not be recovered.
    #[error("unauthorized")]
    Unauthorized,
    #[error("session refresh failed: {0}")]
    RefreshFailed(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
