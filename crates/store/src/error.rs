use thiserror::Error;

/// Errors from the result persistence layer. Any of these triggers the
/// local-cache fallback on the read path and the degraded-persistence flag
/// on the write path; they never fail a validation run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned status {code}")]
    Status { code: u16 },

    #[error("malformed store payload: {0}")]
    Decode(String),
}
