use thiserror::Error;

/// Why a single icon source did not produce an image.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(u16),

    #[error("empty response body")]
    EmptyBody,

    #[error("response is not a valid image: {0}")]
    InvalidImage(String),

    #[error("no icon link found in page")]
    NoIconLink,

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("all icon sources failed")]
    Exhausted,
}

impl AcquireError {
    pub fn invalid_url(url: &str, reason: impl ToString) -> Self {
        AcquireError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type AcquireResult<T> = Result<T, AcquireError>;
