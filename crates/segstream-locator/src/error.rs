use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("invalid stream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("stream URL has {found} path segments, expected at least {expected}")]
    TooFewSegments { found: usize, expected: usize },

    #[error("stream URL is missing query parameter `{0}`")]
    MissingQuery(&'static str),
}
