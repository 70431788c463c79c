use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection is not open")]
    NotConnected,
    #[error("connection task has shut down")]
    Closed,
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
}
