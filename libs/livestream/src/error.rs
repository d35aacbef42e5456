use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The stream URL has no `/stream` suffix to derive the health endpoint from.
    #[error("cannot derive status endpoint from stream url: {0}")]
    StatusEndpoint(String),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The monitor event loop is gone.
    #[error("monitor closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
