#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{service} service request failed: {source}")]
    Service {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("local store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn service(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Error::Service { service, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
