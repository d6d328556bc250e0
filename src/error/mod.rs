use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("pipeline error: {context}")]
    Pipeline { context: &'static str },

    #[error("batch provider error: {0}")]
    Provider(#[source] BoxError),

    #[error("write error: {0}")]
    Write(#[source] BoxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn pipeline(context: &'static str) -> Self {
        Self::Pipeline { context }
    }

    pub fn provider(err: impl Into<BoxError>) -> Self {
        Self::Provider(err.into())
    }

    pub fn write(err: impl Into<BoxError>) -> Self {
        Self::Write(err.into())
    }
}
