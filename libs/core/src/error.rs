use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown request type: {0}")]
    UnknownRequestTag(String),

    #[error("Request `{tag}` is missing its `{field}` payload")]
    MissingPayload {
        tag: &'static str,
        field: &'static str,
    },

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
