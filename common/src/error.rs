use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlGenError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema inspection error: {0}")]
    Schema(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Upload(String),

    #[error("task join error: {0}")]
    Task(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

impl SqlGenError {
    /// true for problems with the submitted form rather than with processing it
    pub fn is_user_input(&self) -> bool {
        matches!(self, SqlGenError::Validation(_) | SqlGenError::Upload(_))
    }

    /// true when the generative-text service failed, answered badly, or could
    /// not be called because its settings are incomplete
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SqlGenError::Http(_) | SqlGenError::Model(_) | SqlGenError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SqlGenError>;
